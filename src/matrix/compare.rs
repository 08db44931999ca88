//! Cross-checking results of different strategies.

use super::Matrix;

/// Returns `true` if every pair of `matrices` is element-wise equal.
///
/// Matrices of different sizes are never equal. Fewer than two matrices
/// compare trivially equal.
///
/// ```
/// use matmul_pool::{Matrix, compare_all};
///
/// let a = Matrix::identity(3);
/// let b = Matrix::identity(3);
/// let z = Matrix::zeros(3);
/// assert!(compare_all(&[&a, &b]));
/// assert!(!compare_all(&[&a, &b, &z]));
/// ```
pub fn compare_all(matrices: &[&Matrix]) -> bool {
    for (i, lhs) in matrices.iter().enumerate() {
        for rhs in &matrices[i + 1..] {
            if !equal(lhs, rhs) {
                return false;
            }
        }
    }
    true
}

fn equal(lhs: &Matrix, rhs: &Matrix) -> bool {
    lhs.size() == rhs.size() && lhs.as_slice() == rhs.as_slice()
}
