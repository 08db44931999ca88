use super::Matrix;

/// Transpose a matrix: dst = src^T
///
/// After transpose, what was column j of src becomes row j of dst, so an
/// inner loop that walked B down a column (stride N) can walk B^T along a
/// row (stride 1) instead.
///
/// # Example
///
/// ```
/// use matmul_pool::Matrix;
/// use matmul_pool::matrix::transpose::transpose;
///
/// let src = Matrix::from_rows(vec![vec![1, 2, 3],
///                                  vec![4, 5, 6],
///                                  vec![7, 8, 9]]).unwrap();
///
/// let dst = transpose(&src);
///
/// assert_eq!(dst.to_rows(), vec![vec![1, 4, 7],
///                                vec![2, 5, 8],
///                                vec![3, 6, 9]]);
/// ```
pub fn transpose(src: &Matrix) -> Matrix {
    let size = src.size();
    let mut dst = Matrix::zeros(size);
    for (i, row) in src.rows().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            dst.data[j * size + i] = value;
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::factory::create_seeded;

    #[test]
    fn test_transpose_twice_is_identity() {
        let m = create_seeded(33, 3).unwrap();
        assert_eq!(transpose(&transpose(&m)), m);
    }

    #[test]
    fn test_transpose_moves_columns_to_rows() {
        let m = create_seeded(9, 11).unwrap();
        let t = transpose(&m);
        for j in 0..m.size() {
            assert_eq!(t.row(j), m.column(j).as_slice());
        }
    }
}
