//! Random matrix generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Element, Matrix};
use crate::error::{Error, Result};

/// Entries are drawn uniformly from `0..ELEMENT_BOUND`.
pub const ELEMENT_BOUND: Element = 10;

/// Creates a `size`×`size` matrix of random entries in `0..=9`.
///
/// Small bounded entries keep products exact and comparable across
/// strategies without any risk of overflow for realistic sizes.
pub fn create<R: Rng>(size: usize, rng: &mut R) -> Result<Matrix> {
    if size == 0 {
        return Err(Error::Empty);
    }
    let data = (0..size * size)
        .map(|_| rng.gen_range(0..ELEMENT_BOUND))
        .collect();
    Ok(Matrix { size, data })
}

/// Same as [`create`] but reproducible: equal seeds give equal matrices.
pub fn create_seeded(size: usize, seed: u64) -> Result<Matrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    create(size, &mut rng)
}
