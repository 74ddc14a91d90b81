//! Seeded train/test splitting

use crate::error::{GradeMlError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Shuffle `0..n_samples` with a seeded RNG and split into
/// (train_indices, test_indices). The test partition takes
/// `ceil(n_samples * test_ratio)` rows; together the partitions cover every
/// index exactly once.
pub fn train_test_split(
    n_samples: usize,
    test_ratio: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_ratio) || test_ratio == 0.0 {
        return Err(GradeMlError::Data(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }
    if n_samples < 2 {
        return Err(GradeMlError::Data(format!(
            "need at least 2 samples to split, got {}",
            n_samples
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * test_ratio).ceil() as usize;
    let n_test = n_test.clamp(1, n_samples - 1);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    Ok((train_indices, test_indices))
}
