//! QBER estimation on a disclosed sample of the sifted key.

use crate::core::RandomSource;
use crate::core::errors::SamplingError;
use crate::protocols::qkd::sifting::SiftedKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of the public error check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCheckResult {
    /// Sifted-key positions that were disclosed.
    pub sample_indices: BTreeSet<usize>,
    pub error_count: usize,
    pub sample_size: usize,
    /// `error_count / sample_size`, or 0.0 for an empty sample.
    pub error_rate: f64,
    /// The key was non-empty but nothing was sampled.
    pub empty_sample: bool,
    pub secure: bool,
}

/// Number of positions to disclose out of `sifted_len`.
///
/// Rounds half away from zero, and never returns 0 for a non-empty key unless
/// the fraction itself is 0.
pub fn sample_size(sifted_len: usize, sample_fraction: f64) -> usize {
    if sifted_len == 0 || sample_fraction <= 0.0 {
        return 0;
    }
    let size = (sample_fraction * sifted_len as f64).round() as usize;
    size.clamp(1, sifted_len)
}

/// Samples, compares and removes the disclosed bits.
///
/// Returns the check result and the sifted key with the sample removed. The
/// error rate equal to `threshold` counts as secure. A non-empty key that was
/// not sampled at all is never secure.
pub fn check(
    sifted: &SiftedKey,
    sample_fraction: f64,
    threshold: f64,
    rng: &mut RandomSource,
) -> Result<(ErrorCheckResult, SiftedKey), SamplingError> {
    let n = sifted.len();
    let size = sample_size(n, sample_fraction);
    let sample_indices = rng.sample_without_replacement(n, size)?;

    let (alice, bob) = (sifted.alice(), sifted.bob());
    let error_count = sample_indices
        .iter()
        .filter(|&&i| alice[i] != bob[i])
        .count();

    let error_rate = if size > 0 {
        error_count as f64 / size as f64
    } else {
        0.0
    };

    let empty_sample = size == 0 && n > 0;
    let secure = error_rate <= threshold && !empty_sample;
    let remaining = sifted.without(&sample_indices);

    Ok((
        ErrorCheckResult {
            sample_indices,
            error_count,
            sample_size: size,
            error_rate,
            empty_sample,
            secure,
        },
        remaining,
    ))
}
