//! Run and sweep configuration.
//!
//! Configuration is always handed to the protocol explicitly; nothing here is
//! process-wide, so concurrent sweeps with different settings never interfere.

use crate::core::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Default fraction of the sifted key disclosed for error estimation.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.3;

/// Default maximum tolerated QBER.
pub const DEFAULT_THRESHOLD: f64 = 0.11;

/// Default eavesdropping sweep used by the batch analyzer.
pub const DEFAULT_EAVESDROP_SWEEP: [f64; 6] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5];

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        // NaN fails the range check as well
        return Err(ConfigError::InvalidProbability { name, value });
    }
    Ok(())
}

/// Parameters of a single BB84 execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Number of photons Alice transmits.
    pub key_length: usize,
    /// Probability that Eve intercepts any given photon.
    pub eavesdrop_prob: f64,
    /// Fraction of the sifted key sacrificed for the error check.
    pub sample_fraction: f64,
    /// Maximum QBER accepted as secure (inclusive).
    pub threshold: f64,
    /// Compress the surviving key with SHA-256.
    pub amplify: bool,
    /// Seed for a reproducible run; fresh entropy when absent.
    pub seed: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            key_length: 100,
            eavesdrop_prob: 0.0,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            threshold: DEFAULT_THRESHOLD,
            amplify: true,
            seed: None,
        }
    }
}

impl ProtocolConfig {
    pub fn new(key_length: usize) -> Self {
        Self {
            key_length,
            ..Self::default()
        }
    }

    pub fn with_eavesdrop_prob(mut self, eavesdrop_prob: f64) -> Self {
        self.eavesdrop_prob = eavesdrop_prob;
        self
    }

    pub fn with_sample_fraction(mut self, sample_fraction: f64) -> Self {
        self.sample_fraction = sample_fraction;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_amplification(mut self, amplify: bool) -> Self {
        self.amplify = amplify;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects malformed parameters before any randomness is drawn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_length == 0 {
            return Err(ConfigError::InvalidKeyLength);
        }
        check_probability("eavesdrop_prob", self.eavesdrop_prob)?;
        check_probability("sample_fraction", self.sample_fraction)?;
        check_probability("threshold", self.threshold)?;
        Ok(())
    }
}

/// Parameters of a sweep over eavesdropping probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub key_length: usize,
    /// Probabilities to test, in report order. Duplicates are allowed.
    pub eavesdrop_probs: Vec<f64>,
    /// Independent runs per probability.
    pub num_simulations: usize,
    pub sample_fraction: f64,
    pub threshold: f64,
    /// Hash each surviving key. Off by default since batch statistics only
    /// read key lengths and error rates.
    pub amplify: bool,
    /// Master seed; every run derives its own stream from it.
    pub seed: Option<u64>,
    /// Worker threads executing runs.
    pub workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            key_length: 100,
            eavesdrop_probs: DEFAULT_EAVESDROP_SWEEP.to_vec(),
            num_simulations: 100,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            threshold: DEFAULT_THRESHOLD,
            amplify: false,
            seed: None,
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

impl BatchConfig {
    pub fn new(key_length: usize, eavesdrop_probs: Vec<f64>, num_simulations: usize) -> Self {
        Self {
            key_length,
            eavesdrop_probs,
            num_simulations,
            ..Self::default()
        }
    }

    pub fn with_sample_fraction(mut self, sample_fraction: f64) -> Self {
        self.sample_fraction = sample_fraction;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_amplification(mut self, amplify: bool) -> Self {
        self.amplify = amplify;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Builds the per-run configuration for one sweep entry.
    ///
    /// The returned config carries no seed: the analyzer hands each run its
    /// own derived `RandomSource`.
    pub fn protocol_for(&self, eavesdrop_prob: f64) -> ProtocolConfig {
        ProtocolConfig {
            key_length: self.key_length,
            eavesdrop_prob,
            sample_fraction: self.sample_fraction,
            threshold: self.threshold,
            amplify: self.amplify,
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.eavesdrop_probs.is_empty() {
            return Err(ConfigError::EmptySweep);
        }
        if self.num_simulations == 0 {
            return Err(ConfigError::InvalidSimulationCount);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        for &p in &self.eavesdrop_probs {
            self.protocol_for(p).validate()?;
        }
        Ok(())
    }
}
