use crate::config::ProtocolConfig;
use crate::core::errors::ProtocolError;
use crate::core::{Bit, RandomSource};
use crate::protocols::qkd::amplification::{AmplifiedKey, amplify};
use crate::protocols::qkd::estimation;
use crate::protocols::qkd::sifting::sift;
use crate::protocols::qkd::transmission::{PhotonChannel, TransmissionModel};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// BB84 results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Photons sent by Alice.
    pub transmitted: usize,
    /// Photons Eve intercepted.
    pub intercepted: usize,
    /// Bits kept after basis reconciliation.
    pub sifted_length: usize,
    /// Bits disclosed for the error check.
    pub sample_size: usize,
    pub error_count: usize,
    /// QBER on the disclosed sample, as a fraction.
    pub error_rate: f64,
    /// The sifted key was non-empty but nothing was sampled.
    pub empty_sample: bool,
    pub secure: bool,
    /// Sifted bits left after removing the sample. Reported for aborted runs too.
    pub final_key_length: usize,
    /// Alice's copy of the final key; `None` when the run aborted.
    pub final_key: Option<Vec<Bit>>,
    /// Hashed final key, when amplification is enabled and there is a key.
    pub amplified_key: Option<AmplifiedKey>,
    pub elapsed: Duration,
}

impl RunResult {
    /// Fraction of transmitted photons that survived sifting.
    pub fn sifted_ratio(&self) -> f64 {
        if self.transmitted == 0 {
            0.0
        } else {
            self.sifted_length as f64 / self.transmitted as f64
        }
    }

    /// True when the error check rejected the channel.
    pub fn aborted(&self) -> bool {
        !self.secure
    }
}

/// One BB84 execution over a pluggable transmission backend.
#[derive(Debug, Clone, Default)]
pub struct Protocol<T = PhotonChannel> {
    transmission: T,
}

impl Protocol<PhotonChannel> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: TransmissionModel> Protocol<T> {
    pub fn with_transmission(transmission: T) -> Self {
        Self { transmission }
    }

    pub fn transmission(&self) -> &T {
        &self.transmission
    }

    /// Runs with the randomness described by `config.seed`.
    pub fn run(&self, config: &ProtocolConfig) -> Result<RunResult, ProtocolError> {
        config.validate()?;
        let mut rng = RandomSource::from_optional_seed(config.seed);
        self.run_with(config, &mut rng)
    }

    /// Runs drawing every random choice from `rng`.
    ///
    /// Only a malformed `config` is an error; an insecure channel is a normal
    /// result with `secure == false`.
    pub fn run_with(
        &self,
        config: &ProtocolConfig,
        rng: &mut RandomSource,
    ) -> Result<RunResult, ProtocolError> {
        config.validate()?;
        let start = Instant::now();

        // Quantum transmission
        let record = self
            .transmission
            .transmit(config.key_length, config.eavesdrop_prob, rng)?;

        // Sifting stage
        let sifted = sift(&record);

        // Error estimation
        let (check, remaining) =
            estimation::check(&sifted, config.sample_fraction, config.threshold, rng)?;

        debug!(
            "bb84 run: n={} eve={} sifted={} sample={} errors={} qber={:.4} secure={}",
            record.len(),
            config.eavesdrop_prob,
            sifted.len(),
            check.sample_size,
            check.error_count,
            check.error_rate,
            check.secure
        );
        if check.empty_sample {
            debug!(
                "bb84 run: sample fraction {} disclosed nothing from {} sifted bits",
                config.sample_fraction,
                sifted.len()
            );
        }

        // Privacy amplification
        let (final_key, amplified_key) = if check.secure {
            let key = remaining.alice().to_vec();
            let amplified = (config.amplify && !key.is_empty()).then(|| amplify(&key));
            (Some(key), amplified)
        } else {
            (None, None)
        };

        Ok(RunResult {
            transmitted: record.len(),
            intercepted: record.intercepted_count(),
            sifted_length: sifted.len(),
            sample_size: check.sample_size,
            error_count: check.error_count,
            error_rate: check.error_rate,
            empty_sample: check.empty_sample,
            secure: check.secure,
            final_key_length: remaining.len(),
            final_key,
            amplified_key,
            elapsed: start.elapsed(),
        })
    }
}

/// Runs BB84 over the closed-form photon channel.
pub fn run(config: &ProtocolConfig) -> Result<RunResult, ProtocolError> {
    Protocol::new().run(config)
}
