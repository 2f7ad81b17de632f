//! BB84 quantum key distribution simulator.
//!
//! A single run transmits random bits through an optionally eavesdropped
//! channel, sifts to the matching-basis subset, estimates the QBER on a
//! disclosed sample and, if the channel passes the threshold, hashes the
//! remaining key. [`BatchAnalyzer`] repeats runs across a sweep of
//! eavesdropping probabilities and aggregates the statistics.
//!
//! ```no_run
//! use bb84_sim::{ProtocolConfig, bb84};
//!
//! let result = bb84::run(&ProtocolConfig::new(1000).with_eavesdrop_prob(0.5)).unwrap();
//! println!("qber {:.3}, secure {}", result.error_rate, result.secure);
//! ```

pub mod analysis;
pub mod config;
mod core;
pub mod protocols;

pub use crate::analysis::{BatchAnalyzer, BatchReport, BatchStatistics, CancelToken};
pub use crate::config::{BatchConfig, ProtocolConfig};
pub use crate::core::{
    Basis, Bit, Gate, Measurement, MeasurementResult, Qubit, RandomSource, errors, utils,
};
pub use crate::protocols::bb84;
pub use crate::protocols::qkd::amplification::{AmplifiedKey, amplify};
pub use crate::protocols::qkd::bb84::{Protocol, RunResult};
pub use crate::protocols::qkd::circuit::CircuitChannel;
pub use crate::protocols::qkd::estimation::ErrorCheckResult;
pub use crate::protocols::qkd::sifting::{SiftedKey, sift};
pub use crate::protocols::qkd::transmission::{
    InterceptResend, Interception, PhotonChannel, Transmission, TransmissionModel,
    TransmissionRecord,
};
