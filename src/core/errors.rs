use num_complex::Complex64;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Key length must be positive")]
    InvalidKeyLength,

    #[error("Invalid {name}: {value}. Must be between 0.0 and 1.0")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Eavesdrop sweep must contain at least one probability")]
    EmptySweep,

    #[error("Number of simulations must be positive")]
    InvalidSimulationCount,

    #[error("Number of workers must be positive")]
    InvalidWorkerCount,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("Cannot sample {requested} distinct indices from a population of {population}")]
    SampleTooLarge { requested: usize, population: usize },
}

#[derive(Error, Debug, Clone)]
pub enum GateError {
    #[error("Matrix is not Unitary (U†U != I)")]
    NonUnitary,

    #[error("Matrix must be 2x2")]
    InvalidDimensions,
}

#[derive(Error, Debug, Clone)]
pub enum StateError {
    #[error("Trace is not unity: {0}")]
    InvalidTrace(Complex64),

    #[error("Measurement outcome {0} has zero probability")]
    ImpossibleOutcome(usize),
}

/// Failures surfaced by a protocol run or a batch sweep.
///
/// An insecure channel is not an error: it is reported through
/// `RunResult::secure`.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sampling error: {0}")]
    Sampling(#[from] SamplingError),

    #[error("Transmission backend error: {0}")]
    Backend(#[from] StateError),
}
