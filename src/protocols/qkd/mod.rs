//! BB84 Quantum Key Distribution.
//!
//! The protocol is split into its stages, each consuming the previous one's output:
//! - **transmission**: Alice prepares, Eve may intercept, Bob measures.
//! - **circuit**: a density-matrix backend for the transmission stage.
//! - **sifting**: basis reconciliation.
//! - **estimation**: QBER on a disclosed sample and the security threshold.
//! - **amplification**: hashing the surviving key.
//! - **bb84**: one full execution.

pub mod amplification;
pub mod bb84;
pub mod circuit;
pub mod estimation;
pub mod sifting;
pub mod transmission;
