pub mod basis;
pub mod errors;
mod gates;
mod measurements;
pub mod random;
mod state;
pub mod utils;

pub use basis::{Basis, Bit};
pub use gates::Gate;
pub use measurements::{Measurement, MeasurementResult};
pub use random::RandomSource;
pub use state::Qubit;
