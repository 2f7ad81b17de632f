use crate::core::errors::GateError;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;

/// A single-qubit unitary used to prepare BB84 photon states.
#[derive(Clone, Debug)]
pub struct Gate {
    /// The 2x2 unitary matrix of the gate.
    pub matrix: Array2<Complex64>,
}

impl Gate {
    /// Creates a new `Gate` from a 2x2 unitary matrix.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if the matrix is not 2x2 or not unitary.
    pub fn new(matrix: Array2<Complex64>) -> Result<Self, GateError> {
        if matrix.dim() != (2, 2) {
            return Err(GateError::InvalidDimensions);
        }

        if !utils::is_unitary(&matrix, 1e-6) {
            return Err(GateError::NonUnitary);
        }

        Ok(Self { matrix })
    }

    /// Pauli-X (bit flip), prepares bit 1 from $|0\rangle$.
    pub fn x() -> Gate {
        let (zero, one) = (Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0));
        Gate {
            matrix: arr2(&[[zero, one], [one, zero]]),
        }
    }

    /// Hadamard, rotates the rectilinear basis onto the diagonal one.
    pub fn h() -> Gate {
        let factor = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Gate {
            matrix: arr2(&[[factor, factor], [factor, -factor]]),
        }
    }
}
