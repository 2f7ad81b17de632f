use crate::core::basis::Basis;
use crate::core::utils;
use ndarray::{Array1, Array2, array};
use num_complex::Complex64;

/// Projective single-qubit measurement in one of the two BB84 bases.
///
/// Operator `k` corresponds to reading bit `k`.
#[derive(Clone, Debug)]
pub struct Measurement {
    /// Projectors onto the two basis states.
    pub operators: [Array2<Complex64>; 2],
    pub basis: Basis,
}

impl Measurement {
    /// Z basis (Computational) -> {|0>, |1>}.
    pub fn z_basis() -> Measurement {
        let v0: Array1<Complex64> = array![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        let v1: Array1<Complex64> = array![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];

        Measurement {
            operators: [
                utils::outer_product(&v0, &v0),
                utils::outer_product(&v1, &v1),
            ],
            basis: Basis::Rectilinear,
        }
    }

    /// X basis (Hadamard) -> {|+>, |->}.
    pub fn x_basis() -> Measurement {
        let inv_sqrt2 = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);

        let v_plus: Array1<Complex64> = array![inv_sqrt2, inv_sqrt2];
        let v_minus: Array1<Complex64> = array![inv_sqrt2, -inv_sqrt2];

        Measurement {
            operators: [
                utils::outer_product(&v_plus, &v_plus),
                utils::outer_product(&v_minus, &v_minus),
            ],
            basis: Basis::Diagonal,
        }
    }

    pub fn for_basis(basis: Basis) -> Measurement {
        match basis {
            Basis::Rectilinear => Self::z_basis(),
            Basis::Diagonal => Self::x_basis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementResult {
    /// Applied projector index, i.e. the bit that was read.
    pub index: usize,
    /// Probability of the observed outcome before collapse.
    pub probability: f64,
}

impl MeasurementResult {
    pub fn bit(&self) -> bool {
        self.index == 1
    }
}
