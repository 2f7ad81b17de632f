use crate::core::Gate;
use crate::core::basis::Basis;
use crate::core::errors::StateError;
use crate::core::measurements::{Measurement, MeasurementResult};
use crate::core::random::RandomSource;
use crate::core::utils::{dagger, trace};
use ndarray::Array2;
use num_complex::Complex64;

/// Outcome probabilities below this are floating point residue.
const PROBABILITY_EPSILON: f64 = 1e-12;

/// Density matrix of a single photon polarization qubit.
#[derive(Clone, Debug)]
pub struct Qubit {
    pub density_matrix: Array2<Complex64>,
}

impl Default for Qubit {
    fn default() -> Self {
        Self::new()
    }
}

impl Qubit {
    /// Creates a qubit initialized to |0>.
    pub fn new() -> Self {
        let mut density_matrix = Array2::<Complex64>::zeros((2, 2));
        density_matrix[[0, 0]] = Complex64::new(1.0, 0.0);

        Self { density_matrix }
    }

    /// Prepares the BB84 state carrying `bit` in `basis`:
    /// X^bit |0>, followed by H when the basis is diagonal.
    pub fn encode(bit: bool, basis: Basis) -> Self {
        let mut qubit = Self::new();
        if bit {
            qubit.apply(&Gate::x());
        }
        if basis.is_diagonal() {
            qubit.apply(&Gate::h());
        }
        qubit
    }

    /// Checks that the density matrix still has unit trace.
    pub fn is_valid(&self) -> Result<(), StateError> {
        let tr = trace(&self.density_matrix);
        if (tr - Complex64::new(1.0, 0.0)).norm() > 1e-9 {
            return Err(StateError::InvalidTrace(tr));
        }
        Ok(())
    }

    /// rho' = U rho U†
    pub fn apply(&mut self, gate: &Gate) {
        let temp = gate.matrix.dot(&self.density_matrix);
        self.density_matrix = temp.dot(&dagger(&gate.matrix));
    }

    /// Born-rule probability of each outcome of `measurement`.
    pub fn probabilities(&self, measurement: &Measurement) -> [f64; 2] {
        let mut probs = [0.0; 2];
        for (p, op) in probs.iter_mut().zip(measurement.operators.iter()) {
            let projected = op.dot(&self.density_matrix).dot(&dagger(op));
            let re = trace(&projected).re;
            *p = if re < PROBABILITY_EPSILON { 0.0 } else { re };
        }

        // Renormalize against floating point drift
        let sum: f64 = probs.iter().sum();
        if sum > 0.0 {
            for p in &mut probs {
                *p /= sum;
            }
        }
        probs
    }

    /// Physical measurement which collapses the state onto the observed
    /// basis vector. The post-measurement state is what gets forwarded.
    pub fn measure(
        &mut self,
        measurement: &Measurement,
        rng: &mut RandomSource,
    ) -> Result<MeasurementResult, StateError> {
        self.is_valid()?;
        let probs = self.probabilities(measurement);

        let roll = rng.unit();
        let outcome_idx = if roll < probs[0] { 0 } else { 1 };
        let p_selected = probs[outcome_idx];

        if p_selected <= PROBABILITY_EPSILON {
            return Err(StateError::ImpossibleOutcome(outcome_idx));
        }

        // rho' = (P_k * rho * P_k†) / p_k
        let p_k = &measurement.operators[outcome_idx];
        let numerator = p_k.dot(&self.density_matrix).dot(&dagger(p_k));
        self.density_matrix = numerator.mapv(|val| val / Complex64::new(p_selected, 0.0));

        Ok(MeasurementResult {
            index: outcome_idx,
            probability: p_selected,
        })
    }
}
