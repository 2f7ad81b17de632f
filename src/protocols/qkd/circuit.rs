//! Density-matrix realization of the BB84 wire.
//!
//! Every photon is a [`Qubit`] prepared as X^bit followed by H for the
//! diagonal basis. Eve's interception is a projective measurement in her
//! basis: the collapsed state is exactly the photon she resends. Bob then
//! measures projectively in his basis. Outcomes follow the Born rule with the
//! run's [`RandomSource`], so the backend is as reproducible as
//! [`PhotonChannel`](super::transmission::PhotonChannel).

use crate::config::check_probability;
use crate::core::errors::ProtocolError;
use crate::core::{Measurement, Qubit, RandomSource};
use crate::protocols::qkd::transmission::{
    Interception, Transmission, TransmissionModel, TransmissionRecord,
};

#[derive(Debug, Clone, Default)]
pub struct CircuitChannel;

impl CircuitChannel {
    pub fn new() -> Self {
        Self
    }
}

impl TransmissionModel for CircuitChannel {
    fn transmit(
        &self,
        key_length: usize,
        eavesdrop_prob: f64,
        rng: &mut RandomSource,
    ) -> Result<TransmissionRecord, ProtocolError> {
        check_probability("eavesdrop_prob", eavesdrop_prob)?;
        let mut entries = Vec::with_capacity(key_length);

        for _ in 0..key_length {
            // Alice prepares qubits
            let alice_bit = rng.next_bit();
            let alice_basis = rng.next_basis();
            let bob_basis = rng.next_basis();

            let mut state = Qubit::encode(alice_bit, alice_basis);

            // Eavesdropper intercepts
            let mut interception = None;
            if eavesdrop_prob > 0.0 && rng.chance(eavesdrop_prob) {
                let basis = rng.next_basis();
                let res = state.measure(&Measurement::for_basis(basis), rng)?;
                interception = Some(Interception {
                    basis,
                    bit: res.bit(),
                });
            }

            // Bob measures
            let res = state.measure(&Measurement::for_basis(bob_basis), rng)?;

            entries.push(Transmission {
                alice_bit,
                alice_basis,
                bob_basis,
                bob_bit: res.bit(),
                interception,
            });
        }

        Ok(TransmissionRecord::new(entries))
    }
}
