//! Quantum transmission stage of BB84.
//!
//! Alice prepares each photon with a random bit in a random basis, Eve may
//! intercept it, and Bob measures whatever reaches him in his own random basis.
//! Any backend implementing [`TransmissionModel`] can stand in for this stage.

use crate::config::check_probability;
use crate::core::errors::ProtocolError;
use crate::core::{Basis, Bit, RandomSource};
use serde::{Deserialize, Serialize};

/// Eve's view of one intercepted photon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interception {
    /// Basis Eve measured and resent in.
    pub basis: Basis,
    /// Bit Eve read and re-encoded.
    pub bit: Bit,
}

/// One photon slot of the wire, in transmission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmission {
    pub alice_bit: Bit,
    pub alice_basis: Basis,
    pub bob_basis: Basis,
    pub bob_bit: Bit,
    pub interception: Option<Interception>,
}

impl Transmission {
    pub fn intercepted(&self) -> bool {
        self.interception.is_some()
    }

    pub fn bases_match(&self) -> bool {
        self.alice_basis == self.bob_basis
    }
}

/// The full wire record of one run. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransmissionRecord {
    entries: Vec<Transmission>,
}

impl TransmissionRecord {
    pub fn new(entries: Vec<Transmission>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Transmission] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transmission> {
        self.entries.iter()
    }

    pub fn intercepted_count(&self) -> usize {
        self.entries.iter().filter(|t| t.intercepted()).count()
    }

    pub fn matching_bases_count(&self) -> usize {
        self.entries.iter().filter(|t| t.bases_match()).count()
    }
}

impl<'a> IntoIterator for &'a TransmissionRecord {
    type Item = &'a Transmission;
    type IntoIter = std::slice::Iter<'a, Transmission>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A backend realizing the prepare/intercept/measure step.
///
/// Implementations draw every random choice from `rng` and must return a
/// record of exactly `key_length` entries. An `eavesdrop_prob` outside [0, 1]
/// (NaN included) is rejected with `ConfigError::InvalidProbability` before
/// any randomness is drawn. Implementations hold no per-run state, so one
/// instance can serve many runs across worker threads.
pub trait TransmissionModel: Send + Sync {
    fn transmit(
        &self,
        key_length: usize,
        eavesdrop_prob: f64,
        rng: &mut RandomSource,
    ) -> Result<TransmissionRecord, ProtocolError>;
}

/// A photon in flight: the bit it carries and the basis it was encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Photon {
    pub bit: Bit,
    pub basis: Basis,
}

impl Photon {
    /// Measures the photon in `basis`. A matching basis recovers the encoded
    /// bit, a conjugate basis yields a fair coin.
    pub fn measure(&self, basis: Basis, rng: &mut RandomSource) -> Bit {
        if basis == self.basis {
            self.bit
        } else {
            rng.next_bit()
        }
    }
}

/// Intercept-resend eavesdropper.
///
/// Eve measures in a random basis and forwards a fresh photon carrying her
/// result in her basis, which is what disturbs the sifted key.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterceptResend;

impl InterceptResend {
    /// Returns the photon that continues to Bob and Eve's record if she acted.
    ///
    /// # Panics
    ///
    /// Panics if `probability` is not in [0, 1].
    pub fn intercept(
        &self,
        photon: Photon,
        probability: f64,
        rng: &mut RandomSource,
    ) -> (Photon, Option<Interception>) {
        if probability <= 0.0 || !rng.chance(probability) {
            return (photon, None);
        }

        let basis = rng.next_basis();
        let bit = photon.measure(basis, rng);
        (Photon { bit, basis }, Some(Interception { basis, bit }))
    }
}

/// Closed-form photon model of the BB84 wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotonChannel {
    eve: InterceptResend,
}

impl PhotonChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransmissionModel for PhotonChannel {
    fn transmit(
        &self,
        key_length: usize,
        eavesdrop_prob: f64,
        rng: &mut RandomSource,
    ) -> Result<TransmissionRecord, ProtocolError> {
        check_probability("eavesdrop_prob", eavesdrop_prob)?;
        let mut entries = Vec::with_capacity(key_length);

        for _ in 0..key_length {
            // Alice prepares
            let alice_bit = rng.next_bit();
            let alice_basis = rng.next_basis();
            let bob_basis = rng.next_basis();

            let sent = Photon {
                bit: alice_bit,
                basis: alice_basis,
            };

            // Eavesdropper intercepts
            let (received, interception) = self.eve.intercept(sent, eavesdrop_prob, rng);

            // Bob measures
            let bob_bit = received.measure(bob_basis, rng);

            entries.push(Transmission {
                alice_bit,
                alice_basis,
                bob_basis,
                bob_bit,
                interception,
            });
        }

        Ok(TransmissionRecord::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ConfigError;

    #[test]
    fn record_has_requested_length() {
        let mut rng = RandomSource::seeded(5);
        for n in [1, 8, 257] {
            let record = PhotonChannel::new().transmit(n, 0.3, &mut rng).unwrap();
            assert_eq!(record.len(), n);
        }
    }

    #[test]
    fn no_eavesdropper_means_no_errors_on_matching_bases() {
        let mut rng = RandomSource::seeded(17);
        let record = PhotonChannel::new().transmit(2_000, 0.0, &mut rng).unwrap();

        assert_eq!(record.intercepted_count(), 0);
        assert!(
            record
                .iter()
                .filter(|t| t.bases_match())
                .all(|t| t.alice_bit == t.bob_bit)
        );
    }

    #[test]
    fn full_interception_marks_every_photon() {
        let mut rng = RandomSource::seeded(23);
        let record = PhotonChannel::new().transmit(500, 1.0, &mut rng).unwrap();
        assert_eq!(record.intercepted_count(), 500);

        // Eve in Alice's basis reads the true bit; Bob in Eve's basis reads Eve's bit.
        for t in &record {
            let eve = t.interception.unwrap();
            if eve.basis == t.alice_basis {
                assert_eq!(eve.bit, t.alice_bit);
            }
            if t.bob_basis == eve.basis {
                assert_eq!(t.bob_bit, eve.bit);
            }
        }
    }

    #[test]
    fn rejects_malformed_eavesdrop_prob() {
        for prob in [f64::NAN, 1.5, -0.5] {
            let mut rng = RandomSource::seeded(2);
            let err = PhotonChannel::new().transmit(100, prob, &mut rng).unwrap_err();
            assert!(matches!(
                err,
                ProtocolError::Config(ConfigError::InvalidProbability {
                    name: "eavesdrop_prob",
                    ..
                })
            ));
        }
    }

    #[test]
    fn intercept_skips_when_probability_zero() {
        let mut rng = RandomSource::seeded(1);
        let photon = Photon {
            bit: true,
            basis: Basis::Diagonal,
        };
        let (out, eve) = InterceptResend.intercept(photon, 0.0, &mut rng);
        assert_eq!(out, photon);
        assert!(eve.is_none());
    }
}
