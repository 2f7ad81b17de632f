//! Basis reconciliation: keep only the slots where Alice and Bob agree on the basis.

use crate::core::Bit;
use crate::protocols::qkd::transmission::TransmissionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Alice's and Bob's bits on the matching-basis slots, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiftedKey {
    alice: Vec<Bit>,
    bob: Vec<Bit>,
    /// Wire index of every kept slot.
    indices: Vec<usize>,
}

impl SiftedKey {
    pub fn len(&self) -> usize {
        self.alice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alice.is_empty()
    }

    pub fn alice(&self) -> &[Bit] {
        &self.alice
    }

    pub fn bob(&self) -> &[Bit] {
        &self.bob
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of positions where the two views disagree.
    pub fn mismatches(&self) -> usize {
        self.alice
            .iter()
            .zip(&self.bob)
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Drops the positions in `disclosed`, preserving the order of the rest.
    pub fn without(&self, disclosed: &BTreeSet<usize>) -> SiftedKey {
        let mut rest = SiftedKey::default();
        for (pos, ((&a, &b), &idx)) in self
            .alice
            .iter()
            .zip(&self.bob)
            .zip(&self.indices)
            .enumerate()
        {
            if !disclosed.contains(&pos) {
                rest.alice.push(a);
                rest.bob.push(b);
                rest.indices.push(idx);
            }
        }
        rest
    }
}

/// Filters `record` down to the matching-basis slots.
///
/// An empty or fully mismatched record yields an empty key.
pub fn sift(record: &TransmissionRecord) -> SiftedKey {
    let mut key = SiftedKey::default();

    for (i, t) in record.iter().enumerate() {
        if t.bases_match() {
            key.alice.push(t.alice_bit);
            key.bob.push(t.bob_bit);
            key.indices.push(i);
        }
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Basis, RandomSource};
    use crate::protocols::qkd::transmission::{PhotonChannel, Transmission, TransmissionModel};
    use proptest::prelude::*;

    fn slot(alice_basis: Basis, bob_basis: Basis, alice_bit: bool, bob_bit: bool) -> Transmission {
        Transmission {
            alice_bit,
            alice_basis,
            bob_basis,
            bob_bit,
            interception: None,
        }
    }

    #[test]
    fn keeps_matching_slots_in_order() {
        use Basis::{Diagonal as D, Rectilinear as R};
        let record = TransmissionRecord::new(vec![
            slot(R, R, true, true),
            slot(R, D, false, true),
            slot(D, D, false, false),
            slot(D, R, true, true),
            slot(D, D, true, false),
        ]);

        let key = sift(&record);
        assert_eq!(key.alice(), &[true, false, true]);
        assert_eq!(key.bob(), &[true, false, false]);
        assert_eq!(key.indices(), &[0, 2, 4]);
        assert_eq!(key.mismatches(), 1);
    }

    #[test]
    fn empty_record_sifts_to_empty_key() {
        assert!(sift(&TransmissionRecord::default()).is_empty());
    }

    #[test]
    fn without_removes_disclosed_positions() {
        use Basis::Rectilinear as R;
        let record = TransmissionRecord::new(vec![
            slot(R, R, true, true),
            slot(R, R, false, false),
            slot(R, R, true, true),
        ]);
        let key = sift(&record);
        let rest = key.without(&BTreeSet::from([1]));
        assert_eq!(rest.alice(), &[true, true]);
        assert_eq!(rest.indices(), &[0, 2]);
    }

    proptest! {
        #[test]
        fn sifted_views_stay_aligned(seed in any::<u64>(), n in 0usize..300) {
            let mut rng = RandomSource::seeded(seed);
            let record = PhotonChannel::new().transmit(n, 0.5, &mut rng).unwrap();
            let key = sift(&record);

            prop_assert_eq!(key.alice().len(), key.bob().len());
            prop_assert_eq!(key.len(), record.matching_bases_count());
            prop_assert!(key.indices().windows(2).all(|w| w[0] < w[1]));
            for (pos, &idx) in key.indices().iter().enumerate() {
                prop_assert_eq!(key.alice()[pos], record.entries()[idx].alice_bit);
            }
        }
    }
}
