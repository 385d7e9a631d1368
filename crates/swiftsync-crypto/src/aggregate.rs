//! Salted additive fingerprint over a multiset of outpoints.
//!
//! Each outpoint hashes to four 64-bit words that are added to (or
//! subtracted from) four accumulator limbs with wrapping arithmetic. The
//! operations commute, so a balanced multiset of additions and spends
//! cancels to zero regardless of order. A fresh random salt keys the hash
//! per instance, which makes the accumulated value meaningless across runs;
//! this is an integrity check, not an adversarial accumulator.

use bitcoin::OutPoint;
use bitcoin::consensus::Encodable;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Additive multiset fingerprint keyed by a per-instance salt.
///
/// The salt is drawn at construction and never serialized, so the state
/// only validates within a single process run.
#[derive(Clone)]
pub struct Aggregate {
    limbs: [u64; 4],
    salted_hasher: Sha256,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregate {
    pub fn new() -> Self {
        let mut salt = [0u8; 32];
        OsRng.fill_bytes(&mut salt);
        let mut salted_hasher = Sha256::new();
        salted_hasher.update(salt);
        Self {
            limbs: [0; 4],
            salted_hasher,
        }
    }

    fn outpoint_words(&self, outpoint: &OutPoint) -> [u64; 4] {
        let mut data = Vec::with_capacity(36);
        outpoint
            .consensus_encode(&mut data)
            .expect("vec writer never fails; qed");
        let mut hasher = self.salted_hasher.clone();
        hasher.update(&data);
        let hash: [u8; 32] = hasher.finalize().into();
        std::array::from_fn(|i| {
            u64::from_le_bytes(
                hash[i * 8..(i + 1) * 8]
                    .try_into()
                    .expect("8-byte chunk of a 32-byte hash; qed"),
            )
        })
    }

    /// Account for the creation of an outpoint.
    pub fn add(&mut self, outpoint: &OutPoint) {
        let words = self.outpoint_words(outpoint);
        for (limb, word) in self.limbs.iter_mut().zip(words) {
            *limb = limb.wrapping_add(word);
        }
    }

    /// Account for the consumption of an outpoint.
    pub fn spend(&mut self, outpoint: &OutPoint) {
        let words = self.outpoint_words(outpoint);
        for (limb, word) in self.limbs.iter_mut().zip(words) {
            *limb = limb.wrapping_sub(word);
        }
    }

    /// True iff every addition has been matched by a spend.
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|limb| *limb == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::Txid;
    use bitcoin::hashes::Hash;

    fn outpoint(seed: u8, vout: u32) -> OutPoint {
        OutPoint {
            txid: Txid::from_byte_array([seed; 32]),
            vout,
        }
    }

    #[test]
    fn test_new_aggregate_is_zero() {
        assert!(Aggregate::new().is_zero());
    }

    #[test]
    fn test_add_spend_cancels() {
        let mut aggregate = Aggregate::new();
        let o1 = outpoint(1, 0);
        let o2 = outpoint(2, 1);
        let o3 = outpoint(3, 7);

        aggregate.add(&o1);
        aggregate.spend(&o2);
        aggregate.add(&o3);
        assert!(!aggregate.is_zero());

        aggregate.spend(&o1);
        aggregate.add(&o2);
        aggregate.spend(&o3);
        assert!(aggregate.is_zero());
    }

    #[test]
    fn test_order_is_irrelevant() {
        let mut outpoints = Vec::new();
        for i in 0..64u8 {
            outpoints.push(outpoint(i, fastrand::u32(..)));
        }

        let mut aggregate = Aggregate::new();
        for o in &outpoints {
            aggregate.add(o);
        }
        fastrand::shuffle(&mut outpoints);
        for o in &outpoints {
            aggregate.spend(o);
        }
        assert!(aggregate.is_zero());
    }

    #[test]
    fn test_imbalance_is_visible() {
        let mut aggregate = Aggregate::new();
        let o1 = outpoint(1, 0);
        let o2 = outpoint(1, 1);

        aggregate.add(&o1);
        aggregate.add(&o2);
        aggregate.spend(&o1);
        assert!(!aggregate.is_zero());

        // An outpoint differing only in its index does not cancel.
        aggregate.spend(&outpoint(1, 2));
        assert!(!aggregate.is_zero());
    }

    #[test]
    fn test_duplicate_outpoints_accumulate() {
        let mut aggregate = Aggregate::new();
        let o = outpoint(9, 3);

        aggregate.add(&o);
        aggregate.add(&o);
        aggregate.spend(&o);
        assert!(!aggregate.is_zero());
        aggregate.spend(&o);
        assert!(aggregate.is_zero());
    }
}
