//! Fixed-length structural fingerprints and the extractor interface.
//!
//! A [`Fingerprint`] is the active-bit set of a bit or count vector; Jaccard
//! distance only looks at which positions are non-zero, so count vectors are
//! reduced to their support on construction.
//!
//! [`HashedNgramFingerprinter`] is the built-in extractor: every character
//! n-gram (up to `max_ngram`) of an item's canonical string is hashed into one
//! of `n_bits` positions. It is deterministic across runs and platforms, and it
//! stands in for a chemistry toolkit fingerprint when none is available.
//!
//! ```
//! use neighbourspace::fingerprint::{Fingerprinter, HashedNgramFingerprinter};
//!
//! let fp = HashedNgramFingerprinter::new(2048, 3);
//! let a = fp.fingerprint("CCO");
//! assert_eq!(a.len(), 2048);
//! assert_eq!(a, fp.fingerprint("CCO"));
//! ```

use std::hash::Hasher;

use fixedbitset::FixedBitSet;
use twox_hash::XxHash64;

/// Fixed-length set of active bits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: FixedBitSet,
}

impl Fingerprint {
    /// An empty fingerprint of `n_bits` positions.
    pub fn zeros(n_bits: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(n_bits),
        }
    }

    /// Builds a fingerprint with the given positions switched on.
    ///
    /// # Panics
    ///
    /// Panics if any index is `>= n_bits`.
    pub fn from_indices(n_bits: usize, active: &[usize]) -> Self {
        let mut bits = FixedBitSet::with_capacity(n_bits);
        for &i in active {
            assert!(i < n_bits, "bit index {} out of range for {} bits", i, n_bits);
            bits.insert(i);
        }
        Self { bits }
    }

    /// Reduces a dense bit/count vector to its active set (non-zero entries).
    pub fn from_dense(values: &[f64]) -> Self {
        let mut bits = FixedBitSet::with_capacity(values.len());
        for (i, &v) in values.iter().enumerate() {
            if v != 0.0 {
                bits.insert(i);
            }
        }
        Self { bits }
    }

    /// Number of positions (the fingerprint length, not the active count).
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.len() == 0
    }

    #[inline]
    pub fn contains(&self, i: usize) -> bool {
        self.bits.contains(i)
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        self.bits.insert(i);
    }

    /// Number of active bits.
    #[inline]
    pub fn count_ones(&self) -> u32 {
        self.bits.as_slice().iter().map(|w| w.count_ones()).sum()
    }

    /// `|A & B|` by popcount over the packed words.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[inline]
    pub fn intersection_count(&self, other: &Fingerprint) -> u32 {
        assert_eq!(self.len(), other.len(), "Fingerprint length mismatch");
        self.bits
            .as_slice()
            .iter()
            .zip(other.bits.as_slice())
            .map(|(a, b)| (a & b).count_ones())
            .sum()
    }

    /// Active positions in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }
}

/// Produces a fixed-length fingerprint for an item identifier.
///
/// Implementations must be pure: the same identifier always maps to the same
/// fingerprint, and every fingerprint has length `n_bits()`.
pub trait Fingerprinter: Sync {
    fn fingerprint(&self, id: &str) -> Fingerprint;
    fn n_bits(&self) -> usize;
}

/// Hashed character n-gram fingerprint over an item's canonical string.
#[derive(Clone, Debug)]
pub struct HashedNgramFingerprinter {
    n_bits: usize,
    max_ngram: usize,
}

impl Default for HashedNgramFingerprinter {
    fn default() -> Self {
        Self::new(2048, 3)
    }
}

impl HashedNgramFingerprinter {
    /// # Panics
    ///
    /// Panics if `n_bits` or `max_ngram` is zero.
    pub fn new(n_bits: usize, max_ngram: usize) -> Self {
        assert!(n_bits > 0, "fingerprint needs at least one bit");
        assert!(max_ngram > 0, "max_ngram must be at least 1");
        Self { n_bits, max_ngram }
    }

    pub fn max_ngram(&self) -> usize {
        self.max_ngram
    }

    // seeded by n-gram length so "C" and a 1-char prefix of "CC" collide only by chance
    #[inline]
    fn position(&self, gram: &str, n: usize) -> usize {
        let mut h = XxHash64::with_seed(0x9E37_79B1_85EB_CA87 ^ n as u64);
        h.write(gram.as_bytes());
        (h.finish() % self.n_bits as u64) as usize
    }
}

impl Fingerprinter for HashedNgramFingerprinter {
    fn fingerprint(&self, id: &str) -> Fingerprint {
        let mut fp = Fingerprint::zeros(self.n_bits);
        let bounds: Vec<usize> = id
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(id.len()))
            .collect();
        let n_chars = bounds.len() - 1;

        for start in 0..n_chars {
            for n in 1..=self.max_ngram.min(n_chars - start) {
                let gram = &id[bounds[start]..bounds[start + n]];
                fp.set(self.position(gram, n));
            }
        }
        fp
    }

    fn n_bits(&self) -> usize {
        self.n_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dense_keeps_nonzero_counts() {
        let fp = Fingerprint::from_dense(&[0.0, 3.0, 0.0, 1.0, 0.0]);
        assert_eq!(fp.len(), 5);
        assert_eq!(fp.ones().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(fp.count_ones(), 2);
    }

    #[test]
    fn intersection_spans_word_boundaries() {
        let a = Fingerprint::from_indices(130, &[1, 64, 65, 129]);
        let b = Fingerprint::from_indices(130, &[64, 100, 129]);
        assert_eq!(a.intersection_count(&b), 2);
    }

    #[test]
    fn empty_identifier_has_no_active_bits() {
        let fp = HashedNgramFingerprinter::new(64, 2).fingerprint("");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp.count_ones(), 0);
    }

    #[test]
    fn shared_substrings_share_bits() {
        let f = HashedNgramFingerprinter::new(4096, 3);
        let a = f.fingerprint("CCOC(=O)C");
        let b = f.fingerprint("CCOC(=O)N");
        let c = f.fingerprint("c1ccccc1");
        assert!(a.intersection_count(&b) > a.intersection_count(&c));
    }

    #[test]
    fn multibyte_identifiers_are_handled() {
        let f = HashedNgramFingerprinter::new(256, 3);
        let fp = f.fingerprint("Cé[N+]");
        assert!(fp.count_ones() > 0);
    }
}
