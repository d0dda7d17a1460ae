//! Key digests: the built-in xor-shift string hash, adapters for
//! caller-supplied functions and `BuildHasher`s, and the `Prehashed`
//! value object used to carry a digest between calls.

use core::hash::BuildHasher;

/// Maps a key's bytes to an unsigned digest.
///
/// Implementations must be deterministic and free of side effects: the
/// table stores the digest of every entry and relies on it staying valid
/// for the entry's whole lifetime. The engine reduces the raw digest
/// modulo the current bucket count, so the digest itself never depends on
/// the table size.
pub trait Digest {
    fn digest(&self, key: &[u8]) -> u32;
}

/// Default digest: xor each byte into an accumulator, then shift it left
/// by one bit. Not cryptographic; fast on short ASCII keys.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct XorShift;

impl Digest for XorShift {
    #[inline]
    fn digest(&self, key: &[u8]) -> u32 {
        key.iter().fold(0u32, |acc, &b| (acc ^ u32::from(b)) << 1)
    }
}

/// Wraps a plain function or closure as a [`Digest`].
#[derive(Copy, Clone)]
pub struct FnDigest<F>(pub F);

impl<F> Digest for FnDigest<F>
where
    F: Fn(&[u8]) -> u32,
{
    #[inline]
    fn digest(&self, key: &[u8]) -> u32 {
        (self.0)(key)
    }
}

impl<F> core::fmt::Debug for FnDigest<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("FnDigest(..)")
    }
}

/// Adapts any `BuildHasher` (e.g. `RandomState`) into a [`Digest`] by
/// truncating its 64-bit output.
#[derive(Clone, Debug, Default)]
pub struct BuildHasherDigest<S>(pub S);

impl<S: BuildHasher> Digest for BuildHasherDigest<S> {
    #[inline]
    fn digest(&self, key: &[u8]) -> u32 {
        self.0.hash_one(key) as u32
    }
}

/// A key length and raw digest computed once by [`StrTable::prehash`] and
/// handed back to the `*_prehashed` operations so the key is not hashed
/// twice in a lookup-then-insert sequence.
///
/// The digest is stored unreduced, so a `Prehashed` stays valid across
/// rehashes of the table that produced it. It is meaningless for a table
/// with a different digest.
///
/// [`StrTable::prehash`]: crate::StrTable::prehash
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Prehashed {
    key_len: usize,
    hash: u32,
}

impl Prehashed {
    pub(crate) fn compute<H: Digest + ?Sized>(digest: &H, key: &[u8]) -> Self {
        Self {
            key_len: key.len(),
            hash: digest.digest(key),
        }
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Cheap sanity check that this digest was computed for `key`.
    #[inline]
    pub(crate) fn fits(&self, key: &[u8]) -> bool {
        self.key_len == key.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::RandomState;

    #[test]
    fn xor_shift_known_values() {
        let d = XorShift;
        assert_eq!(d.digest(b""), 0);
        // 'a' = 0x61: (0 ^ 0x61) << 1
        assert_eq!(d.digest(b"a"), 0xc2);
        // ((0xc2 ^ 0x62) << 1) = 0x140
        assert_eq!(d.digest(b"ab"), 0x140);
    }

    #[test]
    fn xor_shift_discards_high_bits_on_long_keys() {
        let key = vec![0xffu8; 100];
        // Must not panic on overflow; the accumulator simply loses its top bits.
        let _ = XorShift.digest(&key);
        assert_eq!(XorShift.digest(&key), XorShift.digest(&key));
    }

    #[test]
    fn fn_digest_calls_through() {
        let d = FnDigest(|k: &[u8]| k.len() as u32 * 7);
        assert_eq!(d.digest(b"abc"), 21);
    }

    #[test]
    fn build_hasher_digest_is_deterministic_per_state() {
        let d = BuildHasherDigest(RandomState::new());
        assert_eq!(d.digest(b"key"), d.digest(b"key"));
    }

    #[test]
    fn prehashed_records_len_and_raw_digest() {
        let p = Prehashed::compute(&XorShift, b"ab");
        assert_eq!(p.key_len(), 2);
        assert_eq!(p.hash(), 0x140);
        assert!(p.fits(b"xy"));
        assert!(!p.fits(b"xyz"));
    }
}
