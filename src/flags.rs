//! Behavior flags fixed at construction (and adjustable later through
//! `StrTable::set_flags`).

use bitflags::bitflags;

bitflags! {
    /// Table behavior switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TableFlags: u32 {
        /// Store keys passed to the `*_borrowed` entry points verbatim; the
        /// table never allocates memory for them.
        const NO_KEY_COPY = 1 << 1;
        /// Grow and rehash once more than 80% of the buckets' worth of
        /// items are stored.
        const AUTO_REHASH = 1 << 2;
        /// Skip the existing-key scan on insert. Duplicates become possible
        /// and lookups see the most recently inserted one.
        const NO_DUPLICATE_CHECK = 1 << 3;
    }
}

impl TableFlags {
    /// Fixed-capacity table that copies keys and rejects duplicates.
    pub const NONE: Self = Self::empty();
}
