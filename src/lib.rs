//! strtable: a single-threaded chained hash table keyed by byte strings,
//! with pluggable digests, explicit key/value ownership and a
//! configurable duplicate-key policy.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small string-keyed table whose memory contract is visible in
//!   the types: the table owns its key copies, hands values back on
//!   removal, and disposes of values only through an optional free
//!   function.
//! - Layers:
//!   - `Digest`: maps key bytes to a `u32`. The default is an xor-shift
//!     hash; closures and `BuildHasher`s can be plugged in.
//!   - `BucketStore`: fixed-size array of chain heads over a `SlotMap`
//!     arena of nodes. Chains link by arena key, never by pointer.
//!   - `StrTable`: insert/replace/get/remove/clear, the duplicate-key
//!     policy, growth, and the free-function rules.
//!   - Enumeration: `for_each`, `keys`, `values`, `duplicate`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (the free function is an `Rc`).
//! - Bucket count is fixed unless `AUTO_REHASH` is set; chains simply
//!   grow longer when a fixed table is overfilled.
//! - Each node stores its raw digest. Bucket indices are always
//!   `digest % size`, so rehashing relinks nodes without calling the
//!   digest again and without copying keys.
//! - New entries go to the head of their chain; under
//!   `NO_DUPLICATE_CHECK` the most recent of several equal keys is the
//!   one lookups and `remove` see.
//!
//! Ownership
//! - Owned keys are moved in. Keys borrowed for the call are copied, so
//!   a copying table is never tied to its callers' buffers. Keys given to
//!   `insert_borrowed`/`replace_borrowed` live as long as the table
//!   (`'k`); under `NO_KEY_COPY` they are stored as given.
//! - Key copies and the bucket array come from the table's allocator
//!   (`allocator_api2::alloc::Allocator`, `Global` by default).
//! - `remove` returns the value; the free function is not involved.
//! - `replace`, `clear` and drop pass discarded values to the free
//!   function exactly once each. Without one, they are dropped, and
//!   replacing an existing key is refused.
//! - User code (free function, duplicator) only runs once the structure
//!   is consistent. A custom digest runs inside mutators; a debug-only
//!   guard panics if it re-enters the table.
//!
//! Errors
//! - Policy violations (duplicate insert, replace without a free
//!   function) are recoverable `InsertError`s; the table is unchanged.
//! - Allocation failures while building a table, adding an entry or
//!   duplicating are reported as errors. A rehash that cannot allocate
//!   keeps the old bucket array; the insert that triggered it has
//!   already succeeded.
//! - A missing key is `None`, never an error.

mod bucket_store;
mod builder;
pub mod digest;
mod enumerate;
mod error;
mod flags;
mod growth;
mod key;
mod op_guard;
mod stats;
mod str_table;
mod str_table_proptest;

// Public surface
pub use bucket_store::{Iter, IterMut};
pub use builder::TableBuilder;
pub use digest::{BuildHasherDigest, Digest, FnDigest, Prehashed, XorShift};
pub use error::{AllocError, InsertError};
pub use flags::TableFlags;
pub use key::IntoKey;
pub use stats::TableStats;
pub use str_table::{FreeFn, StrTable};
