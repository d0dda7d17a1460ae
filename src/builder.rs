//! Construction-time configuration for [`StrTable`].

use crate::bucket_store::BucketStore;
use crate::digest::{Digest, FnDigest, XorShift};
use crate::error::AllocError;
use crate::flags::TableFlags;
use crate::str_table::{FreeFn, StrTable};
use allocator_api2::alloc::{Allocator, Global};
use std::rc::Rc;

/// Builder for a [`StrTable`]. Start with [`StrTable::builder`] or
/// [`TableBuilder::new`], chain the options, then call `build`.
pub struct TableBuilder<V, H = XorShift, A = Global> {
    capacity: usize,
    flags: TableFlags,
    free_fn: Option<FreeFn<V>>,
    digest: H,
    alloc: A,
    node_capacity: usize,
}

impl<V> TableBuilder<V> {
    /// `capacity` is the initial bucket count, typically the expected
    /// number of entries. Zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            flags: TableFlags::NONE,
            free_fn: None,
            digest: XorShift,
            alloc: Global,
            node_capacity: 0,
        }
    }
}

impl<V, H, A> TableBuilder<V, H, A> {
    pub fn flags(mut self, flags: TableFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Values the table discards (on replace, clear and drop) are passed
    /// to `free_fn` instead of being dropped.
    pub fn free_fn<F>(mut self, free_fn: F) -> Self
    where
        F: Fn(V) + 'static,
    {
        self.free_fn = Some(Rc::new(free_fn));
        self
    }

    /// Shares an existing free function, e.g. one taken from another table.
    pub fn shared_free_fn(mut self, free_fn: FreeFn<V>) -> Self {
        self.free_fn = Some(free_fn);
        self
    }

    /// Replaces the default xor-shift digest.
    pub fn digest<H2: Digest>(self, digest: H2) -> TableBuilder<V, H2, A> {
        TableBuilder {
            capacity: self.capacity,
            flags: self.flags,
            free_fn: self.free_fn,
            digest,
            alloc: self.alloc,
            node_capacity: self.node_capacity,
        }
    }

    /// Shorthand for `digest(FnDigest(f))`.
    pub fn digest_fn<F>(self, f: F) -> TableBuilder<V, FnDigest<F>, A>
    where
        F: Fn(&[u8]) -> u32,
    {
        self.digest(FnDigest(f))
    }

    /// Allocates the bucket array and the table's key copies from `alloc`
    /// instead of the global allocator. Entry nodes always come from the
    /// global allocator.
    pub fn allocator<A2: Allocator + Clone>(self, alloc: A2) -> TableBuilder<V, H, A2> {
        TableBuilder {
            capacity: self.capacity,
            flags: self.flags,
            free_fn: self.free_fn,
            digest: self.digest,
            alloc,
            node_capacity: self.node_capacity,
        }
    }

    /// Reserves room for `n` entries up front so early inserts do not
    /// reallocate the entry arena.
    pub fn node_capacity(mut self, n: usize) -> Self {
        self.node_capacity = n;
        self
    }
}

impl<V, H: Digest, A: Allocator + Clone> TableBuilder<V, H, A> {
    pub fn build<'k>(self) -> Result<StrTable<'k, V, H, A>, AllocError> {
        let store = BucketStore::with_buckets(self.capacity, self.node_capacity, self.alloc)?;
        log::trace!(
            "new table: {} buckets, {:?}, free fn: {}",
            self.capacity,
            self.flags,
            self.free_fn.is_some()
        );
        Ok(StrTable::from_parts(store, self.flags, self.free_fn, self.digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn defaults() {
        let t: StrTable<'_, i32> = TableBuilder::new(8).build().unwrap();
        assert_eq!(t.size(), 8);
        assert_eq!(t.flags(), TableFlags::NONE);
        assert!(!t.has_free_fn());
        assert!(t.is_empty());
    }

    #[test]
    fn options_reach_the_table() {
        let t: StrTable<'_, i32, _> = TableBuilder::new(3)
            .flags(TableFlags::AUTO_REHASH)
            .free_fn(drop::<i32>)
            .digest_fn(|k: &[u8]| k.len() as u32)
            .node_capacity(64)
            .build()
            .unwrap();
        assert_eq!(t.size(), 3);
        assert!(t.flags().contains(TableFlags::AUTO_REHASH));
        assert!(t.has_free_fn());
        assert_eq!(t.prehash("abcd").hash(), 4);
    }

    #[test]
    fn allocator_reaches_the_table() {
        let t: StrTable<'_, i32, XorShift, Global> = TableBuilder::new(2)
            .allocator(Global)
            .digest(XorShift)
            .build()
            .unwrap();
        let _: &Global = t.allocator();
        assert_eq!(t.size(), 2);
    }

    #[test]
    fn shared_free_fn_is_used() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let free: FreeFn<i32> = Rc::new(move |_: i32| c.set(c.get() + 1));
        {
            let mut t: StrTable<'_, i32> = TableBuilder::new(2).shared_free_fn(free.clone()).build().unwrap();
            t.insert("a", 1).unwrap();
        }
        assert_eq!(count.get(), 1);
    }
}
