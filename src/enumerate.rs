//! Whole-table traversal, key/value export and duplication.
//!
//! Traversal order is bucket by bucket, each chain newest first. It is
//! stable between calls as long as the table is not modified, so `keys()`
//! and `values()` line up index for index, but it is otherwise unspecified.

use crate::bucket_store::{BucketStore, Iter, IterMut};
use crate::digest::Digest;
use crate::error::AllocError;
use crate::key::duplicate_key;
use crate::str_table::StrTable;
use allocator_api2::alloc::Allocator;

impl<'k, V, H: Digest, A: Allocator + Clone> StrTable<'k, V, H, A> {
    /// Borrowing iterator over `(key, value)` pairs.
    pub fn iter(&self) -> Iter<'_, 'k, V, A> {
        self.store.iter()
    }

    /// Mutable access to every value. The order here is arena order and
    /// need not match [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> IterMut<'_, 'k, V, A> {
        self.store.values_mut()
    }

    /// Calls `f` for every entry and returns how many were visited.
    pub fn for_each<F>(&self, mut f: F) -> usize
    where
        F: FnMut(&[u8], &V),
    {
        self.store.iter().fold(0, |n, (k, v)| {
            f(k, v);
            n + 1
        })
    }

    /// Like [`for_each`](Self::for_each), threading a caller context through
    /// every call.
    pub fn for_each_with<C, F>(&self, arg: &mut C, mut f: F) -> usize
    where
        C: ?Sized,
        F: FnMut(&[u8], &V, &mut C),
    {
        self.store.iter().fold(0, |n, (k, v)| {
            f(k, v, arg);
            n + 1
        })
    }

    /// Every key, borrowed from the table.
    pub fn keys(&self) -> Vec<&[u8]> {
        self.store.iter().map(|(k, _)| k).collect()
    }

    /// Every key as an independent copy.
    pub fn keys_owned(&self) -> Vec<Vec<u8>> {
        self.store.iter().map(|(k, _)| k.to_vec()).collect()
    }

    pub fn values(&self) -> Vec<&V> {
        self.store.iter().map(|(_, v)| v).collect()
    }
}

impl<'k, V, H: Digest + Clone, A: Allocator + Clone> StrTable<'k, V, H, A> {
    /// Deep copy: same bucket count, flags, digest, allocator and free
    /// function; each key copied (keys stored under `NO_KEY_COPY` stay
    /// borrowed) and each value produced by `dup`. Chains keep their
    /// order, so shadowed duplicates stay shadowed in the copy.
    pub fn duplicate<F>(&self, mut dup: F) -> Result<StrTable<'k, V, H, A>, AllocError>
    where
        F: FnMut(&V) -> V,
    {
        let alloc = self.store.allocator();
        // Reserves every node up front; the pushes below cannot fail.
        let mut store = BucketStore::with_buckets(self.store.size(), self.store.len(), alloc.clone())?;
        let mut chain = Vec::new();
        for slot in 0..self.store.size() {
            chain.clear();
            chain.extend(self.store.chain(slot));
            // Rebuild back to front so push_front restores the original order.
            for n in chain.iter().rev() {
                let key = duplicate_key(&n.key, alloc)?;
                store.push_front(key, n.hash, dup(&n.value));
            }
        }
        Ok(StrTable::from_parts(
            store,
            self.flags,
            self.free_fn.clone(),
            self.digest.clone(),
        ))
    }
}

impl<'a, 'k, V, H: Digest, A: Allocator + Clone> IntoIterator for &'a StrTable<'k, V, H, A> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, 'k, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
