//! StrTable: the table engine. Insert/replace/get/remove over the bucket
//! store, the duplicate-key policy, and the value disposal rules.

use crate::bucket_store::BucketStore;
use crate::builder::TableBuilder;
use crate::digest::{Digest, Prehashed, XorShift};
use crate::error::{AllocError, InsertError};
use crate::flags::TableFlags;
use crate::growth;
use crate::key::{IntoKey, KeyArg};
use crate::op_guard::OpGuard;
use allocator_api2::alloc::{Allocator, Global};
use core::fmt;
use std::rc::Rc;

/// Disposal hook for values the table discards on replace, clear and drop.
pub type FreeFn<V> = Rc<dyn Fn(V)>;

/// Chained hash table keyed by byte strings.
///
/// `'k` is the lifetime of keys stored without copying (see
/// [`insert_borrowed`](Self::insert_borrowed) and
/// [`TableFlags::NO_KEY_COPY`]); tables that never take such keys can
/// leave it unconstrained. `A` allocates the bucket array and the table's
/// key copies.
pub struct StrTable<'k, V, H = XorShift, A: Allocator = Global> {
    pub(crate) store: BucketStore<'k, V, A>,
    pub(crate) flags: TableFlags,
    pub(crate) free_fn: Option<FreeFn<V>>,
    pub(crate) digest: H,
    pub(crate) guard: OpGuard,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Put {
    Insert,
    Replace,
}

impl<'k, V> StrTable<'k, V> {
    /// Table with `capacity` buckets, the default digest and no free function.
    pub fn new(capacity: usize) -> Result<Self, AllocError> {
        TableBuilder::new(capacity).build()
    }

    /// Table whose discarded values are passed to `free_fn`.
    pub fn with_free_fn<F>(capacity: usize, free_fn: F) -> Result<Self, AllocError>
    where
        F: Fn(V) + 'static,
    {
        TableBuilder::new(capacity).free_fn(free_fn).build()
    }

    pub fn builder(capacity: usize) -> TableBuilder<V> {
        TableBuilder::new(capacity)
    }
}

impl<'k, V, H: Digest, A: Allocator + Clone> StrTable<'k, V, H, A> {
    pub(crate) fn from_parts(
        store: BucketStore<'k, V, A>,
        flags: TableFlags,
        free_fn: Option<FreeFn<V>>,
        digest: H,
    ) -> Self {
        Self {
            store,
            flags,
            free_fn,
            digest,
            guard: OpGuard::new(),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Current number of buckets.
    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn load_factor(&self) -> f64 {
        self.store.len() as f64 / self.store.size() as f64
    }

    pub fn flags(&self) -> TableFlags {
        self.flags
    }

    /// Changes the behavior flags. Only operations issued afterwards are
    /// affected; stored entries are left as they are.
    pub fn set_flags(&mut self, flags: TableFlags) {
        self.flags = flags;
    }

    pub fn has_free_fn(&self) -> bool {
        self.free_fn.is_some()
    }

    pub fn digest_fn(&self) -> &H {
        &self.digest
    }

    pub fn allocator(&self) -> &A {
        self.store.allocator()
    }

    /// Computes `key`'s length and digest once, for later `*_prehashed` calls.
    pub fn prehash<Q>(&self, key: &Q) -> Prehashed
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        Prehashed::compute(&self.digest, key.as_ref())
    }

    /// Adds `key` -> `value`.
    ///
    /// Fails with [`InsertError::DuplicateKey`] if the key is present,
    /// unless the table has [`TableFlags::NO_DUPLICATE_CHECK`], in which
    /// case the new entry shadows the old one. With
    /// [`TableFlags::AUTO_REHASH`] the table may grow before returning.
    ///
    /// An owned key is moved into the table; a borrowed one is copied, so
    /// it only has to live for the call.
    pub fn insert<'q, K>(&mut self, key: K, value: V) -> Result<(), InsertError>
    where
        K: IntoKey<'q>,
    {
        self.put("insert", KeyArg::Transient(key.into_key()), None, value, Put::Insert)
    }

    /// Like [`insert`](Self::insert), but sets the value of an existing key.
    ///
    /// The superseded value goes to the free function; replacing an
    /// existing key in a table without one fails with
    /// [`InsertError::MissingFreeFn`]. The stored key is left untouched.
    pub fn replace<'q, K>(&mut self, key: K, value: V) -> Result<(), InsertError>
    where
        K: IntoKey<'q>,
    {
        self.put("replace", KeyArg::Transient(key.into_key()), None, value, Put::Replace)
    }

    /// [`insert`](Self::insert) for a key that outlives the table. Under
    /// [`TableFlags::NO_KEY_COPY`] the table stores this very slice and
    /// allocates nothing for it; otherwise it is copied like any other key.
    pub fn insert_borrowed<Q>(&mut self, key: &'k Q, value: V) -> Result<(), InsertError>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.put("insert_borrowed", KeyArg::Lasting(key.as_ref()), None, value, Put::Insert)
    }

    /// [`replace`](Self::replace) counterpart of
    /// [`insert_borrowed`](Self::insert_borrowed).
    pub fn replace_borrowed<Q>(&mut self, key: &'k Q, value: V) -> Result<(), InsertError>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.put("replace_borrowed", KeyArg::Lasting(key.as_ref()), None, value, Put::Replace)
    }

    /// [`insert`](Self::insert) with a digest obtained from
    /// [`prehash`](Self::prehash) on the same key.
    pub fn insert_prehashed<'q, K>(&mut self, key: K, pre: Prehashed, value: V) -> Result<(), InsertError>
    where
        K: IntoKey<'q>,
    {
        let key = KeyArg::Transient(key.into_key());
        debug_assert!(pre.fits(key.bytes()), "prehashed digest belongs to a different key");
        self.put("insert_prehashed", key, Some(pre.hash()), value, Put::Insert)
    }

    fn put<'q>(
        &mut self,
        op: &'static str,
        key: KeyArg<'q, 'k>,
        hash: Option<u32>,
        value: V,
        mode: Put,
    ) -> Result<(), InsertError> {
        let superseded = {
            let _g = self.guard.enter(op);
            let hash = match hash {
                Some(h) => h,
                None => self.digest.digest(key.bytes()),
            };
            Self::put_in(
                &mut self.store,
                self.flags,
                self.free_fn.is_some(),
                key,
                hash,
                value,
                mode,
            )?
        };
        // The structure is consistent again before user code runs.
        if let (Some(old), Some(free)) = (superseded, &self.free_fn) {
            free(old);
        }
        Ok(())
    }

    /// Returns the superseded value when an existing entry was replaced.
    fn put_in<'q>(
        store: &mut BucketStore<'k, V, A>,
        flags: TableFlags,
        has_free_fn: bool,
        key: KeyArg<'q, 'k>,
        hash: u32,
        value: V,
        mode: Put,
    ) -> Result<Option<V>, InsertError> {
        if mode == Put::Replace || !flags.contains(TableFlags::NO_DUPLICATE_CHECK) {
            if let Some(node) = store.find(hash, key.bytes()).and_then(|k| store.node_mut(k)) {
                return match mode {
                    Put::Insert => Err(InsertError::DuplicateKey),
                    Put::Replace if !has_free_fn => Err(InsertError::MissingFreeFn),
                    Put::Replace => Ok(Some(core::mem::replace(&mut node.value, value))),
                };
            }
        }

        // Both allocations happen before anything is linked.
        store.reserve_node()?;
        let key = key.adopt(flags, store.allocator())?;
        store.push_front(key, hash, value);

        if flags.contains(TableFlags::AUTO_REHASH) && growth::over_threshold(store.len(), store.size()) {
            Self::grow(store);
        }
        Ok(None)
    }

    fn grow(store: &mut BucketStore<'k, V, A>) {
        let old = store.size();
        let Some(new) = growth::grown_size(old) else {
            log::warn!("table cannot grow past {} buckets", old);
            return;
        };
        match store.rehash(new) {
            Ok(()) => log::debug!(
                "rehashed {} entries from {} to {} buckets",
                store.len(),
                old,
                new
            ),
            Err(AllocError) => log::warn!(
                "rehash to {} buckets failed to allocate; keeping {} buckets",
                new,
                old
            ),
        }
    }

    /// Value of the most recently inserted entry for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        self.get_hashed(self.digest.digest(key), key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        let hash = self.digest.digest(key);
        let k = self.store.find(hash, key)?;
        self.store.node_mut(k).map(|n| &mut n.value)
    }

    /// [`get`](Self::get) without re-hashing `key`.
    pub fn get_prehashed<Q>(&self, key: &Q, pre: Prehashed) -> Option<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        debug_assert!(pre.fits(key), "prehashed digest belongs to a different key");
        self.get_hashed(pre.hash(), key)
    }

    fn get_hashed(&self, hash: u32, key: &[u8]) -> Option<&V> {
        let k = self.store.find(hash, key)?;
        self.store.node(k).map(|n| &n.value)
    }

    /// Stored key and value for `key`. The returned key is the table's
    /// own copy (or the caller's original under `NO_KEY_COPY`).
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&[u8], &V)>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        let k = self.store.find(self.digest.digest(key), key)?;
        self.store.node(k).map(|n| (n.key.as_bytes(), &n.value))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        self.store.find(self.digest.digest(key), key).is_some()
    }

    /// [`contains_key`](Self::contains_key) without re-hashing `key`.
    pub fn contains_prehashed<Q>(&self, key: &Q, pre: Prehashed) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        debug_assert!(pre.fits(key), "prehashed digest belongs to a different key");
        self.store.find(pre.hash(), key).is_some()
    }

    /// Unlinks the most recently inserted entry for `key` and gives its
    /// value back. The free function is not called; the value is the
    /// caller's again.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let key = key.as_ref();
        let _g = self.guard.enter("remove");
        let hash = self.digest.digest(key);
        self.store.unlink(hash, key).map(|n| n.value)
    }

    /// Removes every entry, passing each value to the free function if
    /// there is one. The bucket count is kept.
    pub fn clear(&mut self) {
        let released: Vec<V> = {
            let _g = self.guard.enter("clear");
            self.store.drain().map(|n| n.value).collect()
        };
        log::trace!("cleared {} entries", released.len());
        if let Some(free) = &self.free_fn {
            released.into_iter().for_each(|v| free(v));
        }
    }

    /// Tears the table down, passing every remaining value to the free
    /// function. Same as dropping it.
    pub fn destroy(self) {
        drop(self)
    }
}

impl<'k, V, H, A: Allocator> Drop for StrTable<'k, V, H, A> {
    fn drop(&mut self) {
        if let Some(free) = self.free_fn.take() {
            for n in self.store.drain() {
                free(n.value);
            }
        }
    }
}

impl<'k, V: fmt::Debug, H: Digest, A: Allocator + Clone> fmt::Debug for StrTable<'k, V, H, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k), v)))
            .finish()
    }
}
