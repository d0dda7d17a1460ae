//! BucketStore: fixed-size array of singly-linked collision chains.
//!
//! Chain nodes live in a `SlotMap` arena and link to each other by arena
//! key, so unlinking or relinking a node never moves or frees its key and
//! value behind anyone's back. Each node stores the raw digest of its key;
//! the bucket index is always `hash % size`, recomputed from the stored
//! digest after a resize, so user digest code never runs here.
//!
//! The bucket array and key copies come from the table's allocator `A`.
//! The node arena uses the global allocator; `SlotMap` takes no allocator
//! parameter. Every allocation is reserved fallibly before anything is
//! linked.

use crate::error::AllocError;
use crate::key::StoredKey;
use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::Vec as AllocVec;
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
pub(crate) struct Node<'k, V, A: Allocator = Global> {
    pub(crate) key: StoredKey<'k, A>,
    pub(crate) hash: u32,
    pub(crate) value: V,
    next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) struct BucketStore<'k, V, A: Allocator = Global> {
    heads: AllocVec<Option<DefaultKey>, A>,
    nodes: SlotMap<DefaultKey, Node<'k, V, A>>,
}

fn empty_heads<A: Allocator>(size: usize, alloc: A) -> Result<AllocVec<Option<DefaultKey>, A>, AllocError> {
    let mut heads = AllocVec::new_in(alloc);
    heads.try_reserve_exact(size).map_err(|_| AllocError)?;
    heads.resize(size, None);
    Ok(heads)
}

impl<'k, V, A: Allocator + Clone> BucketStore<'k, V, A> {
    pub(crate) fn with_buckets(size: usize, node_capacity: usize, alloc: A) -> Result<Self, AllocError> {
        debug_assert!(size > 0, "bucket array must not be empty");
        let heads = empty_heads(size, alloc)?;
        let mut nodes: SlotMap<DefaultKey, Node<'k, V, A>> = SlotMap::with_key();
        nodes.try_reserve(node_capacity)?;
        Ok(Self { heads, nodes })
    }

    /// Rebuilds the bucket array with `new_size` buckets and relinks every
    /// node into it. Nodes are moved, never copied. The relative order of
    /// nodes that shared a chain is kept, so the newest of several equal
    /// keys stays in front. On allocation failure nothing has changed.
    pub(crate) fn rehash(&mut self, new_size: usize) -> Result<(), AllocError> {
        debug_assert!(new_size > 0);
        let mut heads = empty_heads(new_size, self.allocator().clone())?;
        let mut tails = empty_heads(new_size, self.allocator().clone())?;

        for slot in 0..self.heads.len() {
            let mut cur = self.heads[slot];
            while let Some(k) = cur {
                let Some(n) = self.nodes.get_mut(k) else {
                    break;
                };
                cur = n.next.take();
                let to = n.hash as usize % new_size;
                match tails[to] {
                    None => heads[to] = Some(k),
                    Some(t) => {
                        if let Some(tail) = self.nodes.get_mut(t) {
                            tail.next = Some(k);
                        }
                    }
                }
                tails[to] = Some(k);
            }
        }

        self.heads = heads;
        Ok(())
    }
}

impl<'k, V, A: Allocator> BucketStore<'k, V, A> {
    pub(crate) fn allocator(&self) -> &A {
        self.heads.allocator()
    }

    /// Number of buckets.
    pub(crate) fn size(&self) -> usize {
        self.heads.len()
    }

    /// Number of live nodes across all chains.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn slot(&self, hash: u32) -> usize {
        hash as usize % self.heads.len()
    }

    /// First node in `hash`'s chain whose key equals `key`.
    pub(crate) fn find(&self, hash: u32, key: &[u8]) -> Option<DefaultKey> {
        let mut cur = self.heads[self.slot(hash)];
        while let Some(k) = cur {
            let n = self.nodes.get(k)?;
            if n.hash == hash && n.key.as_bytes() == key {
                return Some(k);
            }
            cur = n.next;
        }
        None
    }

    pub(crate) fn node(&self, k: DefaultKey) -> Option<&Node<'k, V, A>> {
        self.nodes.get(k)
    }

    pub(crate) fn node_mut(&mut self, k: DefaultKey) -> Option<&mut Node<'k, V, A>> {
        self.nodes.get_mut(k)
    }

    /// Makes room for one more node, so the next `push_front` cannot fail.
    pub(crate) fn reserve_node(&mut self) -> Result<(), AllocError> {
        Ok(self.nodes.try_reserve(1)?)
    }

    /// Links a new node at the head of its chain.
    pub(crate) fn push_front(&mut self, key: StoredKey<'k, A>, hash: u32, value: V) -> DefaultKey {
        let slot = self.slot(hash);
        let next = self.heads[slot];
        let k = self.nodes.insert(Node {
            key,
            hash,
            value,
            next,
        });
        self.heads[slot] = Some(k);
        k
    }

    /// Unlinks the first node matching `key` and hands it back.
    pub(crate) fn unlink(&mut self, hash: u32, key: &[u8]) -> Option<Node<'k, V, A>> {
        let slot = self.slot(hash);
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.heads[slot];
        while let Some(k) = cur {
            let n = self.nodes.get(k)?;
            if n.hash == hash && n.key.as_bytes() == key {
                let next = n.next;
                match prev {
                    None => self.heads[slot] = next,
                    Some(p) => self.nodes.get_mut(p)?.next = next,
                }
                return self.nodes.remove(k);
            }
            prev = cur;
            cur = n.next;
        }
        None
    }

    /// Empties every chain and yields the released nodes. Bucket count is kept.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Node<'k, V, A>> + '_ {
        self.heads.fill(None);
        self.nodes.drain().map(|(_, n)| n)
    }

    /// Nodes of one bucket, head first.
    pub(crate) fn chain(&self, slot: usize) -> Chain<'_, 'k, V, A> {
        Chain {
            store: self,
            cur: self.heads[slot],
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, 'k, V, A> {
        Iter {
            store: self,
            slot: 0,
            cur: None,
            remaining: self.nodes.len(),
        }
    }

    /// Mutable access to every value, in arena order.
    pub(crate) fn values_mut(&mut self) -> IterMut<'_, 'k, V, A> {
        IterMut {
            it: self.nodes.values_mut(),
        }
    }
}

pub(crate) struct Chain<'a, 'k, V, A: Allocator> {
    store: &'a BucketStore<'k, V, A>,
    cur: Option<DefaultKey>,
}

impl<'a, 'k, V, A: Allocator> Iterator for Chain<'a, 'k, V, A> {
    type Item = &'a Node<'k, V, A>;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.store.nodes.get(self.cur?)?;
        self.cur = n.next;
        Some(n)
    }
}

/// Every node, bucket by bucket, each chain head first.
pub struct Iter<'a, 'k, V, A: Allocator = Global> {
    store: &'a BucketStore<'k, V, A>,
    slot: usize,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, 'k, V, A: Allocator> Iterator for Iter<'a, 'k, V, A> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let n = self.store.nodes.get(k)?;
                self.cur = n.next;
                self.remaining -= 1;
                return Some((n.key.as_bytes(), &n.value));
            }
            if self.slot >= self.store.heads.len() {
                return None;
            }
            self.cur = self.store.heads[self.slot];
            self.slot += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, A: Allocator> ExactSizeIterator for Iter<'_, '_, V, A> {}

/// Every key with mutable access to its value, in arena order.
pub struct IterMut<'a, 'k, V, A: Allocator = Global> {
    it: slotmap::basic::ValuesMut<'a, DefaultKey, Node<'k, V, A>>,
}

impl<'a, 'k, V, A: Allocator> Iterator for IterMut<'a, 'k, V, A> {
    type Item = (&'a [u8], &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|n| (n.key.as_bytes(), &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
