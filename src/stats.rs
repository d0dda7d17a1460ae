//! Chain-length statistics for tuning capacity and digests.

use crate::digest::Digest;
use crate::str_table::StrTable;
use allocator_api2::alloc::Allocator;
use core::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct TableStats {
    /// Bucket count.
    pub size: usize,
    /// Entry count.
    pub items: usize,
    /// Buckets with at least one entry.
    pub used_buckets: usize,
    pub longest_chain: usize,
    pub load_factor: f64,
}

impl TableStats {
    /// Mean chain length over non-empty buckets.
    pub fn mean_chain(&self) -> f64 {
        if self.used_buckets == 0 {
            0.0
        } else {
            self.items as f64 / self.used_buckets as f64
        }
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items in {}/{} buckets, load {:.2}, longest chain {}, mean chain {:.2}",
            self.items,
            self.used_buckets,
            self.size,
            self.load_factor,
            self.longest_chain,
            self.mean_chain()
        )
    }
}

impl<'k, V, H: Digest, A: Allocator + Clone> StrTable<'k, V, H, A> {
    pub fn stats(&self) -> TableStats {
        let mut used_buckets = 0;
        let mut longest_chain = 0;
        for slot in 0..self.store.size() {
            let len = self.store.chain(slot).count();
            if len > 0 {
                used_buckets += 1;
                longest_chain = longest_chain.max(len);
            }
        }
        TableStats {
            size: self.size(),
            items: self.len(),
            used_buckets,
            longest_chain,
            load_factor: self.load_factor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::StrTable;

    #[test]
    fn empty_table() {
        let t: StrTable<'_, ()> = StrTable::new(4).unwrap();
        let s = t.stats();
        assert_eq!(s.size, 4);
        assert_eq!(s.items, 0);
        assert_eq!(s.used_buckets, 0);
        assert_eq!(s.longest_chain, 0);
        assert_eq!(s.mean_chain(), 0.0);
    }

    #[test]
    fn counts_chains() {
        let mut t: StrTable<'_, (), _> = StrTable::builder(4)
            .digest_fn(|k: &[u8]| k.len() as u32)
            .build()
            .unwrap();
        // Lengths 1, 1, 2 and 5: buckets 1, 1, 2, 1.
        for k in ["a", "b", "cd", "efghi"] {
            t.insert(k, ()).unwrap();
        }
        let s = t.stats();
        assert_eq!(s.items, 4);
        assert_eq!(s.used_buckets, 2);
        assert_eq!(s.longest_chain, 3);
        assert_eq!(s.mean_chain(), 2.0);
        assert_eq!(
            s.to_string(),
            "4 items in 2/4 buckets, load 1.00, longest chain 3, mean chain 2.00"
        );
    }
}
