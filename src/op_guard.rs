//! Debug-only detection of nested mutation.
//!
//! The table runs user code (a custom digest) in the middle of its
//! mutating operations. Safe Rust cannot reach the table from there, but a
//! digest holding a raw pointer could. Each mutator records its name in an
//! `OpGuard` for the duration of the call; a second entry while one is
//! recorded panics and names both operations. Release builds carry no
//! state and do nothing.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct OpGuard {
    #[cfg(debug_assertions)]
    running: Cell<Option<&'static str>>,
    // Single-threaded by construction.
    _nosend: PhantomData<*mut ()>,
}

impl OpGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            running: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Marks `op` as running until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> OpToken<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.running.get() {
                panic!("`{op}` entered while `{outer}` is still running on the same table");
            }
            self.running.set(Some(op));
            return OpToken { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return OpToken { _z: PhantomData };
        }
    }
}

impl Default for OpGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct OpToken<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for OpToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.running.get().is_some());
            self.owner.running.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpGuard;

    #[test]
    fn sequential_entries_are_fine() {
        let g = OpGuard::new();
        {
            let _t = g.enter("insert");
        }
        let _t = g.enter("remove");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_with_both_names() {
        let g = OpGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter("insert");
            let _inner = g.enter("remove");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("`remove`"), "{msg}");
        assert!(msg.contains("`insert`"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let g = OpGuard::new();
        let _a = g.enter("insert");
        let _b = g.enter("remove");
    }
}
