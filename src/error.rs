//! Error types. Not-found is never an error: lookups and removal report it
//! with `None`.

use std::collections::TryReserveError;
use thiserror::Error;

/// An allocation the table needed could not be satisfied. The table that
/// reported it is unchanged.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
#[error("memory allocation failed")]
pub struct AllocError;

impl From<TryReserveError> for AllocError {
    fn from(_: TryReserveError) -> Self {
        AllocError
    }
}

#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertError {
    /// `insert` found the key already present and duplicates are not allowed.
    #[error("key already in table")]
    DuplicateKey,
    /// `replace` found the key but the table has no free-function to
    /// dispose of the superseded value.
    #[error("cannot replace a value: table has no free function")]
    MissingFreeFn,
    /// The key copy or the new entry could not be allocated.
    #[error("out of memory while storing entry")]
    OutOfMemory,
}

impl From<AllocError> for InsertError {
    fn from(_: AllocError) -> Self {
        InsertError::OutOfMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_error_converts_to_out_of_memory() {
        let e: InsertError = AllocError.into();
        assert_eq!(e, InsertError::OutOfMemory);
    }

    #[test]
    fn try_reserve_failure_maps_to_alloc_error() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(AllocError::from(err), AllocError);
    }

    #[test]
    fn messages() {
        assert_eq!(InsertError::DuplicateKey.to_string(), "key already in table");
        assert!(InsertError::MissingFreeFn.to_string().contains("free function"));
        assert_eq!(AllocError.to_string(), "memory allocation failed");
        let boxed: Box<dyn std::error::Error> = Box::new(InsertError::OutOfMemory);
        assert!(boxed.to_string().contains("out of memory"));
    }
}
