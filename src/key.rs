//! Key intake: what can be passed as a key, and when the table makes its
//! own copy.
//!
//! Keys reach the table in one of two ways. Ordinary entry points take an
//! [`IntoKey`] whose borrow only has to last for the call: owned keys are
//! moved in, borrowed ones are copied. The `*_borrowed` entry points take a
//! reference that lives as long as the table (`'k`) and, under
//! `NO_KEY_COPY`, store it without copying.

use crate::error::AllocError;
use crate::flags::TableFlags;
use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::Vec as AllocVec;
use core::fmt;
use core::ops::Deref;
use std::borrow::Cow;

/// Conversion into key bytes accepted by insert-like operations.
///
/// `'q` is only the lifetime of the call. Owned forms (`String`,
/// `Vec<u8>`) are moved into the table and never copied again; borrowed
/// forms are copied.
pub trait IntoKey<'q> {
    fn into_key(self) -> Cow<'q, [u8]>;
}

impl<'q> IntoKey<'q> for &'q [u8] {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<'q, const N: usize> IntoKey<'q> for &'q [u8; N] {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Borrowed(&self[..])
    }
}

impl<'q> IntoKey<'q> for &'q str {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl<'q> IntoKey<'q> for &'q String {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Borrowed(self.as_bytes())
    }
}

impl<'q> IntoKey<'q> for Vec<u8> {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Owned(self)
    }
}

impl<'q> IntoKey<'q> for String {
    fn into_key(self) -> Cow<'q, [u8]> {
        Cow::Owned(self.into_bytes())
    }
}

impl<'q> IntoKey<'q> for Cow<'q, [u8]> {
    fn into_key(self) -> Cow<'q, [u8]> {
        self
    }
}

/// A key on its way into the table.
pub(crate) enum KeyArg<'q, 'k> {
    /// Borrowed for the call only, or owned.
    Transient(Cow<'q, [u8]>),
    /// Borrowed for the table's whole lifetime.
    Lasting(&'k [u8]),
}

impl<'q, 'k> KeyArg<'q, 'k> {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            KeyArg::Transient(k) => &k[..],
            KeyArg::Lasting(k) => *k,
        }
    }

    /// Applies the key-copy rule. Owned keys are moved, call-scoped borrows
    /// are copied, and lasting borrows are kept verbatim only under
    /// `NO_KEY_COPY`. Copies come from `alloc`.
    pub(crate) fn adopt<A>(self, flags: TableFlags, alloc: &A) -> Result<StoredKey<'k, A>, AllocError>
    where
        A: Allocator + Clone,
    {
        match self {
            KeyArg::Transient(Cow::Owned(v)) => Ok(StoredKey::Moved(v)),
            KeyArg::Transient(Cow::Borrowed(b)) => copy_in(b, alloc).map(StoredKey::Copied),
            KeyArg::Lasting(b) if flags.contains(TableFlags::NO_KEY_COPY) => {
                Ok(StoredKey::Borrowed(b))
            }
            KeyArg::Lasting(b) => copy_in(b, alloc).map(StoredKey::Copied),
        }
    }
}

/// Key bytes as the table holds them.
pub(crate) enum StoredKey<'k, A: Allocator = Global> {
    /// The caller's bytes, kept verbatim under `NO_KEY_COPY`.
    Borrowed(&'k [u8]),
    /// An owned key the caller handed over.
    Moved(Vec<u8>),
    /// The table's own copy, allocated from the table's allocator.
    Copied(AllocVec<u8, A>),
}

impl<A: Allocator> StoredKey<'_, A> {
    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            StoredKey::Borrowed(b) => *b,
            StoredKey::Moved(v) => &v[..],
            StoredKey::Copied(v) => &v[..],
        }
    }
}

impl<A: Allocator> Deref for StoredKey<'_, A> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<A: Allocator> fmt::Debug for StoredKey<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

/// Independent copy of a stored key for a duplicated table. Borrowed keys
/// stay borrowed: the caller already vouched for their lifetime.
pub(crate) fn duplicate_key<'k, A>(key: &StoredKey<'k, A>, alloc: &A) -> Result<StoredKey<'k, A>, AllocError>
where
    A: Allocator + Clone,
{
    match key {
        StoredKey::Borrowed(b) => Ok(StoredKey::Borrowed(*b)),
        other => copy_in(other.as_bytes(), alloc).map(StoredKey::Copied),
    }
}

fn copy_in<A: Allocator + Clone>(b: &[u8], alloc: &A) -> Result<AllocVec<u8, A>, AllocError> {
    let mut v = AllocVec::new_in(alloc.clone());
    v.try_reserve_exact(b.len()).map_err(|_| AllocError)?;
    v.extend_from_slice(b);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_copied(k: &StoredKey<'_>) -> bool {
        matches!(k, StoredKey::Copied(_))
    }

    #[test]
    fn call_scoped_borrow_is_always_copied() {
        let s = String::from("abc");
        for flags in [TableFlags::NONE, TableFlags::NO_KEY_COPY] {
            let k = KeyArg::Transient(s.as_str().into_key()).adopt(flags, &Global).unwrap();
            assert!(is_copied(&k));
            assert_eq!(&*k, b"abc");
            assert_ne!(k.as_ptr(), s.as_ptr());
        }
    }

    #[test]
    fn lasting_borrow_kept_verbatim_only_without_copy() {
        let s = String::from("abc");
        let k = KeyArg::Lasting(s.as_bytes()).adopt(TableFlags::NO_KEY_COPY, &Global).unwrap();
        match k {
            StoredKey::Borrowed(b) => assert!(core::ptr::eq(b.as_ptr(), s.as_ptr())),
            _ => panic!("key must not be copied"),
        }
        let k = KeyArg::Lasting(s.as_bytes()).adopt(TableFlags::NONE, &Global).unwrap();
        assert!(is_copied(&k));
    }

    #[test]
    fn owned_key_is_moved_not_copied() {
        let v = b"xyz".to_vec();
        let ptr = v.as_ptr();
        let k = KeyArg::Transient(v.into_key()).adopt(TableFlags::NONE, &Global).unwrap();
        assert!(matches!(k, StoredKey::Moved(_)));
        assert_eq!(k.as_ptr(), ptr);
    }

    #[test]
    fn duplicate_copies_owned_and_shares_borrowed() {
        let owned: StoredKey<'static> = StoredKey::Moved(b"own".to_vec());
        let d = duplicate_key(&owned, &Global).unwrap();
        assert_eq!(&*d, &*owned);
        assert_ne!(d.as_ptr(), owned.as_ptr());

        let borrowed: StoredKey<'static> = StoredKey::Borrowed(b"bor");
        let d = duplicate_key(&borrowed, &Global).unwrap();
        assert_eq!(d.as_ptr(), borrowed.as_ptr());
    }

    #[test]
    fn empty_key_accepted() {
        let k = KeyArg::Transient("".into_key()).adopt(TableFlags::NONE, &Global).unwrap();
        assert!(k.is_empty());
        assert_eq!(format!("{:?}", k), "\"\"");
    }
}
