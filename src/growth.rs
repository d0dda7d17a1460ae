//! Growth policy for tables created with `AUTO_REHASH`.

/// Load factor above which the table grows: 4/5 = 0.8.
const LOAD_NUM: usize = 4;
const LOAD_DEN: usize = 5;

/// True once `items / size` exceeds 0.8.
#[inline]
pub(crate) fn over_threshold(items: usize, size: usize) -> bool {
    // items / size > 4 / 5  <=>  items * 5 > size * 4, in u128 to stay exact.
    (items as u128) * (LOAD_DEN as u128) > (size as u128) * (LOAD_NUM as u128)
}

/// Bucket count after one growth step, or `None` when already at the limit.
#[inline]
pub(crate) fn grown_size(size: usize) -> Option<usize> {
    size.checked_mul(2)
}
