//! Lookahead pagination stitching.
//!
//! Paginated plans fetch one row past the requested page size. When the
//! extra row arrives it is removed from the page and its cursor becomes
//! the cursor of the next page; otherwise the page is the last one.

/// Splits a fetched window into the page and the next-page cursor.
///
/// `items` must hold at most `page_size + 1` entries, the way the
/// windowed plans produce them.
pub(crate) fn split_lookahead<T, C>(
    mut items: Vec<T>,
    page_size: usize,
    cursor_of: impl FnOnce(&T) -> C,
) -> (Vec<T>, Option<C>) {
    if items.len() > page_size {
        let next = items.pop().map(|last| cursor_of(&last));
        (items, next)
    } else {
        (items, None)
    }
}
