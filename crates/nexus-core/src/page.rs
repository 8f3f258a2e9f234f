//! Fixed-size, 1-indexed pagination.

/// Page size of the primary directory view.
pub const PAGE_SIZE: usize = 12;

/// The `page`-th slice of `items` (1-indexed). Pages past the end, and page
/// 0, are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
  if page == 0 || page_size == 0 {
    return &[];
  }
  let start = (page - 1).saturating_mul(page_size);
  if start >= items.len() {
    return &[];
  }
  let end = start.saturating_add(page_size).min(items.len());
  &items[start..end]
}

/// Number of pages needed for `len` items; at least 1 so an empty list still
/// renders as "page 1 of 1".
pub fn page_count(len: usize, page_size: usize) -> usize {
  if page_size == 0 {
    return 1;
  }
  len.div_ceil(page_size).max(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn thirty_items_in_pages_of_twelve() {
    let items: Vec<u32> = (0..30).collect();
    assert_eq!(paginate(&items, 12, 1).len(), 12);
    assert_eq!(paginate(&items, 12, 2)[0], 12);
    assert_eq!(paginate(&items, 12, 3), &items[24..]);
    assert_eq!(paginate(&items, 12, 3).len(), 6);
    assert!(paginate(&items, 12, 4).is_empty());
    assert!(paginate(&items, 12, 0).is_empty());
    assert!(paginate(&items, 12, usize::MAX).is_empty());
  }

  #[test]
  fn page_counts() {
    assert_eq!(page_count(30, PAGE_SIZE), 3);
    assert_eq!(page_count(24, PAGE_SIZE), 2);
    assert_eq!(page_count(0, PAGE_SIZE), 1);
  }
}
