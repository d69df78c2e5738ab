//! Offset pagination over already filtered collections.

use serde::Serialize;
use tracing::debug;

/// Default page size when browsing the catalog.
pub const DEFAULT_CATALOG_PAGE_SIZE: usize = 18;
/// Default page size when browsing a personal list.
pub const DEFAULT_LIST_PAGE_SIZE: usize = 9;

/// Zero-based page index plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub index: usize,
    /// Items per page. Zero is treated as one by [`paginate`].
    pub size: usize,
}

impl PageRequest {
    /// Build a request from caller-supplied values.
    ///
    /// Negative indices are clamped to the first page and sizes below one
    /// are raised to one; there is no upper bound on either.
    pub fn new(index: i64, size: i64) -> Self {
        if index < 0 {
            debug!(index, "negative page index clamped to 0");
        }
        let index = usize::try_from(index).unwrap_or(0);
        let size = usize::try_from(size).unwrap_or(0).max(1);
        Self { index, size }
    }

    /// First page of the given size.
    pub fn first(size: usize) -> Self {
        Self {
            index: 0,
            size: size.max(1),
        }
    }

    /// The following page.
    pub fn next(self) -> Self {
        Self {
            index: self.index.saturating_add(1),
            ..self
        }
    }

    /// The preceding page, staying on the first one.
    pub fn previous(self) -> Self {
        Self {
            index: self.index.saturating_sub(1),
            ..self
        }
    }
}

/// One page of results plus navigation flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page, possibly empty.
    pub items: Vec<T>,
    /// More items exist after this page.
    pub has_next: bool,
    /// This is not the first page.
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Empty first page.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_next: false,
            has_previous: false,
        }
    }

    /// Transform the items while keeping the navigation flags.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Slice one page out of `items`.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let len = items.len();
    let size = request.size.max(1);
    let start = request.index.saturating_mul(size);
    let end = start.saturating_add(size).min(len);

    let page = if start >= len {
        Vec::new()
    } else {
        items[start..end].to_vec()
    };

    Page {
        items: page,
        has_next: end < len,
        has_previous: request.index > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(len: usize) -> Vec<usize> {
        (0..len).collect()
    }

    #[test]
    fn second_partial_page() {
        let items = numbers(23);
        let page = paginate(&items, PageRequest::new(1, 18));
        assert_eq!(page.items, (18..23).collect::<Vec<_>>());
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn first_page_has_next() {
        let items = numbers(23);
        let page = paginate(&items, PageRequest::first(18));
        assert_eq!(page.items.len(), 18);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn exact_multiple_has_no_next() {
        let items = numbers(18);
        let page = paginate(&items, PageRequest::new(1, 9));
        assert_eq!(page.items.len(), 9);
        assert!(!page.has_next);
    }

    #[test]
    fn past_the_end_is_empty() {
        let items = numbers(5);
        let page = paginate(&items, PageRequest::new(3, 9));
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(page.has_previous);

        let page = paginate(&items, PageRequest::new(i64::MAX, i64::MAX));
        assert!(page.items.is_empty());
    }

    #[test]
    fn negative_index_clamps_to_first_page() {
        let items = numbers(5);
        let page = paginate(&items, PageRequest::new(-2, 2));
        assert_eq!(page.items, vec![0, 1]);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn zero_size_is_raised_to_one() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.size, 1);
    }

    #[test]
    fn hand_built_zero_size_pages_one_at_a_time() {
        let items = numbers(3);
        let first = paginate(&items, PageRequest { index: 0, size: 0 });
        assert_eq!(first.items, [0]);
        assert!(first.has_next);

        let last = paginate(&items, PageRequest { index: 2, size: 0 });
        assert_eq!(last.items, [2]);
        assert!(!last.has_next);
        assert!(last.has_previous);
    }

    #[test]
    fn length_matches_bounds_formula() {
        for len in 0..30usize {
            for size in 1..7usize {
                for index in 0..8usize {
                    let items = numbers(len);
                    let page = paginate(&items, PageRequest { index, size });
                    let start = index * size;
                    let expected = if start < len { size.min(len - start) } else { 0 };
                    assert_eq!(page.items.len(), expected);
                    assert_eq!(page.has_next, start + page.items.len() < len);
                    assert_eq!(page.has_previous, index > 0);
                }
            }
        }
    }

    #[test]
    fn oversized_page_holds_everything() {
        let items = numbers(4);
        let page = paginate(&items, PageRequest::first(100));
        assert_eq!(page.items.len(), 4);
        assert!(!page.has_next);
    }
}
