use std::fmt;
use std::slice::Chunks;

/// A contiguous run of items. Displays its items back to back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a, T> {
    items: &'a [T],
}

impl<'a, T> Page<'a, T> {
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: fmt::Display> fmt::Display for Page<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.items.iter().try_for_each(|item| write!(f, "{item}"))
    }
}

/// Splits a slice of results into pages of `page_size` items; the last page may be shorter.
#[derive(Debug, Clone)]
pub struct Paginator<'a, T> {
    pages: Chunks<'a, T>,
}

impl<'a, T> Paginator<'a, T> {
    /// A `page_size` of zero puts everything on one page.
    pub fn new(items: &'a [T], page_size: usize) -> Self {
        let page_size = if page_size == 0 { items.len().max(1) } else { page_size };
        Self { pages: items.chunks(page_size) }
    }
}

impl<'a, T> Iterator for Paginator<'a, T> {
    type Item = Page<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pages.next().map(|items| Page { items })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pages.size_hint()
    }
}

impl<T> ExactSizeIterator for Paginator<'_, T> {}

pub fn paginate<T>(items: &[T], page_size: usize) -> Paginator<'_, T> {
    Paginator::new(items, page_size)
}
