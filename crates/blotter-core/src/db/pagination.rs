use serde::Serialize;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of a listing plus enough metadata to build navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub data: Vec<T>,
}

impl<T> Pagination<T> {
    /// Create an empty page request. `page < 1` becomes 1 and a zero
    /// `page_size` falls back to [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: if page < 1 { 1 } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
            total: 0,
            data: Vec::new(),
        }
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }

    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size as u64)
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page as u64) < self.total_pages()
    }

    /// Replace the page contents, keeping the paging metadata.
    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_below_one_normalizes() {
        let page: Pagination<()> = Pagination::new(0, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn zero_page_size_uses_default() {
        let page: Pagination<()> = Pagination::new(2, 0);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), u64::from(DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn total_pages_rounds_up() {
        let mut page: Pagination<()> = Pagination::new(2, 10);
        page.total = 21;
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        page.page = 3;
        assert!(!page.has_next());
    }
}
