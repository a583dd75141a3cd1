//! Pagination position for one year's query.

/// Position within one year's result pages. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub year: u32,
    pub page: u32,
    pub page_size: u32,
}

impl PageCursor {
    /// Cursor at the first page of a year.
    pub fn first(year: u32, page_size: u32) -> Self {
        Self {
            year,
            page: 1,
            page_size,
        }
    }

    /// Cursor at the following page.
    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    /// Zero-based listing offset of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}
