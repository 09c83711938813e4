//! Page/limit normalization for list endpoints.

const DEFAULT_LIMIT: i64 = 25;
const MAX_LIMIT: i64 = 100;
// Keeps `offset()` within i64 for any accepted limit.
const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

/// A normalized page request: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = Pagination::default();
        assert_eq!((p.page, p.limit, p.offset()), (1, 25, 0));
    }

    #[test]
    fn clamps_out_of_range_values() {
        let p = Pagination::new(Some(-4), Some(1_000));
        assert_eq!((p.page, p.limit), (1, 100));
        let p = Pagination::new(Some(3), Some(0));
        assert_eq!((p.page, p.limit, p.offset()), (3, 1, 2));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let p = Pagination::new(Some(i64::MAX), Some(100));
        assert_eq!(p.page, MAX_PAGE);
        assert!(p.offset() > 0);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 100);
    }
}
