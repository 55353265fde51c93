use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized 1-based page request. Construction clamps rather than
/// errors: page 0 becomes 1, page size lands in 1..=MAX_PAGE_SIZE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Sort order for a single declared field. Numeric wire form: 1 ascending,
/// -1 descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn from_numeric(n: i8) -> Option<Self> {
        match n {
            1 => Some(SortDirection::Ascending),
            -1 => Some(SortDirection::Descending),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// One page of a listing. `total_count` covers every matching row
/// irrespective of the page; an out-of-range page is an empty `items`
/// with the counts intact, never an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: &PageRequest) -> Self {
        let has_next = (request.page() as u64) * (request.page_size() as u64) < total_count;
        Self {
            items,
            total_count,
            page: request.page(),
            page_size: request.page_size(),
            has_next,
            next_page: has_next.then(|| request.page() + 1),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
            next_page: self.next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_normalizes_degenerate_input() {
        let req = PageRequest::new(0, 0);
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 1);

        let req = PageRequest::new(3, 10_000);
        assert_eq!(req.page(), 3);
        assert_eq!(req.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_is_zero_based_from_one_based_pages() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(4, 25).offset(), 75);
    }

    #[test]
    fn has_next_is_false_once_the_page_covers_the_total() {
        // page * page_size >= total_count  =>  no next page
        let page = Page::new(vec![1, 2], 2, &PageRequest::new(1, 2));
        assert!(!page.has_next);
        assert_eq!(page.next_page, None);

        let page = Page::<u32>::new(vec![], 20, &PageRequest::new(2, 10));
        assert!(!page.has_next);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn has_next_advances_while_rows_remain() {
        let page = Page::new(vec![1, 2], 5, &PageRequest::new(1, 2));
        assert!(page.has_next);
        assert_eq!(page.next_page, Some(2));

        let page = Page::new(vec![5], 5, &PageRequest::new(3, 2));
        assert!(!page.has_next);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn out_of_range_page_keeps_counts() {
        let page = Page::<u32>::new(vec![], 7, &PageRequest::new(9, 10));
        assert_eq!(page.total_count, 7);
        assert!(!page.has_next);
        assert!(page.items.is_empty());
    }

    #[test]
    fn sort_direction_round_trips_numeric_form() {
        assert_eq!(SortDirection::from_numeric(1), Some(SortDirection::Ascending));
        assert_eq!(SortDirection::from_numeric(-1), Some(SortDirection::Descending));
        assert_eq!(SortDirection::from_numeric(0), None);
        assert_eq!(SortDirection::Descending.as_numeric(), -1);
        assert_eq!(SortDirection::Ascending.as_sql(), "ASC");
    }
}
