use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 100;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// `?page=&limit=` query params with clamped defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageQuery {
    /// Clamp page to >= 1 and limit to 1..=100.
    pub fn validated(self) -> PageQuery {
        PageQuery {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub items_per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(query: &PageQuery, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = (total_items + query.limit - 1) / query.limit;
        Self {
            current_page: query.page,
            items_per_page: query.limit,
            total_items,
            total_pages,
            has_next_page: query.page < total_pages,
            has_prev_page: query.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total_items: i64) -> Self {
        Self {
            items,
            pagination: PageMeta::new(query, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_clamps_out_of_range_values() {
        let q = PageQuery { page: 0, limit: 500 }.validated();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 100);

        let q = PageQuery { page: -3, limit: 0 }.validated();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn offset_is_zero_based() {
        let q = PageQuery { page: 3, limit: 10 };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn meta_computes_page_flags() {
        let q = PageQuery { page: 2, limit: 10 };
        let meta = PageMeta::new(&q, 35);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);

        let last = PageMeta::new(&PageQuery { page: 4, limit: 10 }, 35);
        assert!(!last.has_next_page);
    }

    #[test]
    fn meta_handles_empty_result() {
        let meta = PageMeta::new(&PageQuery { page: 1, limit: 10 }, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }
}
