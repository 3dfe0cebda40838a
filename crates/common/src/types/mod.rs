use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// One page of a listing plus the counters clients need to render pagers.
#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self { items, page, limit, total, total_pages }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn total_pages_rounds_up() {
        let p = Page::new(vec![1, 2], 1, 2, 5);
        assert_eq!(p.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn map_keeps_counters() {
        let p = Page::new(vec![1, 2], 2, 2, 4).map(|x| x * 10);
        assert_eq!(p.items, vec![10, 20]);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 2);
    }
}
