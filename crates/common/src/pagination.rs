//! Pagination utilities
//!
//! Query-string friendly `Pagination` plus helpers to normalize inputs.

use serde::Deserialize;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

/// Pagination parameters as they arrive from `?page=&limit=`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u64,
    /// items per page
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 { 1 }
fn default_limit() -> u64 { DEFAULT_LIMIT }

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self { Self { page, limit }.normalized() }

    /// Clamp to sane bounds: page >= 1, limit in 1..=100.
    pub fn normalized(self) -> Self {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    /// Zero-based page index, as sea-orm's `fetch_page` expects.
    pub fn page_index(&self) -> u64 { self.normalized().page - 1 }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        let n = self.normalized();
        (n.page - 1) * n.limit
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, limit: DEFAULT_LIMIT } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let p = Pagination { page: 0, limit: 0 }.normalized();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let p = Pagination { page: 5, limit: 1000 };
        assert_eq!(p.page_index(), 4);
        assert_eq!(p.normalized().limit, 100);
        assert_eq!(p.offset(), 400);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::default();
        assert_eq!(d.page, 1);
        assert_eq!(d.limit, 20);
    }

    #[test]
    fn deserializes_missing_fields_with_defaults() {
        let p: Pagination = serde_json::from_str(r#"{"page": 3}"#).unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset(), 40);
    }
}
