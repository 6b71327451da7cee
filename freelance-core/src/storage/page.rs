use crate::common::error::{MarketError, Result};
use crate::storage::schema::Table;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub descending: bool,
}

/// Zero-based page request with sort orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    pub page: u64,
    pub size: u64,
    pub sort: Vec<SortOrder>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl Pageable {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    pub fn sorted_by(mut self, column: &'static str, descending: bool) -> Self {
        self.sort.push(SortOrder { column, descending });
        self
    }

    /// Reads `page`, `size` and repeated `sort=field[,field…][,asc|desc]`.
    ///
    /// Unparsable or non-positive sizes fall back to the default; sizes above
    /// `max_size` are capped. Sorting on an unknown field is an error.
    pub fn from_query(table: &Table, pairs: &[(String, String)], max_size: u64) -> Result<Self> {
        let mut pageable = Pageable::default();

        for (key, raw) in pairs {
            match key.as_str() {
                "page" => pageable.page = raw.trim().parse().unwrap_or(0),
                "size" => {
                    pageable.size = match raw.trim().parse::<u64>() {
                        Ok(0) | Err(_) => DEFAULT_PAGE_SIZE,
                        Ok(size) => size.min(max_size),
                    }
                }
                "sort" => pageable.sort.extend(parse_sort(table, raw)?),
                _ => {}
            }
        }

        Ok(pageable)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// ORDER BY body; always ends with the id so paging is stable.
    pub fn order_by(&self, alias: &str) -> String {
        let mut parts: Vec<String> = self
            .sort
            .iter()
            .map(|s| format!("{alias}.{} {}", s.column, if s.descending { "DESC" } else { "ASC" }))
            .collect();
        if !self.sort.iter().any(|s| s.column == "id") {
            parts.push(format!("{alias}.id ASC"));
        }
        parts.join(", ")
    }
}

fn parse_sort(table: &Table, raw: &str) -> Result<Vec<SortOrder>> {
    let mut tokens: Vec<&str> = raw.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
    let descending = match tokens.last().map(|t| t.to_ascii_lowercase()) {
        Some(dir) if dir == "desc" => {
            tokens.pop();
            true
        }
        Some(dir) if dir == "asc" => {
            tokens.pop();
            false
        }
        _ => false,
    };

    tokens
        .into_iter()
        .map(|field| {
            table
                .column(field)
                .map(|c| SortOrder {
                    column: c.name,
                    descending,
                })
                .ok_or_else(|| MarketError::InvalidCriteria(format!("cannot sort by unknown field '{field}'")))
        })
        .collect()
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Offer;
    use crate::storage::Entity;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_absent_or_invalid() {
        let p = Pageable::from_query(&Offer::TABLE, &pairs(&[("size", "0"), ("page", "x")]), MAX_PAGE_SIZE)
            .unwrap();
        assert_eq!(p, Pageable::new(0, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn caps_size_and_computes_offset() {
        let p = Pageable::from_query(&Offer::TABLE, &pairs(&[("page", "3"), ("size", "5000")]), 100)
            .unwrap();
        assert_eq!(p.size, 100);
        assert_eq!(p.offset(), 300);
    }

    #[test]
    fn parses_multiple_sorts() {
        let p = Pageable::from_query(
            &Offer::TABLE,
            &pairs(&[("sort", "rating,desc"), ("sort", "name"), ("sort", "id,DESC")]),
            MAX_PAGE_SIZE,
        )
        .unwrap();
        assert_eq!(p.order_by("e"), "e.rating DESC, e.name ASC, e.id DESC");
    }

    #[test]
    fn appends_id_tie_breaker() {
        let p = Pageable::default().sorted_by("name", false);
        assert_eq!(p.order_by("e"), "e.name ASC, e.id ASC");
    }

    #[test]
    fn rejects_unknown_sort_fields() {
        let result = Pageable::from_query(&Offer::TABLE, &pairs(&[("sort", "price,asc")]), MAX_PAGE_SIZE);
        assert!(matches!(result, Err(MarketError::InvalidCriteria(_))));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: Page<u8> = Page {
            content: vec![],
            total: 41,
            page: 0,
            size: 20,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
