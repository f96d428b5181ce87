use super::resource::{ResourceClass, ResourceRecord};
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query-string key used for free-text search
pub const SEARCH_PARAM: &str = "_q";

/// Default number of records per page when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on page size accepted from a location string
const MAX_PAGE_SIZE: u32 = 100;

/// Canonical key identifying one collection query.
///
/// Filters are held in a `BTreeMap`, so two signatures built from the same
/// parameters in a different order compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySignature {
    resource_class: ResourceClass,
    filters: BTreeMap<String, String>,
    search_text: Option<String>,
    page: u32,
    page_size: u32,
}

impl QuerySignature {
    /// First page of `resource_class` with no filters or search
    pub fn new(resource_class: ResourceClass) -> Self {
        Self {
            resource_class,
            filters: BTreeMap::new(),
            search_text: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn without_filter(mut self, key: &str) -> Self {
        self.filters.remove(key);
        self
    }

    /// Sets the search text; blank text is the same as no search.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        self.search_text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Pages are 1-based; zero is clamped to the first page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn resource_class(&self) -> &ResourceClass {
        &self.resource_class
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Query parameters in canonical order, ready for a transport to encode
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(search) = &self.search_text {
            pairs.push((SEARCH_PARAM.to_string(), search.clone()));
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("pageSize".to_string(), self.page_size.to_string()));
        pairs.sort();
        pairs
    }

    /// Order-independent textual form, e.g. `users?_q=ann&page=1&pageSize=10`
    pub fn canonical(&self) -> String {
        let query = self
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.resource_class, query)
    }

    /// Parses a location search string (`?page=2&_q=foo&filters[x]=y`).
    ///
    /// `page`, `pageSize` and `_q` map to their fields; every other key is a filter.
    /// Keys are matched case-sensitively; repeated keys keep the last value.
    pub fn from_query_string(resource_class: ResourceClass, query: &str) -> Result<Self> {
        let mut signature = Self::new(resource_class);
        let query = query.trim_start_matches('?');

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(raw_key)?;
            let value = decode_component(raw_value)?;

            match key.as_str() {
                "page" => {
                    let page = value
                        .parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("Invalid page number: '{}'", value))?;
                    signature = signature.with_page(page);
                }
                "pageSize" => {
                    let size = value
                        .parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("Invalid page size: '{}'", value))?;
                    signature = signature.with_page_size(size);
                }
                SEARCH_PARAM => signature = signature.with_search(value),
                _ => signature = signature.with_filter(key, value),
            }
        }

        Ok(signature)
    }
}

impl std::fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

fn decode_component(raw: &str) -> Result<String> {
    // Form encoding uses '+' for spaces; urlencoding only handles %XX.
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced)
        .map_err(|e| anyhow::anyhow!("Invalid query string component '{}': {}", raw, e))?;
    Ok(decoded.into_owned())
}

/// Pagination block reported by the backend for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        Self {
            total,
            page,
            page_size,
        }
    }

    /// Pagination for an unpaginated collection: everything on page one
    pub fn single_page(total: u64) -> Self {
        let size = u32::try_from(total).unwrap_or(u32::MAX).max(1);
        Self::new(total, 1, size)
    }

    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }
}

/// What the transport returns for one collection query
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage {
    pub records: Vec<ResourceRecord>,
    pub pagination: Pagination,
}

impl CollectionPage {
    pub fn new(records: Vec<ResourceRecord>, pagination: Pagination) -> Self {
        Self {
            records,
            pagination,
        }
    }

    /// Wraps an unpaginated list
    pub fn unpaginated(records: Vec<ResourceRecord>) -> Self {
        let total = records.len() as u64;
        Self::new(records, Pagination::single_page(total))
    }
}
