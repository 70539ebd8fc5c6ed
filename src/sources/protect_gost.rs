//! protect.gost.ru: official portal of protected GOST documents.
//!
//! The portal has no catalogue page, only a search form, so the source runs a
//! search for each common designation prefix and merges the results.

use async_trait::async_trait;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name, Predicate};

use super::html::{first, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "protect.gost.ru";
pub const DEFAULT_BASE_URL: &str = "https://protect.gost.ru";
pub const SEARCH_PATH: &str = "/v.aspx";

/// Prefixes searched for, in order.
pub const QUERY_PREFIXES: [&str; 2] = ["ГОСТ Р", "ГОСТ"];

pub struct ProtectGostRuSource {
    base_url: String,
}

impl ProtectGostRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for ProtectGostRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one search result page.
pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    let mut results: Vec<Node<'_>> = document.find(Name("div").and(Class("result-item"))).collect();
    if results.is_empty() {
        results = document.find(Name("tr").and(Class("doc-row"))).collect();
    }

    results
        .iter()
        .filter_map(|result| {
            let title = first(result, Name("a")).or_else(|| first(result, Name("span").and(Class("title"))))?;
            let name = node_text(&title);
            if name.is_empty() {
                return None;
            }

            let description = first(result, Name("p"))
                .or_else(|| first(result, Name("span").and(Class("desc"))))
                .map(|n| node_text(&n))
                .unwrap_or_default();
            Some(GostRecord::new(name, description))
        })
        .collect()
}

#[async_trait]
impl GostSource for ProtectGostRuSource {
    fn name(&self) -> &str {
        NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A failed prefix is skipped; the error is returned only if every prefix failed.
    async fn fetch_gosts(&self, http: &HttpFetcher) -> AppResult<Vec<GostRecord>> {
        let url = join_url(&self.base_url, SEARCH_PATH);
        let mut gosts = Vec::new();
        let mut last_error = None;
        let mut succeeded = false;

        for prefix in QUERY_PREFIXES {
            match http.get_html(&url, &[("s", prefix)]).await {
                Ok(html) => {
                    succeeded = true;
                    gosts.extend(parse(&html));
                }
                Err(e) => {
                    log::warn!("{}: search for '{}' failed: {}", NAME, prefix, e);
                    last_error = Some(e);
                }
            }
        }

        if let (false, Some(e)) = (succeeded, last_error) {
            return Err(e);
        }

        log::info!("Fetched {} GOSTs from {}", gosts.len(), NAME);
        Ok(gosts)
    }
}
