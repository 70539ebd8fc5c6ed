//! internet-law.ru: legal database with a GOST section.

use async_trait::async_trait;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name, Predicate};

use super::html::{first, mentions_gost, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "internet-law.ru";
pub const DEFAULT_BASE_URL: &str = "https://internet-law.ru";
pub const CATALOG_PATH: &str = "/gosts/";

pub struct InternetLawRuSource {
    base_url: String,
}

impl InternetLawRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for InternetLawRuSource {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    let mut items: Vec<Node<'_>> = document.find(Name("div").and(Class("gost-item"))).collect();
    if items.is_empty() {
        items = document.find(Name("li").and(Class("gost"))).collect();
    }

    items
        .iter()
        .filter_map(|item| {
            let link = first(item, Name("a"))?;
            let name = node_text(&link);
            if !mentions_gost(&name) {
                return None;
            }

            let description = first(item, Name("p"))
                .or_else(|| first(item, Name("span").and(Class("desc"))))
                .map(|n| node_text(&n))
                .unwrap_or_default();
            Some(GostRecord::new(name, description))
        })
        .collect()
}

#[async_trait]
impl GostSource for InternetLawRuSource {
    fn name(&self) -> &str {
        NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_gosts(&self, http: &HttpFetcher) -> AppResult<Vec<GostRecord>> {
        let html = http.get_html(&join_url(&self.base_url, CATALOG_PATH), &[]).await?;
        let gosts = parse(&html);
        log::info!("Fetched {} GOSTs from {}", gosts.len(), NAME);
        Ok(gosts)
    }
}
