//! libgost.ru: GOST library. Standards are listed as news blocks.

use async_trait::async_trait;
use select::document::Document;
use select::predicate::{Class, Name, Predicate};

use super::html::{first, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "libgost.ru";
pub const DEFAULT_BASE_URL: &str = "http://libgost.ru";
pub const CATALOG_PATH: &str = "/gost/";

pub struct LibGostRuSource {
    base_url: String,
}

impl LibGostRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for LibGostRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Every `div.news` with a non-empty title. Titles are not required to
/// mention ГОСТ; the library lists only standards.
pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    document
        .find(Name("div").and(Class("news")))
        .filter_map(|item| {
            let title = first(&item, Name("a"))
                .or_else(|| first(&item, Name("h2")))
                .or_else(|| first(&item, Name("h3")))?;
            let name = node_text(&title);
            if name.is_empty() {
                return None;
            }

            let description = first(&item, Name("p"))
                .or_else(|| first(&item, Name("div").and(Class("desc"))))
                .map(|n| node_text(&n))
                .unwrap_or_default();
            Some(GostRecord::new(name, description))
        })
        .collect()
}

#[async_trait]
impl GostSource for LibGostRuSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_news_blocks() {
        let html = r#"
            <div class="news"><a href="/gost/1">ГОСТ 20909.1-75</a><p>Колбы стеклянные</p></div>
            <div class="news"><h2>Р 50.1.028-2001</h2><div class="desc">Информационные технологии</div></div>
            <div class="news"><p>только текст</p></div>
            <div class="other"><a>ГОСТ 1-1</a></div>"#;

        assert_eq!(
            parse(html),
            vec![
                GostRecord::new("ГОСТ 20909.1-75", "Колбы стеклянные"),
                GostRecord::new("Р 50.1.028-2001", "Информационные технологии"),
            ]
        );
    }
}
