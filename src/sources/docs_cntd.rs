//! docs.cntd.ru: electronic fund of legal and normative-technical documents.

use async_trait::async_trait;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name, Predicate};

use super::html::{first, first_text, mentions_gost, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "docs.cntd.ru";
pub const DEFAULT_BASE_URL: &str = "https://docs.cntd.ru";
pub const CATALOG_PATH: &str = "/document/gost";

pub struct DocsCntdRuSource {
    base_url: String,
}

impl DocsCntdRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for DocsCntdRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Catalogue items use one of three layouts depending on the page version.
pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    let mut items: Vec<Node<'_>> = document.find(Name("div").and(Class("doc-item"))).collect();
    if items.is_empty() {
        items = document.find(Name("a").and(Class("document-title"))).collect();
    }
    if items.is_empty() {
        items = document.find(Name("li").and(Class("doc"))).collect();
    }

    items
        .iter()
        .filter_map(|item| {
            let title = if item.name() == Some("a") {
                Some(*item)
            } else {
                first(item, Name("a"))
            }?;
            let name = node_text(&title);
            if name.is_empty() || !mentions_gost(&name) {
                return None;
            }

            let mut description = first_text(item, Name("span").and(Class("description")));
            if description.is_empty() {
                description = first_text(item, Name("div").and(Class("doc-desc")));
            }
            Some(GostRecord::new(name, description))
        })
        .collect()
}

#[async_trait]
impl GostSource for DocsCntdRuSource {
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
    fn test_parse_doc_items() {
        let html = r#"
            <div class="doc-item">
                <a href="/document/1">ГОСТ Р 1.0-2012</a>
                <span class="description">Стандартизация в Российской Федерации</span>
            </div>
            <div class="doc-item">
                <a href="/document/2">СП 20.13330.2016</a>
            </div>
            <div class="doc-item">
                <a href="/document/3">ГОСТ 2.105-95</a>
                <div class="doc-desc">ЕСКД. Общие требования к текстовым документам</div>
            </div>"#;

        assert_eq!(
            parse(html),
            vec![
                GostRecord::new("ГОСТ Р 1.0-2012", "Стандартизация в Российской Федерации"),
                GostRecord::new("ГОСТ 2.105-95", "ЕСКД. Общие требования к текстовым документам"),
            ]
        );
    }

    #[test]
    fn test_parse_title_anchors_layout() {
        let html = r#"<p><a class="document-title" href="/d/1">  Гост 8.417-2002 </a></p>"#;
        assert_eq!(parse(html), vec![GostRecord::new("Гост 8.417-2002", "")]);
    }

    #[test]
    fn test_parse_list_layout() {
        let html = r#"<ul><li class="doc"><a href="/d">ГОСТ 7.32-2017</a><span class="description">Отчёт о НИР</span></li></ul>"#;
        assert_eq!(parse(html), vec![GostRecord::new("ГОСТ 7.32-2017", "Отчёт о НИР")]);
    }
}
