//! files.stroyinf.ru: construction standards catalogue.

use async_trait::async_trait;
use select::document::Document;
use select::node::Node;
use select::predicate::Name;

use super::html::{clean_text, mentions_gost, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "files.stroyinf.ru";
pub const DEFAULT_BASE_URL: &str = "https://files.stroyinf.ru";
pub const CATALOG_PATH: &str = "/cat/Gosts.html";

pub struct FilesStroyinfRuSource {
    base_url: String,
}

impl FilesStroyinfRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for FilesStroyinfRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Every link mentioning a GOST. The catalogue writes the title as bare text
/// right after the link: `<a>ГОСТ 123-45</a> Title<br>`.
pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    document
        .find(Name("a"))
        .filter_map(|link| {
            let name = node_text(&link);
            if name.is_empty() || !mentions_gost(&name) {
                return None;
            }
            Some(GostRecord::new(name, trailing_text(&link)))
        })
        .collect()
}

/// First non-blank text sibling after `link`, stopping at the next link.
fn trailing_text(link: &Node<'_>) -> String {
    let mut sibling = link.next();
    while let Some(node) = sibling {
        if let Some(text) = node.as_text() {
            let text = clean_text(text);
            if !text.is_empty() {
                return text;
            }
        } else if node.name() == Some("a") {
            break;
        }
        sibling = node.next();
    }
    String::new()
}

#[async_trait]
impl GostSource for FilesStroyinfRuSource {
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
