//! meganorm.ru: normative documents grouped by category.

use async_trait::async_trait;
use select::document::Document;
use select::predicate::Name;

use super::html::{first, mentions_gost, node_text};
use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::error::AppResult;

pub const NAME: &str = "meganorm.ru";
pub const DEFAULT_BASE_URL: &str = "https://meganorm.ru";
/// GOST category page
pub const GOST_PATH: &str = "/Index2/1/4294817/4294817904.htm";

pub struct MeganormRuSource {
    base_url: String,
}

impl MeganormRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for MeganormRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Every table row whose first link mentions a GOST; the description is the second cell.
pub fn parse(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    document
        .find(Name("tr"))
        .filter_map(|row| {
            let link = first(&row, Name("a"))?;
            let name = node_text(&link);
            if name.is_empty() || !mentions_gost(&name) {
                return None;
            }

            let description = row.find(Name("td")).nth(1).map(|cell| node_text(&cell)).unwrap_or_default();
            Some(GostRecord::new(name, description))
        })
        .collect()
}

#[async_trait]
impl GostSource for MeganormRuSource {
    fn name(&self) -> &str {
        NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_gosts(&self, http: &HttpFetcher) -> AppResult<Vec<GostRecord>> {
        let html = http.get_html(&join_url(&self.base_url, GOST_PATH), &[]).await?;
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
    fn test_parse_rows() {
        let html = r#"
            <table>
                <tr><th>Обозначение</th><th>Название</th></tr>
                <tr><td><a href="/1.htm">ГОСТ 9.032-74</a></td><td>Покрытия лакокрасочные</td></tr>
                <tr><td><a href="/2.htm">ОСТ 1 00001</a></td><td>Не ГОСТ</td></tr>
                <tr><td><a href="/3.htm">ГОСТ 2.104-2006</a></td></tr>
            </table>"#;

        assert_eq!(
            parse(html),
            vec![
                GostRecord::new("ГОСТ 9.032-74", "Покрытия лакокрасочные"),
                GostRecord::new("ГОСТ 2.104-2006", ""),
            ]
        );
    }
}
