//! gost.ru: Rosstandart open data.
//!
//! The open-data page links a CSV of all national standards. The CSV is in
//! windows-1251, `;`-separated, with a header line; the first two columns are
//! the designation and the title.

use async_trait::async_trait;
use select::document::Document;
use select::predicate::{Attr, Name};
use url::Url;

use super::{join_url, GostRecord, GostSource, HttpFetcher};
use crate::core::config::network;
use crate::core::error::{AppError, AppResult};

pub const NAME: &str = "gost.ru";
pub const DEFAULT_BASE_URL: &str = "https://www.gost.ru";
pub const OPENDATA_PATH: &str = "/opendata/7706406291-nationalstandards";

/// Container of the dataset download links on the open-data page.
const OPENDATA_BLOCK_ID: &str = "242b6628-20e0-459f-b512-2fe12015e7eb";
const CSV_CHARSET: &str = "windows-1251";

pub struct GostRuSource {
    base_url: String,
}

impl GostRuSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Resolves a (possibly relative) CSV link against the base URL.
    fn resolve_link(&self, href: &str) -> AppResult<String> {
        if href.starts_with("http") {
            return Ok(href.to_string());
        }
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(href)?.to_string())
    }
}

impl Default for GostRuSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds the CSV download link: first inside the open-data block, then anywhere.
pub fn find_csv_link(html: &str) -> Option<String> {
    let document = Document::from(html);

    let in_block = document.find(Attr("id", OPENDATA_BLOCK_ID)).next().and_then(|block| {
        block
            .find(Name("a"))
            .filter_map(|a| a.attr("href"))
            .find(|href| href.contains(".csv"))
    });

    in_block
        .or_else(|| {
            document
                .find(Name("a"))
                .filter_map(|a| a.attr("href"))
                .find(|href| href.contains(".csv"))
        })
        .map(|href| href.trim().to_string())
}

/// Parses the decoded CSV. The header line is skipped, lines with fewer than
/// two fields are ignored.
pub fn parse_csv(content: &str) -> Vec<GostRecord> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split(';');
            let name = unquote(fields.next()?);
            let description = unquote(fields.next()?);
            if name.is_empty() {
                None
            } else {
                Some(GostRecord::new(name, description))
            }
        })
        .collect()
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

#[async_trait]
impl GostSource for GostRuSource {
    fn name(&self) -> &str {
        NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_gosts(&self, http: &HttpFetcher) -> AppResult<Vec<GostRecord>> {
        let page = http.get_html(&join_url(&self.base_url, OPENDATA_PATH), &[]).await?;

        let href = find_csv_link(&page).ok_or_else(|| AppError::Parse(format!("{}: no CSV link on open-data page", NAME)))?;
        let csv_url = self.resolve_link(&href)?;
        log::info!("{}: downloading {}", NAME, csv_url);

        let content = http
            .get_text_with_charset(&csv_url, CSV_CHARSET, network::file_timeout())
            .await?;

        let gosts = parse_csv(&content);
        log::info!("Fetched {} GOSTs from {}", gosts.len(), NAME);
        Ok(gosts)
    }
}
