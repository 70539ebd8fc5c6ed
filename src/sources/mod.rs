//! Data sources for GOST standards.
//!
//! Provides the `GostSource` trait for scrapers of public GOST portals and a
//! `SourceRegistry` that keeps them in a fixed order. New portals are added by
//! implementing `GostSource` and registering them in `default_registry()`.
//!
//! Built-in sources:
//! - `gost.ru`: Rosstandart open data (CSV in windows-1251)
//! - `docs.cntd.ru`: normative-technical documents catalogue
//! - `meganorm.ru`: standards by category
//! - `protect.gost.ru`: official protected documents portal (search)
//! - `files.stroyinf.ru`: construction standards
//! - `internet-law.ru`: legal database
//! - `libgost.ru`: GOST library

pub mod docs_cntd;
pub mod gost_ru;
pub mod html;
pub mod http;
pub mod internet_law;
pub mod libgost;
pub mod meganorm;
pub mod protect_gost;
pub mod stroyinf;

pub use docs_cntd::DocsCntdRuSource;
pub use gost_ru::GostRuSource;
pub use http::HttpFetcher;
pub use internet_law::InternetLawRuSource;
pub use libgost::LibGostRuSource;
pub use meganorm::MeganormRuSource;
pub use protect_gost::ProtectGostRuSource;
pub use stroyinf::FilesStroyinfRuSource;

use crate::core::error::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A GOST as scraped from a source, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GostRecord {
    /// Designation, e.g. "ГОСТ Р 1.0-2012"
    pub name: String,
    /// Title or annotation; empty when the source has none
    pub description: String,
}

impl GostRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Trait for GOST data source implementations.
///
/// `fetch_gosts` performs the network requests and returns every record the
/// source exposes; the parsing step of each source is a pure function over
/// the fetched text so it can be tested without a network.
#[async_trait]
pub trait GostSource: Send + Sync {
    /// Short name of the source (e.g., "gost.ru")
    fn name(&self) -> &str;

    /// Scheme and host the source fetches from (e.g., "https://www.gost.ru")
    fn base_url(&self) -> &str;

    /// Fetch all GOSTs the source lists.
    async fn fetch_gosts(&self, http: &HttpFetcher) -> AppResult<Vec<GostRecord>>;
}

/// Joins a base URL and an absolute path without doubling the slash.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Ordered collection of data sources.
///
/// All-source imports walk the sources in insertion order, which also decides
/// which description wins when two sources list the same GOST.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn GostSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Register a source. Sources are fetched in insertion order.
    pub fn register(&mut self, source: Arc<dyn GostSource>) {
        self.sources.push(source);
    }

    /// All registered sources in order.
    pub fn sources(&self) -> &[Arc<dyn GostSource>] {
        &self.sources
    }

    /// Find a source by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<Arc<dyn GostSource>> {
        let name = name.trim();
        self.sources
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Names of all registered sources in order.
    pub fn names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Create the default registry with the seven built-in portals.
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GostRuSource::new()));
        registry.register(Arc::new(DocsCntdRuSource::new()));
        registry.register(Arc::new(MeganormRuSource::new()));
        registry.register(Arc::new(ProtectGostRuSource::new()));
        registry.register(Arc::new(FilesStroyinfRuSource::new()));
        registry.register(Arc::new(InternetLawRuSource::new()));
        registry.register(Arc::new(LibGostRuSource::new()));
        registry
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::default_registry()
    }
}
