//! Import pipeline: fetch GOSTs from the data sources and store the new ones.
//!
//! Sources are fetched one after another in registry order. A failing source
//! is logged and contributes nothing; the remaining sources still run. When
//! several sources list the same designation, the first one wins.

use std::collections::HashSet;

use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::sources::{GostRecord, GostSource, HttpFetcher, SourceRegistry};
use crate::storage::{self, DbPool};

/// Records fetched from one source, after cross-source deduplication.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: String,
    pub records: Vec<GostRecord>,
}

/// Fetch GOSTs from a specific data source.
pub async fn fetch_from_source(source: &dyn GostSource, http: &HttpFetcher) -> AppResult<Vec<GostRecord>> {
    log::info!("Fetching from {}...", source.name());

    match source.fetch_gosts(http).await {
        Ok(gosts) => {
            metrics::record_source_fetch(source.name(), "ok");
            Ok(gosts)
        }
        Err(e) => {
            metrics::record_source_fetch(source.name(), e.kind());
            Err(e)
        }
    }
}

/// Fetch every source in order, keeping track of where each record came from.
///
/// Failed sources are skipped. A name already seen, in this or an earlier
/// source, is dropped.
pub async fn fetch_batches(registry: &SourceRegistry, http: &HttpFetcher) -> Vec<SourceBatch> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut batches = Vec::with_capacity(registry.len());

    for source in registry.sources() {
        let gosts = match fetch_from_source(source.as_ref(), http).await {
            Ok(gosts) => gosts,
            Err(e) => {
                log::error!("Failed to fetch from {}: {}", source.name(), e);
                continue;
            }
        };

        let records: Vec<GostRecord> = gosts.into_iter().filter(|g| seen.insert(g.name.clone())).collect();
        batches.push(SourceBatch {
            source: source.name().to_string(),
            records,
        });
    }

    let total: usize = batches.iter().map(|b| b.records.len()).sum();
    log::info!("Total unique GOSTs fetched: {}", total);
    batches
}

/// Fetch GOSTs from all registered sources, deduplicated by name.
pub async fn fetch_from_all_sources(registry: &SourceRegistry, http: &HttpFetcher) -> Vec<GostRecord> {
    fetch_batches(registry, http)
        .await
        .into_iter()
        .flat_map(|batch| batch.records)
        .collect()
}

/// Save GOSTs to the catalogue.
///
/// # Returns
///
/// Number of GOSTs that were not in the catalogue before.
pub async fn save_gosts_to_db(pool: &DbPool, records: Vec<GostRecord>, source: Option<&str>) -> AppResult<usize> {
    let pool = pool.clone();
    let owned_source = source.map(str::to_string);

    let count = tokio::task::spawn_blocking(move || -> AppResult<usize> {
        let mut conn = storage::get_connection(&pool)?;
        storage::save_gosts(&mut conn, &records, owned_source.as_deref())
    })
    .await
    .map_err(|e| AppError::Anyhow(e.into()))??;

    metrics::record_imported(source.unwrap_or("unknown"), count);
    Ok(count)
}

/// Fetch from all sources and store the new GOSTs.
///
/// # Returns
///
/// Number of new GOSTs across all sources.
pub async fn update_database_from_all_sources(
    registry: &SourceRegistry,
    http: &HttpFetcher,
    pool: &DbPool,
) -> AppResult<usize> {
    let mut total = 0;
    for batch in fetch_batches(registry, http).await {
        let added = save_gosts_to_db(pool, batch.records, Some(&batch.source)).await?;
        log::info!("{}: {} new GOSTs", batch.source, added);
        total += added;
    }

    log::info!("Database update finished: {} new GOSTs", total);
    Ok(total)
}

/// Fetch one source by name and store its new GOSTs.
///
/// Returns `None` when no source has that name.
pub async fn update_database_from_source(
    registry: &SourceRegistry,
    name: &str,
    http: &HttpFetcher,
    pool: &DbPool,
) -> AppResult<Option<usize>> {
    let Some(source) = registry.find(name) else {
        return Ok(None);
    };

    let records = fetch_from_source(source.as_ref(), http).await?;
    let added = save_gosts_to_db(pool, records, Some(source.name())).await?;
    Ok(Some(added))
}

/// Names of the registered sources.
pub fn list_available_sources(registry: &SourceRegistry) -> Vec<String> {
    registry.names()
}
