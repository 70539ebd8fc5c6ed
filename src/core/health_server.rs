//! HTTP server for health checks and Prometheus metrics
//!
//! Listens on the port exposed by the container image (HTTP_PORT, default 80).
//! - /health  - liveness plus catalogue size
//! - /metrics - Prometheus metrics in text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::core::metrics;
use crate::storage::{count_gosts, get_connection, DbPool};

/// Application state for the health server
#[derive(Clone)]
struct AppState {
    start_time: Instant,
    db_pool: Arc<DbPool>,
}

/// Builds the router; split out so tests can drive it without a socket.
pub fn router(db_pool: Arc<DbPool>) -> Router {
    let state = AppState {
        start_time: Instant::now(),
        db_pool,
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
}

/// Start the health HTTP server
///
/// # Arguments
/// * `port` - Port to listen on (80 inside the container)
/// * `db_pool` - Catalogue pool, used to report the number of stored GOSTs
pub async fn start_health_server(port: u16, db_pool: Arc<DbPool>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(db_pool);

    log::info!("Starting health server on http://{}", addr);
    log::info!("  /health  - Health check (liveness)");
    log::info!("  /metrics - Prometheus metrics");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_secs = state.start_time.elapsed().as_secs();

    let gosts = get_connection(&state.db_pool)
        .map_err(crate::AppError::from)
        .and_then(|conn| count_gosts(&conn));

    let (status, gosts) = match gosts {
        Ok(count) => ("healthy", Some(count)),
        Err(e) => {
            log::warn!("Health check could not read the catalogue: {}", e);
            ("degraded", None)
        }
    };

    let body = serde_json::json!({
        "status": status,
        "uptime_seconds": uptime_secs,
        "gosts": gosts,
        "service": "gostbot",
        "version": env!("CARGO_PKG_VERSION"),
    });

    (StatusCode::OK, axum::Json(body))
}

async fn metrics_handler() -> Response {
    match metrics::gather() {
        Ok(text) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{create_pool, save_gosts};
    use crate::sources::GostRecord;

    async fn get(app: Router, path: &str) -> reqwest::Response {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        reqwest::get(format!("http://{}{}", addr, path)).await.unwrap()
    }

    async fn body_json(app: Router, path: &str) -> serde_json::Value {
        get(app, path).await.json().await.unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_catalogue_size() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("gosts.db").to_str().unwrap()).unwrap();
        {
            let mut conn = pool.get().unwrap();
            let records = vec![GostRecord::new("ГОСТ 1-1", "Первый"), GostRecord::new("ГОСТ 2-2", "")];
            save_gosts(&mut conn, &records, Some("test")).unwrap();
        }

        let json = body_json(router(Arc::new(pool)), "/health").await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["gosts"], 2);
        assert_eq!(json["service"], "gostbot");
    }

    #[tokio::test]
    async fn test_health_degraded_when_catalogue_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("gosts.db").to_str().unwrap()).unwrap();
        pool.get().unwrap().execute_batch("DROP TABLE gosts").unwrap();

        let json = body_json(router(Arc::new(pool)), "/health").await;
        assert_eq!(json["status"], "degraded");
        assert!(json["gosts"].is_null());
    }

    #[tokio::test]
    async fn test_metrics_prometheus_text() {
        metrics::init_metrics().unwrap();
        metrics::record_search("bot", true);

        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("gosts.db").to_str().unwrap()).unwrap();

        let response = get(router(Arc::new(pool)), "/metrics").await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let content_type = response.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/plain"));

        let text = response.text().await.unwrap();
        assert!(text.contains("# TYPE gostbot_searches_total counter"));
        assert!(text.contains("gostbot_searches_total{origin=\"bot\",outcome=\"found\"}"));
    }
}
