//! Import pipeline over real scrapers pointed at a mock server
//!
//! Run with: cargo test --test import_test

use std::sync::Arc;

use gostbot::core::retry::RetryConfig;
use gostbot::import::{fetch_from_all_sources, update_database_from_all_sources};
use gostbot::search::search_local;
use gostbot::sources::{
    GostRecord, HttpFetcher, InternetLawRuSource, LibGostRuSource, MeganormRuSource, SourceRegistry,
};
use gostbot::storage::{count_by_source, create_pool, get_connection};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_portals() -> MockServer {
    let server = MockServer::start().await;

    // internet-law.ru is down
    Mock::given(method("GET"))
        .and(path("/gosts/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Index2/1/4294817/4294817904.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table>
                <tr><td><a href="/1.htm">ГОСТ 9.032-74</a></td><td>Покрытия лакокрасочные</td></tr>
                <tr><td><a href="/2.htm">ГОСТ 2.104-2006</a></td><td>ЕСКД. Основные надписи</td></tr>
            </table>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gost/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="news"><a>ГОСТ 2.104-2006</a><p>другое описание</p></div>
               <div class="news"><a>ГОСТ 20909.1-75</a><p>Колбы стеклянные</p></div>"#,
        ))
        .mount(&server)
        .await;

    server
}

fn registry(base_url: &str) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(InternetLawRuSource::with_base_url(base_url)));
    registry.register(Arc::new(MeganormRuSource::with_base_url(base_url)));
    registry.register(Arc::new(LibGostRuSource::with_base_url(base_url)));
    registry
}

fn http() -> HttpFetcher {
    HttpFetcher::with_retry(RetryConfig::none()).unwrap()
}

#[tokio::test]
async fn test_fetch_all_dedups_and_survives_failures() {
    let server = mock_portals().await;

    let gosts = fetch_from_all_sources(&registry(&server.uri()), &http()).await;
    assert_eq!(
        gosts,
        vec![
            GostRecord::new("ГОСТ 9.032-74", "Покрытия лакокрасочные"),
            GostRecord::new("ГОСТ 2.104-2006", "ЕСКД. Основные надписи"),
            GostRecord::new("ГОСТ 20909.1-75", "Колбы стеклянные"),
        ]
    );
}

#[tokio::test]
async fn test_update_then_search() {
    let server = mock_portals().await;
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(dir.path().join("gosts.db").to_str().unwrap()).unwrap();
    let registry = registry(&server.uri());

    assert_eq!(update_database_from_all_sources(&registry, &http(), &pool).await.unwrap(), 3);
    assert_eq!(update_database_from_all_sources(&registry, &http(), &pool).await.unwrap(), 0);

    let conn = get_connection(&pool).unwrap();
    assert_eq!(
        count_by_source(&conn).unwrap(),
        vec![("meganorm.ru".to_string(), 2), ("libgost.ru".to_string(), 1)]
    );

    let found = search_local(&pool, "колбы", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "ГОСТ 20909.1-75");
    assert_eq!(found[0].source.as_deref(), Some("libgost.ru"));
}
