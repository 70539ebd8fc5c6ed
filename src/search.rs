//! GOST lookup: catalogue search, remote search and reply formatting.

use select::document::Document;
use select::predicate::{Class, Name, Predicate};

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::sources::html::clean_text;
use crate::sources::{GostRecord, HttpFetcher};
use crate::storage::{self, DbPool, Gost};

const NOTHING_FOUND: &str = "Ничего не найдено";
const QUERY_ECHO_CHARS: usize = 100;

/// Trims the query and collapses inner whitespace.
pub fn normalize_query(text: &str) -> AppResult<String> {
    let query = clean_text(text);
    if query.is_empty() {
        return Err(AppError::Validation("empty search query".to_string()));
    }
    Ok(query)
}

/// Searches the local catalogue.
pub fn search_local(pool: &DbPool, text: &str, limit: usize) -> AppResult<Vec<Gost>> {
    let query = normalize_query(text)?;
    let conn = storage::get_connection(pool)?;
    storage::search_gosts(&conn, &query, limit)
}

/// Searches a remote catalogue page. Only the first page of results is read.
pub async fn search_remote(http: &HttpFetcher, search_url: &str, text: &str) -> AppResult<Vec<GostRecord>> {
    let query = normalize_query(text)?;
    let html = http
        .get_html(search_url, &[("searchString", query.as_str()), ("searchcatalogbtn", "Искать")])
        .await?;
    Ok(parse_remote_results(&html))
}

/// Each `div.textBlue` block is one result: the first non-empty line is the
/// designation, the remaining lines are the title.
pub fn parse_remote_results(html: &str) -> Vec<GostRecord> {
    let document = Document::from(html);

    document
        .find(Name("div").and(Class("textBlue")))
        .filter_map(|block| {
            let text = block.text();
            let mut lines = text.lines().map(clean_text).filter(|line| !line.is_empty());
            let name = lines.next()?;
            let description = lines.collect::<Vec<_>>().join(" ");
            Some(GostRecord::new(name, description))
        })
        .collect()
}

/// Local search first; the remote catalogue is asked only when nothing was
/// found locally and a search URL is configured.
pub async fn find_gosts(
    pool: &DbPool,
    http: &HttpFetcher,
    search_url: Option<&str>,
    text: &str,
    limit: usize,
) -> AppResult<Vec<GostRecord>> {
    let local = search_local(pool, text, limit)?;
    if !local.is_empty() {
        return Ok(local.into_iter().map(GostRecord::from).collect());
    }

    let Some(url) = search_url else {
        return Ok(Vec::new());
    };

    match search_remote(http, url, text).await {
        Ok(mut remote) => {
            remote.truncate(limit);
            Ok(remote)
        }
        Err(e) => {
            log::warn!("Remote search failed for '{}': {}", text, e);
            Ok(Vec::new())
        }
    }
}

/// Formats results as a plain-text Telegram message.
///
/// Results that would push the message past the Telegram limit are dropped
/// and replaced with a count of what was left out.
pub fn format_results(query: &str, gosts: &[GostRecord]) -> String {
    if gosts.is_empty() {
        return NOTHING_FOUND.to_string();
    }

    let limit = config::search::MESSAGE_LIMIT;
    let mut message = format!("Найдено по запросу «{}»:\n", truncate_chars(query, QUERY_ECHO_CHARS));
    let mut shown = 0;

    for (i, gost) in gosts.iter().enumerate() {
        let entry = format_entry(i + 1, gost);
        let remaining = gosts.len() - i - 1;
        let tail_reserve = if remaining > 0 { 32 } else { 0 };
        if message.chars().count() + entry.chars().count() + tail_reserve > limit {
            break;
        }
        message.push_str(&entry);
        shown += 1;
    }

    if shown < gosts.len() {
        message.push_str(&format!("\n…и ещё {}", gosts.len() - shown));
    }

    truncate_chars(&message, limit)
}

fn format_entry(number: usize, gost: &GostRecord) -> String {
    let description = truncate_chars(&gost.description, config::search::DESCRIPTION_PREVIEW_CHARS);
    if description.is_empty() {
        format!("\n{}. {}\n", number, gost.name)
    } else {
        format!("\n{}. {}\n{}\n", number, gost.name, description)
    }
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::retry::RetryConfig;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pool_with(records: &[GostRecord]) -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = storage::create_pool(dir.path().join("gosts.db").to_str().unwrap()).unwrap();
        let mut conn = storage::get_connection(&pool).unwrap();
        storage::save_gosts(&mut conn, records, Some("test")).unwrap();
        (dir, pool)
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  ГОСТ   20909.1 ").unwrap(), "ГОСТ 20909.1");
        assert!(matches!(normalize_query(" \n\t "), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_format_nothing_found() {
        assert_eq!(format_results("ГОСТ 0", &[]), "Ничего не найдено");
    }

    #[test]
    fn test_format_lists_numbered_results() {
        let gosts = vec![
            GostRecord::new("ГОСТ 20909.1-75", "Колбы стеклянные"),
            GostRecord::new("ГОСТ 20909.2-75", ""),
        ];
        assert_eq!(
            format_results("20909", &gosts),
            "Найдено по запросу «20909»:\n\n1. ГОСТ 20909.1-75\nКолбы стеклянные\n\n2. ГОСТ 20909.2-75\n"
        );
    }

    #[test]
    fn test_format_respects_message_limit() {
        let long = "д".repeat(1000);
        let gosts: Vec<GostRecord> = (0..100).map(|i| GostRecord::new(format!("ГОСТ {}-00", i), long.clone())).collect();

        let message = format_results("гост", &gosts);
        assert!(message.chars().count() <= config::search::MESSAGE_LIMIT);
        assert!(message.contains("1. ГОСТ 0-00"));
        assert!(message.contains("…и ещё"));
    }

    #[test]
    fn test_format_long_query_leaves_room_for_results() {
        let query = "г".repeat(4000);
        let gosts = vec![GostRecord::new("ГОСТ 1-1", "Первый"), GostRecord::new("ГОСТ 2-2", "Второй")];

        let message = format_results(&query, &gosts);
        assert!(message.starts_with(&format!("Найдено по запросу «{}…»:\n", "г".repeat(QUERY_ECHO_CHARS - 1))));
        assert!(message.contains("1. ГОСТ 1-1\nПервый"));
        assert!(message.contains("2. ГОСТ 2-2\nВторой"));
        assert!(!message.contains("…и ещё"));
    }

    #[test]
    fn test_search_local_ranks_name_matches() {
        let (_dir, pool) = pool_with(&[
            GostRecord::new("ГОСТ 1-1", "про трубы"),
            GostRecord::new("ГОСТ трубы 2-2", ""),
        ]);
        let found = search_local(&pool, "  ТРУБЫ ", 10).unwrap();
        let names: Vec<_> = found.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["ГОСТ трубы 2-2", "ГОСТ 1-1"]);
    }

    #[test]
    fn test_parse_remote_results() {
        let html = r#"
            <div class="textBlue">
                ГОСТ 20909.1-75
                Колбы стеклянные.
                Технические условия
            </div>
            <div class="textBlue">   </div>"#;
        assert_eq!(
            parse_remote_results(html),
            vec![GostRecord::new("ГОСТ 20909.1-75", "Колбы стеклянные. Технические условия")]
        );
    }

    #[tokio::test]
    async fn test_find_gosts_falls_back_to_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("searchString", "12345"))
            .and(query_param("searchcatalogbtn", "Искать"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div class=\"textBlue\">ГОСТ 12345-67\nУдалённый</div>"))
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, pool) = pool_with(&[GostRecord::new("ГОСТ 1-1", "")]);
        let http = HttpFetcher::with_retry(RetryConfig::none()).unwrap();
        let url = format!("{}/search", server.uri());

        let local = find_gosts(&pool, &http, Some(&url), "ГОСТ 1-1", 10).await.unwrap();
        assert_eq!(local, vec![GostRecord::new("ГОСТ 1-1", "")]);

        let remote = find_gosts(&pool, &http, Some(&url), "12345", 10).await.unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].name, "ГОСТ 12345-67");

        assert!(find_gosts(&pool, &http, None, "12345", 10).await.unwrap().is_empty());
    }
}
