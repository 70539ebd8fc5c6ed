use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::core::error::AppResult;
use crate::sources::GostRecord;

/// Стандарт из каталога.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gost {
    /// Первичный ключ
    pub id: i64,
    /// Обозначение стандарта, например "ГОСТ 20909.1-75"
    pub name: String,
    /// Описание (может быть пустым)
    pub description: String,
    /// Источник, из которого запись попала в каталог
    pub source: Option<String>,
    /// Время добавления (SQLite CURRENT_TIMESTAMP)
    pub created_at: String,
}

impl Gost {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            source: row.get("source")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl From<Gost> for GostRecord {
    fn from(gost: Gost) -> Self {
        GostRecord::new(gost.name, gost.description)
    }
}

impl fmt::Display for Gost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const GOST_COLUMNS: &str = "id, name, description, source, created_at";

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and applies schema migrations.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// let pool = gostbot::storage::create_pool("gosts.db")?;
/// # Ok::<(), gostbot::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|c| c.busy_timeout(Duration::from_secs(5)));
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    super::migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Добавляет стандарт, если стандарта с таким именем ещё нет.
///
/// # Returns
///
/// `true` если запись была добавлена, `false` если имя уже есть в каталоге
/// (существующее описание не меняется).
pub fn insert_gost_if_absent(conn: &Connection, record: &GostRecord, source: Option<&str>) -> AppResult<bool> {
    let name = record.name.trim();
    if name.is_empty() {
        return Ok(false);
    }
    let description = record.description.trim();

    let changed = conn.execute(
        "INSERT OR IGNORE INTO gosts (name, description, name_lower, description_lower, source)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, description, name.to_lowercase(), description.to_lowercase(), source],
    )?;

    Ok(changed == 1)
}

/// Сохраняет пачку записей в одной транзакции.
///
/// # Returns
///
/// Количество новых записей.
pub fn save_gosts(conn: &mut Connection, records: &[GostRecord], source: Option<&str>) -> AppResult<usize> {
    let tx = conn.transaction()?;
    let mut count = 0;
    for record in records {
        if insert_gost_if_absent(&tx, record, source)? {
            count += 1;
        }
    }
    tx.commit()?;

    log::info!("Saved {} new GOSTs to database", count);
    Ok(count)
}

/// Ищет стандарт по точному имени.
pub fn find_by_name(conn: &Connection, name: &str) -> AppResult<Option<Gost>> {
    let gost = conn
        .query_row(
            &format!("SELECT {} FROM gosts WHERE name = ?1", GOST_COLUMNS),
            [name.trim()],
            Gost::from_row,
        )
        .optional()?;
    Ok(gost)
}

/// Количество стандартов в каталоге.
pub fn count_gosts(conn: &Connection) -> AppResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM gosts", [], |row| row.get(0))?;
    Ok(count)
}

/// Количество стандартов по источникам, по убыванию.
pub fn count_by_source(conn: &Connection) -> AppResult<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(source, 'unknown') AS src, COUNT(*) AS n
         FROM gosts GROUP BY src ORDER BY n DESC, src",
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Поиск по подстроке без учёта регистра.
///
/// Сначала идут совпадения по имени, затем совпадения только по описанию;
/// каждая запись встречается не больше одного раза.
pub fn search_gosts(conn: &Connection, text: &str, limit: usize) -> AppResult<Vec<Gost>> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let pattern = format!("%{}%", escape_like(&needle));
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(&format!(
        "SELECT {cols},
                CASE WHEN name_lower LIKE ?1 ESCAPE '\\' THEN 0 ELSE 1 END AS rank
         FROM gosts
         WHERE name_lower LIKE ?1 ESCAPE '\\' OR description_lower LIKE ?1 ESCAPE '\\'
         ORDER BY rank, id
         LIMIT ?2",
        cols = GOST_COLUMNS
    ))?;
    let rows = stmt.query_map(params![pattern, limit], Gost::from_row)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Escapes LIKE wildcards so user input is matched literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
