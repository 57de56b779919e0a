//! SQLite-backed record store.
//!
//! Every handle reads and writes the database directly, so several processes
//! pointed at the same file share one set of records. Saves are row-level
//! upserts keyed on (city, country); the last write wins.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use crate::{
    error::StoreError,
    model::{RecordKey, WeatherRecord},
};

use super::WeatherStore;

/// How long a write waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        let conn = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || open_connection(&path))
                .await
                .map_err(|e| StoreError::Unavailable(format!("store task failed: {e}")))??
        };

        tracing::debug!(path = %path.display(), "opened weather store");

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database (for testing).
    #[cfg(test)]
    fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 =
                conn.query_row("SELECT COUNT(*) FROM weather_records", [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or_default())
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {e}")))?
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// An absent country is stored as `''` so the primary key stays unique.
fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS weather_records (
            city TEXT NOT NULL,
            country TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL,
            PRIMARY KEY (city, country)
        );
        "#,
    )?;
    Ok(())
}

#[async_trait]
impl WeatherStore for SqliteStore {
    async fn find_by_city_and_country(
        &self,
        key: &RecordKey,
    ) -> Result<Option<WeatherRecord>, StoreError> {
        let key = key.clone();
        self.with_conn(move |conn| {
            let description: Option<String> = conn
                .query_row(
                    "SELECT description FROM weather_records WHERE city = ?1 AND country = ?2",
                    params![key.city, key.country.as_deref().unwrap_or("")],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(description.map(|d| WeatherRecord::new(key, d)))
        })
        .await
    }

    async fn save(&self, record: WeatherRecord) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO weather_records (city, country, description)
                VALUES (?1, ?2, ?3)
                "#,
                params![
                    record.city,
                    record.country.as_deref().unwrap_or(""),
                    record.description,
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn find(store: &SqliteStore, city: &str, country: Option<&str>) -> Option<String> {
        store
            .find_by_city_and_country(&RecordKey::new(city, country))
            .await
            .unwrap()
            .map(|r| r.description)
    }

    #[tokio::test]
    async fn handles_on_one_file_see_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");

        let a = SqliteStore::open(path.clone()).await.unwrap();
        let b = SqliteStore::open(path.clone()).await.unwrap();

        a.save(WeatherRecord::new(RecordKey::new("London", Some("gb")), "good"))
            .await
            .unwrap();
        assert_eq!(find(&b, "London", Some("gb")).await.as_deref(), Some("good"));

        b.save(WeatherRecord::new(RecordKey::new("Paris", Some("fr")), "mist"))
            .await
            .unwrap();
        assert_eq!(find(&a, "Paris", Some("fr")).await.as_deref(), Some("mist"));
        assert_eq!(find(&a, "London", Some("gb")).await.as_deref(), Some("good"));

        drop((a, b));
        let reopened = SqliteStore::open(path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(find(&reopened, "London", Some("gb")).await.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn last_write_wins_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        let a = SqliteStore::open(path.clone()).await.unwrap();
        let b = SqliteStore::open(path).await.unwrap();
        let key = RecordKey::new("Lima", Some("pe"));

        a.save(WeatherRecord::new(key.clone(), "haze")).await.unwrap();
        b.save(WeatherRecord::new(key.clone(), "drizzle")).await.unwrap();

        assert_eq!(find(&a, "Lima", Some("pe")).await.as_deref(), Some("drizzle"));
        assert_eq!(a.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn absent_and_present_country_are_separate_rows() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .save(WeatherRecord::new(RecordKey::new("Springfield", None), "fog"))
            .await
            .unwrap();
        store
            .save(WeatherRecord::new(RecordKey::new("Springfield", Some("us")), "clear sky"))
            .await
            .unwrap();

        assert_eq!(find(&store, "Springfield", Some("")).await.as_deref(), Some("fog"));
        assert_eq!(find(&store, "Springfield", Some("us")).await.as_deref(), Some("clear sky"));
        assert_eq!(find(&store, "Springfield", Some("ca")).await, None);

        let bare = store
            .find_by_city_and_country(&RecordKey::new("Springfield", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bare.country, None);
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");

        let store = SqliteStore::open(path.clone()).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn non_database_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        std::fs::write(&path, "plain text, not a database file, long enough to hold a header")
            .unwrap();

        let err = SqliteStore::open(path).await.unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
