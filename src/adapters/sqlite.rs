//! SQLite StreamRepository implementation.

use crate::domain::stream::{InvalidVideoId, StreamRecord, VideoId};
use crate::ports::repository::{RepositoryError, StreamRepository};
use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::warn;

// Column name kept from the databases written by earlier versions of the service.
const STREAM_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS streams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    videoId TEXT UNIQUE
);";

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA busy_timeout = 5000;\n",
    )
}

/// Stream records stored in a SQLite file.
///
/// Every call opens its own connection on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteStreamRepository {
    path: PathBuf,
    flags: OpenFlags,
}

impl SqliteStreamRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            flags: OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        }
    }

    /// Create the `streams` table if it does not exist yet.
    pub async fn initialize(&self) -> Result<(), RepositoryError> {
        self.with_connection(|conn| conn.execute_batch(STREAM_SCHEMA))
            .await
    }

    /// Delete rows whose `videoId` is not a valid video id, such as pasted
    /// URLs stored by earlier versions of the service. Returns how many were removed.
    pub async fn purge_invalid(&self) -> Result<usize, RepositoryError> {
        self.with_connection(|conn| {
            let rows = all_rows(conn)?;
            let mut purged = 0;
            for (id, raw) in rows {
                if let Err(e) = parse_stored(raw.as_deref()) {
                    warn!(
                        id,
                        video_id = ?raw,
                        error = %e,
                        "deleting stream record with invalid video id"
                    );
                    purged += conn.execute("DELETE FROM streams WHERE id = ?1", params![id])?;
                }
            }
            Ok(purged)
        })
        .await
    }

    fn open(path: &Path, flags: OpenFlags) -> Result<Connection, RepositoryError> {
        let conn =
            Connection::open_with_flags(path, flags).map_err(|source| RepositoryError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        configure_connection(&conn).map_err(|source| RepositoryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(conn)
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let flags = self.flags;
        tokio::task::spawn_blocking(move || -> Result<T, RepositoryError> {
            let conn = Self::open(&path, flags)?;
            Ok(f(&conn)?)
        })
        .await?
    }
}

fn all_rows(conn: &Connection) -> rusqlite::Result<Vec<(i64, Option<String>)>> {
    let mut stmt = conn.prepare("SELECT id, videoId FROM streams ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// The column has no constraint beyond UNIQUE, so it may hold NULL or arbitrary text.
fn parse_stored(raw: Option<&str>) -> Result<VideoId, InvalidVideoId> {
    VideoId::parse(raw.unwrap_or_default())
}

#[async_trait]
impl StreamRepository for SqliteStreamRepository {
    async fn insert(&self, video_id: &VideoId) -> Result<(), RepositoryError> {
        let video_id = video_id.to_string();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO streams (videoId) VALUES (?1)",
                params![video_id],
            )
            .map(|_| ())
        })
        .await
    }

    async fn remove(&self, video_id: &VideoId) -> Result<bool, RepositoryError> {
        let video_id = video_id.to_string();
        self.with_connection(move |conn| {
            conn.execute("DELETE FROM streams WHERE videoId = ?1", params![video_id])
                .map(|deleted| deleted > 0)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<StreamRecord>, RepositoryError> {
        self.with_connection(|conn| {
            let records = all_rows(conn)?
                .into_iter()
                .filter_map(|(id, raw)| match parse_stored(raw.as_deref()) {
                    Ok(video_id) => Some(StreamRecord { id, video_id }),
                    Err(e) => {
                        warn!(
                            id,
                            video_id = ?raw,
                            error = %e,
                            "skipping stream record with invalid video id"
                        );
                        None
                    }
                })
                .collect();
            Ok(records)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    async fn repository(dir: &Path) -> SqliteStreamRepository {
        let repo = SqliteStreamRepository::new(dir.join("streams.db"));
        repo.initialize().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path()).await;

        repo.insert(&id("abc123")).await.unwrap();
        repo.insert(&id("abc123")).await.unwrap();

        let records = repo.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video_id, id("abc123"));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path()).await;

        for raw in ["zzz", "aaa", "mmm"] {
            repo.insert(&id(raw)).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.video_id.to_string())
            .collect();
        assert_eq!(ids, vec!["zzz", "aaa", "mmm"]);
    }

    #[tokio::test]
    async fn test_remove_reports_whether_deleted() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path()).await;
        repo.insert(&id("abc123")).await.unwrap();

        assert!(repo.remove(&id("abc123")).await.unwrap());
        assert!(!repo.remove(&id("abc123")).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        repository(dir.path())
            .await
            .insert(&id("persisted"))
            .await
            .unwrap();

        let reopened = repository(dir.path()).await;
        let records = reopened.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video_id.as_str(), "persisted");
        assert!(records[0].id > 0);
    }

    fn insert_raw(dir: &Path, raw: Option<&str>) {
        let conn = Connection::open(dir.join("streams.db")).unwrap();
        conn.execute("INSERT INTO streams (videoId) VALUES (?1)", params![raw])
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_skips_invalid_rows() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path()).await;
        repo.insert(&id("good")).await.unwrap();
        insert_raw(dir.path(), Some("https://youtu.be/abc"));
        insert_raw(dir.path(), None);
        repo.insert(&id("later")).await.unwrap();

        let ids: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.video_id.to_string())
            .collect();
        assert_eq!(ids, vec!["good", "later"]);
    }

    #[tokio::test]
    async fn test_purge_invalid_deletes_only_invalid_rows() {
        let dir = tempdir().unwrap();
        let repo = repository(dir.path()).await;
        repo.insert(&id("good")).await.unwrap();
        insert_raw(dir.path(), Some("https://youtu.be/abc"));
        insert_raw(dir.path(), None);

        assert_eq!(repo.purge_invalid().await.unwrap(), 2);
        assert_eq!(repo.purge_invalid().await.unwrap(), 0);

        let conn = Connection::open(dir.path().join("streams.db")).unwrap();
        let remaining: Vec<Option<String>> = conn
            .prepare("SELECT videoId FROM streams")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(remaining, vec![Some("good".to_string())]);
    }

    #[tokio::test]
    async fn test_open_failure_is_reported() {
        let dir = tempdir().unwrap();
        let repo = SqliteStreamRepository::new(dir.path().join("missing/dir/streams.db"));

        let result = repo.initialize().await;
        assert!(matches!(result, Err(RepositoryError::Open { .. })));
    }
}
