//! Durable session snapshot, sqlite-backed.
//!
//! The whole authenticated state is serialized as one JSON blob stored under a
//! fixed namespace key, so the schema never has to chase session field
//! changes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use crate::store::SessionSnapshot;

/// Fixed namespace key for the persisted session row.
const NAMESPACE: &str = "auth-storage";

/// Sqlite-backed persistence for the session store.
///
/// Cheap to clone; the pool is initialized lazily on first use.
#[derive(Debug, Clone)]
pub struct SessionPersistence {
    pool: Arc<Mutex<Option<SqlitePool>>>,
    db_path: PathBuf,
}

impl SessionPersistence {
    /// Persistence rooted at an explicit database path (tests use this).
    pub fn open(db_path: impl Into<PathBuf>) -> Self {
        Self {
            pool: Arc::new(Mutex::new(None)),
            db_path: db_path.into(),
        }
    }

    /// Persistence at the default per-user location:
    /// `{app_data_dir}/bluemine/session.db`.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::open(default_db_path()?))
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session directory at {:?}", parent))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", self.db_path.to_string_lossy());

        let pool = SqlitePool::connect(&db_url)
            .await
            .with_context(|| format!("failed to open session database at {:?}", self.db_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_store (
                namespace  TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                saved_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create session_store table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        pool_guard
            .as_ref()
            .cloned()
            .context("session database pool disappeared after initialization")
    }

    /// Upsert the current snapshot under the namespace key.
    pub async fn save(&self, snapshot: &SessionSnapshot) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;
        let data =
            serde_json::to_string(snapshot).context("failed to serialize session snapshot")?;
        let saved_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO session_store (namespace, data, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace)
            DO UPDATE SET
                data = excluded.data,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(NAMESPACE)
        .bind(&data)
        .bind(&saved_at)
        .execute(&pool)
        .await
        .context("failed to upsert session snapshot")?;

        Ok(())
    }

    /// Load the persisted snapshot, if any.
    pub async fn load(&self) -> anyhow::Result<Option<SessionSnapshot>> {
        let pool = self.get_pool().await?;

        let row = sqlx::query(
            r#"
            SELECT data
            FROM session_store
            WHERE namespace = ?1
            "#,
        )
        .bind(NAMESPACE)
        .fetch_optional(&pool)
        .await
        .context("failed to fetch session snapshot")?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let data: String = row.try_get("data")?;
        let snapshot: SessionSnapshot =
            serde_json::from_str(&data).context("invalid persisted session snapshot")?;

        Ok(Some(snapshot))
    }

    /// Remove the persisted snapshot.
    pub async fn clear(&self) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;

        sqlx::query(
            r#"
            DELETE FROM session_store
            WHERE namespace = ?1
            "#,
        )
        .bind(NAMESPACE)
        .execute(&pool)
        .await
        .context("failed to clear session snapshot")?;

        Ok(())
    }
}

/// Resolve the default session database path.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory")?;

    let mut path = base;
    path.push("bluemine");
    path.push("session.db");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluemine_auth::{PermissionKey, Role};

    fn sample_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            access_token: Some("a-token".to_string()),
            refresh_token: Some("r-token".to_string()),
            role: Some(Role::new("manager")),
            permissions: vec![PermissionKey::new("projects"), PermissionKey::new("tasks")],
            user: Some(crate::UserProfile {
                name: Some("Ada".to_string()),
                avatar_url: None,
            }),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let persist = SessionPersistence::open(dir.path().join("session.db"));

        persist.save(&sample_snapshot()).await.unwrap();
        let loaded = persist.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample_snapshot());
    }

    #[tokio::test]
    async fn save_overwrites_the_namespace_row() {
        let dir = tempfile::tempdir().unwrap();
        let persist = SessionPersistence::open(dir.path().join("session.db"));

        persist.save(&sample_snapshot()).await.unwrap();
        persist.save(&SessionSnapshot::default()).await.unwrap();

        let loaded = persist.load().await.unwrap().unwrap();
        assert_eq!(loaded, SessionSnapshot::default());
    }

    #[tokio::test]
    async fn load_on_fresh_database_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let persist = SessionPersistence::open(dir.path().join("session.db"));
        assert!(persist.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let persist = SessionPersistence::open(dir.path().join("session.db"));

        persist.save(&sample_snapshot()).await.unwrap();
        persist.clear().await.unwrap();
        assert!(persist.load().await.unwrap().is_none());
    }
}
