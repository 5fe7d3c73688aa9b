use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::info;

use crate::models::SessionRecord;

/// Aggregate statistics over stored sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub sessions: i64,
    pub alerts: i64,
    pub seconds: i64,
}

impl SessionTotals {
    pub fn average_alerts(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.alerts as f64 / self.sessions as f64
        }
    }
}

/// SQLite log of finished sessions
pub struct SessionStore {
    pool: Pool<Sqlite>,
}

impl SessionStore {
    /// Create a new session store and initialize the database
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Each connection to an in-memory database sees its own database
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Session store initialized");
        Ok(store)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                alerts INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create sessions table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_sessions_started
            ON sessions (started_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append a finished session
    pub async fn insert_session(&self, session: &SessionRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (
                started_at,
                ended_at,
                duration_seconds,
                alerts
            ) VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(timestamp(&session.started_at))
        .bind(timestamp(&session.ended_at))
        .bind(session.duration_seconds)
        .bind(i64::from(session.alerts))
        .execute(&self.pool)
        .await
        .context("Failed to insert session")?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent sessions, newest first
    pub async fn recent_sessions(&self, limit: i64) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT * FROM sessions
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch sessions")?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Totals over all sessions
    pub async fn totals(&self) -> Result<SessionTotals> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(alerts), 0), COALESCE(SUM(duration_seconds), 0)
            FROM sessions
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to aggregate sessions")?;

        Ok(row.into())
    }

    /// Totals over sessions started at or after `since`
    pub async fn totals_since(&self, since: DateTime<Utc>) -> Result<SessionTotals> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(alerts), 0), COALESCE(SUM(duration_seconds), 0)
            FROM sessions
            WHERE started_at >= ?
            "#,
        )
        .bind(timestamp(&since))
        .fetch_one(&self.pool)
        .await
        .context("Failed to aggregate sessions")?;

        Ok(row.into())
    }

    /// Delete every stored session; returns the number removed
    pub async fn clear(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions")
            .execute(&self.pool)
            .await
            .context("Failed to clear sessions")?;

        Ok(result.rows_affected())
    }
}

impl From<(i64, i64, i64)> for SessionTotals {
    fn from((sessions, alerts, seconds): (i64, i64, i64)) -> Self {
        Self {
            sessions,
            alerts,
            seconds,
        }
    }
}

/// Fixed-width UTC timestamps so text comparison follows time order
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Database row representation
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    started_at: String,
    ended_at: String,
    duration_seconds: i64,
    alerts: i64,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        SessionRecord {
            id: Some(row.id),
            started_at: parse_timestamp(&row.started_at),
            ended_at: parse_timestamp(&row.ended_at),
            duration_seconds: row.duration_seconds,
            alerts: u32::try_from(row.alerts).unwrap_or(0),
        }
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn session(started_at: DateTime<Utc>, minutes: i64, alerts: u32) -> SessionRecord {
        SessionRecord::new(started_at, started_at + Duration::minutes(minutes), alerts)
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let start = Utc::now() - Duration::hours(1);

        let id = store.insert_session(&session(start, 20, 48)).await.unwrap();
        let sessions = store.recent_sessions(10).await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, Some(id));
        assert_eq!(sessions[0].duration_seconds, 20 * 60);
        assert_eq!(sessions[0].alerts, 48);
    }

    #[tokio::test]
    async fn test_totals_on_empty_store() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let totals = store.totals().await.unwrap();

        assert_eq!(totals, SessionTotals::default());
        assert_eq!(totals.average_alerts(), 0.0);
    }

    #[tokio::test]
    async fn test_totals_since_filters_by_start() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        store
            .insert_session(&session(now - Duration::days(10), 30, 60))
            .await
            .unwrap();
        store
            .insert_session(&session(now - Duration::days(2), 10, 20))
            .await
            .unwrap();
        store
            .insert_session(&session(now - Duration::hours(1), 5, 10))
            .await
            .unwrap();

        let all = store.totals().await.unwrap();
        assert_eq!(all.sessions, 3);
        assert_eq!(all.alerts, 90);
        assert_eq!(all.seconds, 45 * 60);
        assert_eq!(all.average_alerts(), 30.0);

        let week = store.totals_since(now - Duration::days(7)).await.unwrap();
        assert_eq!(week.sessions, 2);
        assert_eq!(week.alerts, 30);

        let recent = store.recent_sessions(1).await.unwrap();
        assert_eq!(recent[0].alerts, 10);
    }

    #[tokio::test]
    async fn test_clear_removes_all_sessions() {
        let store = SessionStore::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        store.insert_session(&session(now, 10, 20)).await.unwrap();
        store.insert_session(&session(now, 5, 8)).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.totals().await.unwrap(), SessionTotals::default());
        assert!(store.recent_sessions(10).await.unwrap().is_empty());

        // Logging continues after a reset
        store.insert_session(&session(now, 1, 3)).await.unwrap();
        assert_eq!(store.totals().await.unwrap().alerts, 3);
    }
}
