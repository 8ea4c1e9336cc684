// SQLite sample store. One append-only metric_samples table, indexed by
// timestamp; reads return rows newest-first.

use crate::models::MetricSample;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("database: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub struct SampleRepo {
    pool: SqlitePool,
}

impl SampleRepo {
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metric_samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                cpu_percent REAL NOT NULL,
                memory_percent REAL NOT NULL,
                memory_used_bytes INTEGER NOT NULL,
                memory_total_bytes INTEGER NOT NULL,
                disk_percent REAL NOT NULL,
                disk_used_bytes INTEGER NOT NULL,
                disk_total_bytes INTEGER NOT NULL,
                uptime_seconds INTEGER NOT NULL,
                network_latency_ms REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_samples_timestamp ON metric_samples(timestamp)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, sample), fields(repo = "samples", operation = "insert_sample", timestamp = sample.timestamp))]
    pub async fn insert_sample(&self, sample: &MetricSample) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO metric_samples (
                timestamp, cpu_percent, memory_percent, memory_used_bytes,
                memory_total_bytes, disk_percent, disk_used_bytes, disk_total_bytes,
                uptime_seconds, network_latency_ms
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(sample.timestamp)
        .bind(sample.cpu_percent)
        .bind(sample.memory_percent)
        .bind(sample.memory_used_bytes as i64)
        .bind(sample.memory_total_bytes as i64)
        .bind(sample.disk_percent)
        .bind(sample.disk_used_bytes as i64)
        .bind(sample.disk_total_bytes as i64)
        .bind(sample.uptime_seconds as i64)
        .bind(sample.network_latency_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All samples, newest first. Each call re-reads the table.
    #[instrument(skip(self), fields(repo = "samples", operation = "all_samples"))]
    pub async fn all_samples(&self) -> Result<Vec<MetricSample>, StoreError> {
        let rows = sqlx::query(
            "SELECT timestamp, cpu_percent, memory_percent, memory_used_bytes,
                    memory_total_bytes, disk_percent, disk_used_bytes, disk_total_bytes,
                    uptime_seconds, network_latency_ms
             FROM metric_samples ORDER BY timestamp DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(parse_sample_row(&row)?);
        }
        Ok(out)
    }

    /// Samples with timestamp >= since_ms, newest first.
    #[instrument(skip(self), fields(repo = "samples", operation = "samples_since"))]
    pub async fn samples_since(&self, since_ms: i64) -> Result<Vec<MetricSample>, StoreError> {
        let rows = sqlx::query(
            "SELECT timestamp, cpu_percent, memory_percent, memory_used_bytes,
                    memory_total_bytes, disk_percent, disk_used_bytes, disk_total_bytes,
                    uptime_seconds, network_latency_ms
             FROM metric_samples WHERE timestamp >= $1 ORDER BY timestamp DESC",
        )
        .bind(since_ms)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(parse_sample_row(&row)?);
        }
        Ok(out)
    }

    /// Delete rows with timestamp < cutoff_ms. Returns the number removed;
    /// a second call with the same cutoff removes zero.
    #[instrument(skip(self), fields(repo = "samples", operation = "delete_older_than"))]
    pub async fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let r = sqlx::query("DELETE FROM metric_samples WHERE timestamp < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM metric_samples")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

fn parse_sample_row(row: &SqliteRow) -> Result<MetricSample, StoreError> {
    let timestamp: i64 = row.try_get("timestamp")?;
    let cpu_percent: f64 = row.try_get("cpu_percent")?;
    let memory_percent: f64 = row.try_get("memory_percent")?;
    let memory_used_bytes: i64 = row.try_get("memory_used_bytes")?;
    let memory_total_bytes: i64 = row.try_get("memory_total_bytes")?;
    let disk_percent: f64 = row.try_get("disk_percent")?;
    let disk_used_bytes: i64 = row.try_get("disk_used_bytes")?;
    let disk_total_bytes: i64 = row.try_get("disk_total_bytes")?;
    let uptime_seconds: i64 = row.try_get("uptime_seconds")?;
    let network_latency_ms: Option<f64> = row.try_get("network_latency_ms")?;

    Ok(MetricSample {
        timestamp,
        cpu_percent,
        memory_percent,
        memory_used_bytes: memory_used_bytes as u64,
        memory_total_bytes: memory_total_bytes as u64,
        disk_percent,
        disk_used_bytes: disk_used_bytes as u64,
        disk_total_bytes: disk_total_bytes as u64,
        uptime_seconds: uptime_seconds as u64,
        network_latency_ms,
    })
}
