//! Cache entries repository: TTL lookups over provider payloads

use crate::CacheResult;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

/// A single cached payload
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheEntry {
    pub cache_key: String,
    pub kind: String,
    pub payload: String,
    /// Unix seconds
    pub stored_at: i64,
}

/// Aggregated stats for the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: i64,
    pub distinct_kinds: i64,
    pub oldest_stored_at: Option<i64>,
    pub newest_stored_at: Option<i64>,
}

/// Build a stable cache key from a payload kind and its request parameters.
///
/// Parameters are sorted by name first, so `[("a", "1"), ("b", "2")]` and
/// `[("b", "2"), ("a", "1")]` produce the same key.
pub fn cache_key(kind: &str, params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));

    let mut raw = String::from(kind);
    for (name, value) in sorted {
        raw.push('|');
        raw.push_str(name);
        raw.push('=');
        raw.push_str(value);
    }

    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// Repository for cached payloads
pub struct CacheRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CacheRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch an entry if it was stored within `ttl`
    pub async fn get(&self, key: &str, ttl: Duration) -> CacheResult<Option<CacheEntry>> {
        let cutoff = Utc::now().timestamp() - ttl.num_seconds();

        let entry = sqlx::query_as::<_, CacheEntry>(
            r#"
            SELECT cache_key, kind, payload, stored_at
            FROM cache_entries
            WHERE cache_key = ? AND stored_at >= ?
            "#,
        )
        .bind(key)
        .bind(cutoff)
        .fetch_optional(self.pool)
        .await?;

        debug!(key = %key, hit = entry.is_some(), "Cache lookup");
        Ok(entry)
    }

    /// Fetch and decode a JSON payload if it is still fresh
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        ttl: Duration,
    ) -> CacheResult<Option<T>> {
        match self.get(key, ttl).await? {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.payload)?)),
            None => Ok(None),
        }
    }

    /// Store a payload stamped with the current time (upsert)
    pub async fn put(&self, key: &str, kind: &str, payload: &str) -> CacheResult<()> {
        self.put_at(key, kind, payload, Utc::now().timestamp()).await
    }

    /// Store a payload with an explicit timestamp (upsert)
    pub async fn put_at(
        &self,
        key: &str,
        kind: &str,
        payload: &str,
        stored_at: i64,
    ) -> CacheResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cache_entries (cache_key, kind, payload, stored_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                kind = excluded.kind,
                payload = excluded.payload,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(key)
        .bind(kind)
        .bind(payload)
        .bind(stored_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Encode a value as JSON and store it
    pub async fn put_json<T: Serialize>(&self, key: &str, kind: &str, value: &T) -> CacheResult<()> {
        let payload = serde_json::to_string(value)?;
        self.put(key, kind, &payload).await
    }

    /// Remove one entry. Returns whether a row was deleted.
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE cache_key = ?")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every entry older than `ttl`
    pub async fn purge_expired(&self, ttl: Duration) -> CacheResult<u64> {
        let cutoff = Utc::now().timestamp() - ttl.num_seconds();

        let result = sqlx::query("DELETE FROM cache_entries WHERE stored_at < ?")
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        Ok(purged)
    }

    pub async fn stats(&self) -> CacheResult<CacheStats> {
        let row: (i64, i64, Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(DISTINCT kind),
                MIN(stored_at),
                MAX(stored_at)
            FROM cache_entries
            "#,
        )
        .fetch_one(self.pool)
        .await?;

        Ok(CacheStats {
            total_entries: row.0,
            distinct_kinds: row.1,
            oldest_stored_at: row.2,
            newest_stored_at: row.3,
        })
    }
}
