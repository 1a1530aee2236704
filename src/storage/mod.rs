use crate::cache::TtlCache;
use anyhow::Context;
use rusqlite::{params, Connection};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// SQLite-backed `TtlCache`. Values are stored as JSON.
pub struct SqliteCache<V> {
    conn: Mutex<Connection>,
    _value: PhantomData<fn() -> V>,
}

impl<V> SqliteCache<V> {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS cache_entries (
  key TEXT PRIMARY KEY,
  value_json TEXT NOT NULL,
  expires_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
        )
        .context("init schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
            _value: PhantomData,
        })
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite cache lock poisoned"))
    }

    /// Drop every expired row; returns how many went.
    pub fn purge_expired(&self) -> anyhow::Result<usize> {
        let removed = self
            .lock()?
            .execute(
                "DELETE FROM cache_entries WHERE expires_at <= ?1",
                params![now_unix()],
            )
            .context("purge expired cache entries")?;
        Ok(removed)
    }
}

impl<V: Serialize + DeserializeOwned> TtlCache<V> for SqliteCache<V> {
    fn get(&self, key: &str) -> anyhow::Result<Option<V>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT value_json, expires_at FROM cache_entries WHERE key=?1")
            .context("prepare cache lookup")?;
        let mut rows = stmt.query(params![key]).context("query cache")?;
        if let Some(row) = rows.next().context("read cache row")? {
            let json: String = row.get(0)?;
            let exp: i64 = row.get(1)?;
            if exp > now_unix() {
                let value = serde_json::from_str(&json)
                    .with_context(|| format!("decode cached value for {key}"))?;
                Ok(Some(value))
            } else {
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    fn put(&self, key: &str, value: V, ttl: Duration) -> anyhow::Result<()> {
        let json = serde_json::to_string(&value).context("encode cache value")?;
        let now = now_unix();
        let expires_at = now.saturating_add(ttl.as_secs() as i64);
        self.lock()?
            .execute(
                r#"
INSERT INTO cache_entries(key, value_json, expires_at, updated_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(key) DO UPDATE SET
  value_json=excluded.value_json,
  expires_at=excluded.expires_at,
  updated_at=excluded.updated_at
"#,
                params![key, json, expires_at, now],
            )
            .context("write cache entry")?;
        Ok(())
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_overwrite() {
        let cache: SqliteCache<Vec<String>> = SqliteCache::open_in_memory().unwrap();
        let ttl = Duration::from_secs(300);
        cache.put("chart:10", vec!["a".into()], ttl).unwrap();
        cache.put("chart:10", vec!["b".into(), "c".into()], ttl).unwrap();
        assert_eq!(
            cache.get("chart:10").unwrap(),
            Some(vec!["b".to_string(), "c".to_string()])
        );
        assert_eq!(cache.get("chart:5").unwrap(), None);
    }

    #[test]
    fn test_expired_rows_miss_and_purge() {
        let cache: SqliteCache<u32> = SqliteCache::open_in_memory().unwrap();
        cache.put("stale", 1, Duration::ZERO).unwrap();
        cache.put("fresh", 2, Duration::from_secs(300)).unwrap();
        assert_eq!(cache.get("stale").unwrap(), None);
        assert_eq!(cache.get("fresh").unwrap(), Some(2));
        assert_eq!(cache.purge_expired().unwrap(), 1);
    }
}
