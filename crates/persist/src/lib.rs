//! FFBB response cache: pluggable stores behind one small trait.
//!
//! The cache is an explicit handle built once from [`CacheConfig`] and handed
//! to whoever wraps the transport. Entries are opaque response bodies keyed by
//! request fingerprint; expiry and capacity are enforced by the store.

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use metrics::{counter, histogram};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub trait CacheStore: Send + Sync {
    /// Fresh body for `key`, if any. Expired entries are dropped on read.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, body: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn len(&self) -> Result<usize>;
    fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
    fn backend(&self) -> CacheBackend;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Sqlite,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(CacheBackend::Memory),
            "sqlite" | "disk" | "file" => Ok(CacheBackend::Sqlite),
            "redis" | "kv" => bail!("external key-value cache backend {s:?} is not supported"),
            other => bail!("unknown cache backend {other:?} (memory|sqlite)"),
        }
    }
}

/// Expiry, capacity and encoding shared by every store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorePolicy {
    /// `None` keeps entries until evicted.
    pub ttl_secs: Option<i64>,
    pub max_entries: usize,
    pub compress: bool,
}

impl Default for StorePolicy {
    fn default() -> Self { Self { ttl_secs: Some(3600), max_entries: 1024, compress: false } }
}

impl StorePolicy {
    fn is_fresh(&self, stored_at: i64, now: i64) -> bool {
        match self.ttl_secs {
            None => true,
            Some(ttl) => now - stored_at < ttl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub backend: CacheBackend,
    pub policy: StorePolicy,
    pub key_prefix: String,
    /// SQLite file; defaults to `~/.ffbb/cache.db`.
    pub db_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: false, backend: CacheBackend::Memory, policy: StorePolicy::default(), key_prefix: "ffbb:".into(), db_path: None }
    }
}

impl CacheConfig {
    /// Read `FFBB_CACHE*` and `FFBB_DB_PATH`; unset variables keep their default.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = env("FFBB_CACHE") { cfg.enabled = parse_bool(&v).with_context(|| format!("FFBB_CACHE={v}"))?; }
        if let Some(v) = env("FFBB_CACHE_BACKEND") { cfg.backend = v.parse()?; }
        if let Some(v) = env("FFBB_CACHE_TTL_SECS") {
            let ttl: i64 = v.parse().with_context(|| format!("FFBB_CACHE_TTL_SECS={v}"))?;
            cfg.policy.ttl_secs = if ttl <= 0 { None } else { Some(ttl) };
        }
        if let Some(v) = env("FFBB_CACHE_MAX_ENTRIES") {
            cfg.policy.max_entries = v.parse().with_context(|| format!("FFBB_CACHE_MAX_ENTRIES={v}"))?;
        }
        if let Some(v) = env("FFBB_CACHE_PREFIX") { cfg.key_prefix = v; }
        if let Some(v) = env("FFBB_CACHE_COMPRESS") {
            cfg.policy.compress = parse_bool(&v).with_context(|| format!("FFBB_CACHE_COMPRESS={v}"))?;
        }
        cfg.db_path = env("FFBB_DB_PATH");
        Ok(cfg)
    }

    /// Build the configured store, or `None` when caching is off.
    pub fn open(&self) -> Result<Option<Arc<dyn CacheStore>>> {
        if !self.enabled { return Ok(None); }
        if self.policy.max_entries == 0 { bail!("cache max entries must be positive"); }
        if self.policy.compress && !cfg!(feature = "zstd") {
            warn!("cache compression requested but ffbb-persist was built without zstd; storing plain bodies");
        }
        let store: Arc<dyn CacheStore> = match self.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new(self.policy)),
            CacheBackend::Sqlite => {
                let path = self.db_path.clone().unwrap_or_else(default_db_path);
                Arc::new(SqliteStore::open(&path, self.policy)?)
            }
        };
        debug!(backend = ?self.backend, max_entries = self.policy.max_entries, "cache: store opened");
        Ok(Some(store))
    }
}

fn env(key: &str) -> Option<String> { std::env::var(key).ok().filter(|v| !v.trim().is_empty()) }

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("not a boolean: {other:?}")),
    }
}

// ---------------- In-memory ----------------

struct MemEntry {
    stored_at: i64,
    body: Vec<u8>,
}

#[derive(Default)]
struct MemInner {
    map: FxHashMap<String, MemEntry>,
    order: VecDeque<String>,
    evicted: u64,
}

/// Process-local store with FIFO eviction at `max_entries`.
pub struct MemoryStore {
    inner: Mutex<MemInner>,
    policy: StorePolicy,
}

impl MemoryStore {
    pub fn new(policy: StorePolicy) -> Self { Self { inner: Mutex::new(MemInner::default()), policy } }

    pub fn evicted(&self) -> u64 { self.inner.lock().map(|g| g.evicted).unwrap_or(0) }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemInner>> {
        self.inner.lock().map_err(|_| anyhow!("memory cache lock poisoned"))
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut g = self.lock()?;
        let fresh = match g.map.get(key) {
            None => return Ok(None),
            Some(e) => self.policy.is_fresh(e.stored_at, now_ts()),
        };
        if !fresh {
            g.map.remove(key);
            g.order.retain(|k| k != key);
            counter!("cache_expired_total", 1u64, "backend" => "memory");
            return Ok(None);
        }
        Ok(g.map.get(key).map(|e| maybe_decompress(&e.body)))
    }

    fn put(&self, key: &str, body: &str) -> Result<()> {
        let mut g = self.lock()?;
        if !g.map.contains_key(key) {
            if g.order.len() >= self.policy.max_entries {
                if let Some(old) = g.order.pop_front() {
                    g.map.remove(&old);
                    g.evicted += 1;
                }
            }
            g.order.push_back(key.to_string());
        }
        g.map.insert(key.to_string(), MemEntry { stored_at: now_ts(), body: maybe_compress(body, self.policy.compress) });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut g = self.lock()?;
        g.map.clear();
        g.order.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize> { Ok(self.lock()?.map.len()) }

    fn backend(&self) -> CacheBackend { CacheBackend::Memory }
}

// ---------------- SQLite ----------------

/// SQLite-backed store. Simple, synchronous; one connection behind a mutex.
pub struct SqliteStore {
    db: Mutex<rusqlite::Connection>,
    policy: StorePolicy,
}

impl SqliteStore {
    pub fn open(path: &str, policy: StorePolicy) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path).with_context(|| format!("opening sqlite db at {}", path))?;
        db.pragma_update(None, "journal_mode", "WAL").ok();
        db.pragma_update(None, "synchronous", "NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS response_cache (
                key  TEXT PRIMARY KEY,
                ts   INTEGER NOT NULL,
                body BLOB NOT NULL
            )",
            [],
        )
        .context("creating response_cache table")?;
        db.execute("CREATE INDEX IF NOT EXISTS idx_response_cache_ts ON response_cache(ts)", []).ok();
        histogram!("persist_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(Self { db: Mutex::new(db), policy })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.db.lock().map_err(|_| anyhow!("sqlite cache lock poisoned"))
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let started = std::time::Instant::now();
        let db = self.lock()?;
        let mut stmt = db.prepare("SELECT ts, body FROM response_cache WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        let Some(row) = rows.next()? else { return Ok(None) };
        let ts: i64 = row.get(0)?;
        let body: Vec<u8> = row.get(1)?;
        drop(rows);
        drop(stmt);
        if !self.policy.is_fresh(ts, now_ts()) {
            db.execute("DELETE FROM response_cache WHERE key = ?1", [key])?;
            counter!("cache_expired_total", 1u64, "backend" => "sqlite");
            return Ok(None);
        }
        histogram!("persist_get_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(Some(maybe_decompress(&body)))
    }

    fn put(&self, key: &str, body: &str) -> Result<()> {
        let started = std::time::Instant::now();
        let mut db = self.lock()?;
        let tx = db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO response_cache(key, ts, body) VALUES (?1, ?2, ?3)",
            (key, now_ts(), maybe_compress(body, self.policy.compress)),
        )?;
        // Keep the newest `max_entries` rows (delete older rows by rowid)
        tx.execute(
            "DELETE FROM response_cache
             WHERE rowid NOT IN (
                 SELECT rowid FROM response_cache ORDER BY ts DESC, rowid DESC LIMIT ?1
             )",
            [self.policy.max_entries as i64],
        )?;
        tx.commit()?;
        histogram!("persist_put_ms", started.elapsed().as_secs_f64() * 1000.0);
        counter!("persist_put_total", 1u64);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.execute("DELETE FROM response_cache", [])?;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let n: i64 = self.lock()?.query_row("SELECT COUNT(*) FROM response_cache", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    fn backend(&self) -> CacheBackend { CacheBackend::Sqlite }
}

fn default_db_path() -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let mut p = std::path::PathBuf::from(home);
        p.push(".ffbb");
        let _ = std::fs::create_dir_all(&p);
        p.push("cache.db");
        return p.to_string_lossy().to_string();
    }
    "ffbb-cache.db".to_string()
}

pub fn now_ts() -> i64 {
    // seconds since epoch
    let now = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    now.as_secs() as i64
}

pub fn maybe_compress(body: &str, enabled: bool) -> Vec<u8> {
    #[cfg(feature = "zstd")]
    {
        if enabled {
            let lvl: i32 = std::env::var("FFBB_ZSTD_LEVEL").ok().and_then(|s| s.parse().ok()).unwrap_or(3);
            return zstd::encode_all(body.as_bytes(), lvl).unwrap_or_else(|_| body.as_bytes().to_vec());
        }
    }
    #[cfg(not(feature = "zstd"))]
    let _ = enabled;
    body.as_bytes().to_vec()
}

pub fn maybe_decompress(blob: &[u8]) -> String {
    #[cfg(feature = "zstd")]
    {
        if let Ok(de) = zstd::decode_all(std::io::Cursor::new(blob)) {
            return String::from_utf8_lossy(&de).to_string();
        }
    }
    String::from_utf8_lossy(blob).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> String {
        let dir = std::env::temp_dir();
        let f = format!("ffbb-test-{}.db", std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos());
        dir.join(f).to_string_lossy().to_string()
    }

    fn policy(max_entries: usize) -> StorePolicy { StorePolicy { ttl_secs: None, max_entries, compress: true } }

    #[test]
    fn memory_put_get_evicts_fifo() {
        let s = MemoryStore::new(policy(2));
        s.put("a", "1").unwrap();
        s.put("b", "2").unwrap();
        s.put("a", "1bis").unwrap();
        s.put("c", "3").unwrap();
        assert_eq!(s.get("a").unwrap(), None);
        assert_eq!(s.get("b").unwrap().as_deref(), Some("2"));
        assert_eq!(s.get("c").unwrap().as_deref(), Some("3"));
        assert_eq!(s.len().unwrap(), 2);
        assert_eq!(s.evicted(), 1);
        s.clear().unwrap();
        assert!(s.is_empty().unwrap());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let s = MemoryStore::new(StorePolicy { ttl_secs: Some(0), max_entries: 4, compress: false });
        s.put("k", "v").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
        assert_eq!(s.len().unwrap(), 0);
    }

    #[test]
    fn sqlite_put_get_trim() {
        let path = temp_db();
        let s = SqliteStore::open(&path, policy(3)).unwrap();
        for i in 0..5 {
            s.put(&format!("k{i}"), &format!("{{\"data\": {i}}}")).unwrap();
        }
        assert_eq!(s.len().unwrap(), 3);
        assert_eq!(s.get("k4").unwrap().as_deref(), Some("{\"data\": 4}"));
        assert_eq!(s.get("k0").unwrap(), None);
        s.put("k4", "replaced").unwrap();
        assert_eq!(s.get("k4").unwrap().as_deref(), Some("replaced"));
        s.clear().unwrap();
        assert_eq!(s.len().unwrap(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn sqlite_expired_rows_are_dropped_on_read() {
        let path = temp_db();
        let s = SqliteStore::open(&path, StorePolicy { ttl_secs: Some(0), max_entries: 8, compress: false }).unwrap();
        s.put("k", "v").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
        assert_eq!(s.len().unwrap(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn backend_parsing() {
        assert_eq!("memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("SQLite".parse::<CacheBackend>().unwrap(), CacheBackend::Sqlite);
        assert!("redis".parse::<CacheBackend>().is_err());
        assert!("mongo".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn disabled_config_opens_nothing() {
        assert!(CacheConfig::default().open().unwrap().is_none());
        let cfg = CacheConfig { enabled: true, ..CacheConfig::default() };
        let store = cfg.open().unwrap().unwrap();
        assert_eq!(store.backend(), CacheBackend::Memory);
    }

    #[test]
    fn compression_round_trips() {
        let blob = maybe_compress("{\"data\": []}", true);
        assert_eq!(maybe_decompress(&blob), "{\"data\": []}");
    }
}
