//! Persisted exact-match query cache.
//!
//! A single JSON document mapping query strings to previously synthesized
//! plans. Lookup is case-insensitive exact match, first match wins. Inserts
//! append and rewrite the whole file; store size is bounded by the number of
//! distinct troubleshooting queries issued, so no eviction or TTL exists.
//!
//! A malformed cache file is fatal (`AppError::CacheCorrupt`); it is never
//! silently reset. Delete the file to recover.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use techmate_core::{AppError, AppResult};
use techmate_llm::TroubleshootingPlan;

/// One cached (query, plan) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Query text as originally submitted (matching is case-insensitive)
    pub query: String,

    /// The synthesized plan
    pub answer: TroubleshootingPlan,

    /// When the entry was written; absent in stores written by older builds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

/// The in-memory image of the persisted store.
///
/// Uniqueness is not enforced; duplicate queries may accumulate and lookup
/// returns the first match in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStore {
    #[serde(default)]
    pub queries: Vec<CacheEntry>,
}

impl CacheStore {
    /// Find the cached plan for `query`, if any.
    ///
    /// Case-insensitive exact match; first match wins.
    pub fn lookup(&self, query: &str) -> Option<&TroubleshootingPlan> {
        self.queries
            .iter()
            .find(|entry| entry.query.eq_ignore_ascii_case(query))
            .map(|entry| &entry.answer)
    }

    /// Number of entries (duplicates included).
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Handle on the persisted cache file.
#[derive(Debug, Clone)]
pub struct QueryCache {
    path: PathBuf,
}

impl QueryCache {
    /// Create a cache handle for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the persisted store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted store.
    ///
    /// A missing file is an empty store. A present-but-malformed file is
    /// `AppError::CacheCorrupt`.
    pub fn load(&self) -> AppResult<CacheStore> {
        if !self.path.exists() {
            return Ok(CacheStore::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let store: CacheStore = serde_json::from_str(&contents).map_err(|e| {
            AppError::CacheCorrupt(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            entries = store.queries.len(),
            path = %self.path.display(),
            "Loaded query cache"
        );

        Ok(store)
    }

    /// Persist the whole store, creating parent directories as needed.
    pub fn save(&self, store: &CacheStore) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(store)?;
        std::fs::write(&self.path, contents)?;

        Ok(())
    }

    /// Append a new entry and persist the entire store.
    ///
    /// Full-file rewrite, not an incremental append. Existing entries for
    /// the same query are left in place; the new one never shadows them
    /// because lookup takes the first match.
    pub fn insert(
        &self,
        store: &mut CacheStore,
        query: &str,
        answer: &TroubleshootingPlan,
    ) -> AppResult<()> {
        store.queries.push(CacheEntry {
            query: query.to_string(),
            answer: answer.clone(),
            cached_at: Some(Utc::now()),
        });

        self.save(store)?;

        tracing::info!(query, entries = store.queries.len(), "Cached plan");
        Ok(())
    }
}
