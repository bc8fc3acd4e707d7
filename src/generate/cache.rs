//! Caller-owned cache for generated artifacts.
//!
//! A long-lived process (a dev server, a watch loop) can keep one
//! [`ArtifactCache`] per artifact kind and pass it into generator calls.
//! Nothing here is global: dropping the cache or calling [`ArtifactCache::clear`]
//! after the registry is reloaded is the caller's responsibility.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Key of one generated artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub project: String,
    pub version: String,
    pub language: String,
    /// Generator settings the output depends on, e.g. the environment
    pub variant: String,
}

impl CacheKey {
    pub fn new(project: &str, version: &str, language: &str) -> Self {
        Self {
            project: project.to_string(),
            version: version.to_string(),
            language: language.to_string(),
            variant: String::new(),
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }
}

fn fresh<V>(ttl: Option<Duration>, entry: &CacheEntry<V>) -> bool {
    ttl.map_or(true, |ttl| entry.stored_at.elapsed() < ttl)
}

fn log_miss(key: &CacheKey) {
    tracing::debug!(
        project = %key.project,
        version = %key.version,
        language = %key.language,
        variant = %key.variant,
        "artifact cache miss"
    );
}

/// Memoized generator output keyed by (project, version, language)
#[derive(Debug, Clone)]
pub struct ArtifactCache<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    ttl: Option<Duration>,
}

impl<V> Default for ArtifactCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ArtifactCache<V> {
    /// Cache whose entries never expire
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            ttl: None,
        }
    }

    /// Cache whose entries expire `ttl` after insertion
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        fresh(self.ttl, entry)
    }

    /// Fresh entry for `key`, if any
    pub fn get(&self, key: &CacheKey) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: CacheKey, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
    }

    /// Return the fresh entry for `key` or build, store and return a new one.
    /// A failed build leaves the cache untouched.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: CacheKey,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        let ttl = self.ttl;
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if !fresh(ttl, occupied.get()) {
                    log_miss(occupied.key());
                    occupied.insert(CacheEntry::new(build()?));
                }
                Ok(&occupied.into_mut().value)
            }
            Entry::Vacant(vacant) => {
                log_miss(vacant.key());
                let value = build()?;
                Ok(&vacant.insert(CacheEntry::new(value)).value)
            }
        }
    }

    /// Drop entries whose TTL has elapsed
    pub fn evict_expired(&mut self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, entry| fresh(Some(ttl), entry));
        before - self.entries.len()
    }

    /// Drop every entry. Call after the registry is reloaded.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry of one project
    pub fn invalidate_project(&mut self, project: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.project != project);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
