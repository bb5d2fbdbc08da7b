//! Two-tier translation cache.
//! Key: blake3 hex of (normalized_text | src_code | tgt_code).
//! L1: in-memory LRU (access order). L2: injected key-value store with
//! insertion-order batch eviction. One lock guards both tiers so a
//! read-then-promote on an L2 hit is atomic.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::store::{KeyValueStore, StoreError};
use crate::config::DispatchConfig;
use crate::language::SupportedLanguage;

/// Max length of the literal fallback key.
const FALLBACK_KEY_LEN: usize = 100;

#[derive(Debug)]
pub struct DigestUnavailable(pub String);

/// Digest used to derive cache keys.
pub trait KeyDigest: Send + Sync {
    /// Lowercase hex digest of `input`.
    fn digest(&self, input: &str) -> Result<String, DigestUnavailable>;
}

pub struct Blake3Digest;

impl KeyDigest for Blake3Digest {
    fn digest(&self, input: &str) -> Result<String, DigestUnavailable> {
        Ok(blake3::hash(input.as_bytes()).to_hex().to_string())
    }
}

/// Content-addressed cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a translation. Falls back to a truncated literal
    /// composite when the digest is unavailable; weaker against collisions
    /// but still a usable key.
    pub fn derive(
        digest: &dyn KeyDigest,
        text: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> Self {
        let composite = format!(
            "{}|{}|{}",
            normalize(text),
            source.code(),
            target.code()
        );
        match digest.digest(&composite) {
            Ok(hex) => CacheKey(hex),
            Err(DigestUnavailable(reason)) => {
                warn!(reason = %reason, "cache key digest unavailable, using literal key");
                CacheKey(
                    composite
                        .replace('|', "_")
                        .chars()
                        .take(FALLBACK_KEY_LEN)
                        .collect(),
                )
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Cache-key normalization: trim + lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub memory_size: usize,
    pub disk_size: usize,
}

/// Persistent tier: the store plus an insertion-order index of its keys.
/// The index is loaded from `read_all` on first use and retried on failure.
struct DiskTier {
    store: Arc<dyn KeyValueStore>,
    order: VecDeque<String>,
    index: HashSet<String>,
    loaded: bool,
    capacity: usize,
    cleanup_batch: usize,
}

impl DiskTier {
    fn new(store: Arc<dyn KeyValueStore>, capacity: usize, cleanup_batch: usize) -> Self {
        Self {
            store,
            order: VecDeque::new(),
            index: HashSet::new(),
            loaded: false,
            capacity,
            cleanup_batch,
        }
    }

    fn ensure_loaded(&mut self) -> Result<(), StoreError> {
        if self.loaded {
            return Ok(());
        }
        let entries = self.store.read_all()?;
        self.order = entries.into_iter().map(|(k, _)| k).collect();
        self.index = self.order.iter().cloned().collect();
        self.loaded = true;
        debug!(entries = self.order.len(), "disk cache index loaded");
        Ok(())
    }

    fn get(&mut self, key: &CacheKey) -> Option<String> {
        if let Err(e) = self.ensure_loaded() {
            warn!(error = %e, "disk cache index load failed");
        } else if !self.index.contains(key.as_str()) {
            return None;
        }

        match self.store.get(key.as_str()) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "disk cache read failed");
                None
            }
        }
    }

    fn insert(&mut self, key: &CacheKey, value: &str) {
        if let Err(e) = self.ensure_loaded() {
            warn!(error = %e, "disk cache index load failed, write dropped");
            return;
        }
        if let Err(e) = self.store.write(key.as_str(), value) {
            warn!(error = %e, "disk cache write failed");
            return;
        }
        if self.index.insert(key.as_str().to_string()) {
            self.order.push_back(key.as_str().to_string());
        }
        if self.order.len() > self.capacity {
            self.evict_oldest_batch();
        }
    }

    /// Drop the oldest-inserted entries so the tier ends `cleanup_batch`
    /// below capacity.
    fn evict_oldest_batch(&mut self) {
        let count = (self.order.len() - self.capacity + self.cleanup_batch).min(self.order.len());
        let batch: Vec<String> = self.order.iter().take(count).cloned().collect();

        if let Err(e) = self.store.remove_many(&batch) {
            warn!(error = %e, "disk cache cleanup failed");
            return;
        }
        for key in &batch {
            self.index.remove(key);
        }
        self.order.drain(..count);
        info!(removed = count, "disk cache cleanup");
    }

    /// Returns false when the store kept its entries.
    fn clear(&mut self) -> bool {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "disk cache clear failed");
            return false;
        }
        self.order.clear();
        self.index.clear();
        self.loaded = true;
        true
    }

    fn len(&mut self) -> usize {
        match self.ensure_loaded() {
            Ok(()) => self.order.len(),
            Err(e) => {
                warn!(error = %e, "disk cache size unavailable");
                0
            }
        }
    }
}

struct Tiers {
    memory: LruCache<CacheKey, String>,
    disk: DiskTier,
}

pub struct TranslationCache {
    inner: Mutex<Tiers>,
    digest: Box<dyn KeyDigest>,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &DispatchConfig) -> Self {
        Self::with_capacity(
            store,
            config.memory_cache_size,
            config.disk_cache_size,
            config.disk_cleanup_batch,
        )
    }

    pub fn with_capacity(
        store: Arc<dyn KeyValueStore>,
        memory_capacity: usize,
        disk_capacity: usize,
        cleanup_batch: usize,
    ) -> Self {
        let memory_capacity = NonZeroUsize::new(memory_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Tiers {
                memory: LruCache::new(memory_capacity),
                disk: DiskTier::new(store, disk_capacity, cleanup_batch),
            }),
            digest: Box::new(Blake3Digest),
        }
    }

    /// Replace the key digest.
    pub fn with_digest(mut self, digest: Box<dyn KeyDigest>) -> Self {
        self.digest = digest;
        self
    }

    pub fn key_for(
        &self,
        text: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> CacheKey {
        CacheKey::derive(self.digest.as_ref(), text, source, target)
    }

    /// Look up a translation: memory first, then disk (promoting the hit).
    pub fn get(
        &self,
        text: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) -> Option<String> {
        let key = self.key_for(text, source, target);
        let mut tiers = self.inner.lock();

        if let Some(hit) = tiers.memory.get(&key) {
            debug!(key = key.as_str(), "memory cache hit");
            return Some(hit.clone());
        }

        let hit = tiers.disk.get(&key)?;
        debug!(key = key.as_str(), "disk cache hit");
        tiers.memory.put(key, hit.clone());
        Some(hit)
    }

    /// Store a translation in both tiers. Disk failures are logged only.
    pub fn put(
        &self,
        text: &str,
        translation: &str,
        source: SupportedLanguage,
        target: SupportedLanguage,
    ) {
        let key = self.key_for(text, source, target);
        let mut tiers = self.inner.lock();
        tiers.disk.insert(&key, translation);
        tiers.memory.put(key, translation.to_string());
    }

    /// Empty both tiers. Best-effort on the disk side: if the store cannot
    /// be cleared its entries stay and later lookups promote them again.
    pub fn clear(&self) {
        let mut tiers = self.inner.lock();
        tiers.memory.clear();
        if tiers.disk.clear() {
            info!("translation cache cleared");
        } else {
            warn!("translation cache cleared in memory only, disk entries kept");
        }
    }

    pub fn stats(&self) -> CacheStats {
        let mut tiers = self.inner.lock();
        CacheStats {
            memory_size: tiers.memory.len(),
            disk_size: tiers.disk.len(),
        }
    }
}
