//! Block-scoped resolution cache.
//!
//! In-memory LRU cache that sits in front of [`RegistryClient::resolve`].
//! Entries are keyed by block hash, never by block number: two blocks at the
//! same height on different branches can resolve differently, and a block
//! hash pins exactly one state.
//!
//! Architecture:
//! ```text
//!   consensus / governance (per block)
//!     → CachedRegistryClient   (this module, in-memory LRU)
//!       → RegistryClient       (storage reads at the block's state)
//! ```
//!
//! Unsealed blocks (zero hash) bypass the cache. Errors are never cached.
//! The cache is safe to share across threads via `Arc<Mutex<ResolutionCache>>`.

use alloy_primitives::{Address, B256};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use crate::catalog::SystemContract;
use crate::errors::SystemContractError;
use crate::proxy;
use crate::registry::RegistryClient;
use crate::state::{BlockContext, StateReader};

/// A reference-counted, thread-safe handle to a [`ResolutionCache`].
pub type SharedResolutionCache = Arc<Mutex<ResolutionCache>>;

type CacheKey = (B256, SystemContract);

/// Configuration for the resolution cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of `(block hash, contract)` entries held in RAM.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // Every system contract for the last 256 blocks.
        Self { max_entries: 256 * SystemContract::ALL.len() }
    }
}

/// Snapshot of cache performance counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that went to the Registry.
    pub misses: u64,
    /// Number of entries evicted to make room for new ones.
    pub evictions: u64,
    /// Current number of entries in the cache.
    pub current_entries: usize,
    /// Maximum configured capacity.
    pub max_entries: usize,
}

impl CacheStats {
    /// Cache hit rate in the range `[0.0, 1.0]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Whether any lookups have been performed yet.
    pub fn is_cold(&self) -> bool {
        self.hits == 0 && self.misses == 0
    }
}

/// LRU cache mapping `(block hash, contract) → resolved address`.
///
/// A cached `None` is a real answer ("not registered at this block") and is
/// served like any other entry.
#[derive(Debug)]
pub struct ResolutionCache {
    map: HashMap<CacheKey, Option<Address>>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
    stats: CacheStats,
}

impl ResolutionCache {
    /// Create a new cache holding at most `max_entries` (at least one).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            map: HashMap::with_capacity(max_entries),
            order: VecDeque::with_capacity(max_entries),
            max_entries,
            stats: CacheStats { max_entries, ..Default::default() },
        }
    }

    /// Look up a resolution. Updates LRU order on hit.
    pub fn get(&mut self, block_hash: B256, contract: SystemContract) -> Option<Option<Address>> {
        let key = (block_hash, contract);
        match self.map.get(&key).copied() {
            Some(resolved) => {
                self.stats.hits += 1;
                self.promote(key);
                Some(resolved)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or update a resolution. Evicts the LRU entry if at capacity.
    pub fn insert(&mut self, block_hash: B256, contract: SystemContract, resolved: Option<Address>) {
        let key = (block_hash, contract);
        if self.map.insert(key, resolved).is_some() {
            self.promote(key);
        } else {
            if self.map.len() > self.max_entries {
                if let Some(lru_key) = self.order.pop_front() {
                    self.map.remove(&lru_key);
                    self.stats.evictions += 1;
                }
            }
            self.order.push_back(key);
        }
        self.stats.current_entries = self.map.len();
    }

    /// Drop every entry of `block_hash`, e.g. after the block was reorged out.
    pub fn invalidate_block(&mut self, block_hash: B256) {
        self.order.retain(|(hash, _)| *hash != block_hash);
        self.map.retain(|(hash, _), _| *hash != block_hash);
        self.stats.current_entries = self.map.len();
    }

    /// Evict all entries.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.stats.current_entries = 0;
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of performance counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn promote(&mut self, key: CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
            self.order.push_back(key);
        }
    }
}

/// A [`RegistryClient`] with a shared [`ResolutionCache`] in front.
///
/// # Example
/// ```ignore
/// // Long-lived, shared by every consumer of the node:
/// let cache: SharedResolutionCache = Arc::new(Mutex::new(ResolutionCache::new(1024)));
///
/// // Per block:
/// let client = CachedRegistryClient::new_shared(RegistryClient::from_config(&config), cache.clone());
/// let kip113 = client.resolve(&state, SystemContract::Kip113, &block)?; // Registry read
/// let kip113 = client.resolve(&state, SystemContract::Kip113, &block)?; // cache hit
/// ```
#[derive(Debug, Clone)]
pub struct CachedRegistryClient {
    client: RegistryClient,
    cache: SharedResolutionCache,
}

impl CachedRegistryClient {
    /// Wrap `client` with a new, unshared cache.
    pub fn new(client: RegistryClient, config: CacheConfig) -> Self {
        Self { client, cache: Arc::new(Mutex::new(ResolutionCache::new(config.max_entries))) }
    }

    /// Wrap `client` with an existing shared cache.
    pub fn new_shared(client: RegistryClient, cache: SharedResolutionCache) -> Self {
        Self { client, cache }
    }

    /// The uncached client.
    pub const fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// [`RegistryClient::resolve`], answered from the cache for sealed blocks.
    ///
    /// `state` must be the state of `block`.
    pub fn resolve(
        &self,
        state: &impl StateReader,
        contract: SystemContract,
        block: &BlockContext,
    ) -> Result<Option<Address>, SystemContractError> {
        if !block.is_sealed() {
            return self.client.resolve(state, contract, block);
        }
        if let Some(resolved) = self.lock().get(block.hash, contract) {
            trace!(
                target: "system_contracts::cache",
                %contract,
                block_hash = %block.hash,
                "Resolution cache hit"
            );
            return Ok(resolved);
        }

        let resolved = self.client.resolve(state, contract, block)?;
        self.lock().insert(block.hash, contract, resolved);
        Ok(resolved)
    }

    /// [`RegistryClient::resolve_implementation`] on top of the cached lookup.
    pub fn resolve_implementation(
        &self,
        state: &impl StateReader,
        contract: SystemContract,
        block: &BlockContext,
    ) -> Result<Option<Address>, SystemContractError> {
        Ok(self.resolve(state, contract, block)?.map(|addr| proxy::follow(state, addr)))
    }

    /// Snapshot of cache performance counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Drop the entries of a block that is no longer canonical.
    pub fn invalidate_block(&self, block_hash: B256) {
        self.lock().invalidate_block(block_hash);
    }

    /// Clear the entire cache.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Clone the underlying [`SharedResolutionCache`] handle.
    pub fn shared_cache(&self) -> SharedResolutionCache {
        Arc::clone(&self.cache)
    }

    fn lock(&self) -> MutexGuard<'_, ResolutionCache> {
        // Every update leaves the cache consistent, so poisoning is ignored.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
