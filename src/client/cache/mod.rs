//! # Remote State Cache
//!
//! Last-known-good server state for the conversation list and per-conversation
//! message lists, with optimistic overlays on top.
//!
//! ## Freshness
//!
//! Each key kind has a [`FreshnessPolicy`]. An entry is fetched when it is
//! absent, invalidated, or older than its refetch interval, and additionally
//! on mount and on return to the foreground when the policy asks for it.
//!
//! ## Ordering
//!
//! Every refresh and reconciliation bumps the entry's fetch generation. A
//! fetch whose generation is no longer current when its response arrives is
//! discarded, so an older poll can never overwrite newer state.
//! Reconciliation for a key runs entirely under the cache's write lock.
//!
//! ## Dependencies
//!
//! Reconciling a conversation's messages invalidates the conversation list
//! (preview and unread counts), as declared by [`CacheKey::dependents`].

use crate::client::badge::BadgeCounter;
use crate::client::clock::Clock;
use crate::client::error::FetchError;
use crate::client::offline::optimistic::{OptimisticMerger, OptimisticMutation};
use crate::client::offline::queue::ActionId;
use crate::client::offline::reconciliation::{reconcile_overlay, ReconciliationResult};
use crate::shared::config::CacheSettings;
use crate::shared::messaging::{ChatMessage, Conversation, ConversationId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Identifies one cached server resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// The user's conversation list
    ConversationList,
    /// Messages of one conversation
    Messages(ConversationId),
}

impl CacheKey {
    /// Keys that must be invalidated after this key is reconciled
    pub fn dependents(&self) -> Vec<CacheKey> {
        match self {
            CacheKey::Messages(_) => vec![CacheKey::ConversationList],
            CacheKey::ConversationList => Vec::new(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::ConversationList => write!(f, "conversations"),
            CacheKey::Messages(id) => write!(f, "conversations/{}/messages", id),
        }
    }
}

/// A server-shaped value for a cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Conversations(Vec<Conversation>),
    Messages(Vec<ChatMessage>),
}

impl CacheValue {
    /// Empty value of the shape `key` holds
    pub fn empty_for(key: &CacheKey) -> Self {
        match key {
            CacheKey::ConversationList => CacheValue::Conversations(Vec::new()),
            CacheKey::Messages(_) => CacheValue::Messages(Vec::new()),
        }
    }

    /// Total unread count of a conversation list; zero for messages
    pub fn unread_total(&self) -> u32 {
        match self {
            CacheValue::Conversations(conversations) => conversations
                .iter()
                .fold(0u32, |total, c| total.saturating_add(c.unread_count)),
            CacheValue::Messages(_) => 0,
        }
    }
}

/// Cached state for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationCacheEntry {
    pub key: CacheKey,
    /// Last confirmed server value
    pub server_snapshot: CacheValue,
    /// Unconfirmed local mutations, in application order
    pub optimistic_overlay: Vec<OptimisticMutation>,
    /// `None` until the first successful fetch
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub invalidated: bool,
    pub fetch_generation: u64,
}

impl ConversationCacheEntry {
    fn new(key: CacheKey) -> Self {
        Self {
            key,
            server_snapshot: CacheValue::empty_for(&key),
            optimistic_overlay: Vec::new(),
            last_fetched_at: None,
            invalidated: false,
            fetch_generation: 0,
        }
    }

    /// The value presented to the UI
    pub fn visible(&self) -> CacheValue {
        OptimisticMerger::merge(&self.server_snapshot, &self.optimistic_overlay)
    }

    fn has_content(&self) -> bool {
        self.last_fetched_at.is_some() || !self.optimistic_overlay.is_empty()
    }

    fn is_stale(&self, policy: &FreshnessPolicy, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = self.last_fetched_at else {
            return true;
        };
        if self.invalidated {
            return true;
        }
        chrono::Duration::from_std(policy.refetch_interval)
            .map_or(false, |interval| now - fetched_at >= interval)
    }
}

/// When a key is refetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub refetch_interval: Duration,
    pub refetch_on_focus: bool,
    pub refetch_on_mount: bool,
}

/// Policies per key kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicies {
    pub conversations: FreshnessPolicy,
    pub messages: FreshnessPolicy,
}

impl CachePolicies {
    pub fn for_key(&self, key: &CacheKey) -> &FreshnessPolicy {
        match key {
            CacheKey::ConversationList => &self.conversations,
            CacheKey::Messages(_) => &self.messages,
        }
    }
}

impl From<&CacheSettings> for CachePolicies {
    fn from(settings: &CacheSettings) -> Self {
        let policy = |secs: u64| FreshnessPolicy {
            refetch_interval: Duration::from_secs(secs),
            refetch_on_focus: settings.refetch_on_focus,
            refetch_on_mount: settings.refetch_on_mount,
        };
        Self {
            conversations: policy(settings.conversations_refetch_secs),
            messages: policy(settings.messages_refetch_secs),
        }
    }
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self::from(&CacheSettings::default())
    }
}

/// Source of authoritative server values
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, FetchError>;
}

/// Keyed cache of server state with optimistic overlays
pub struct RemoteStateCache {
    entries: RwLock<HashMap<CacheKey, ConversationCacheEntry>>,
    fetcher: Arc<dyn RemoteFetcher>,
    clock: Arc<dyn Clock>,
    policies: CachePolicies,
    badge: Option<Arc<BadgeCounter>>,
}

impl RemoteStateCache {
    pub fn new(fetcher: Arc<dyn RemoteFetcher>, clock: Arc<dyn Clock>, policies: CachePolicies) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fetcher,
            clock,
            policies,
            badge: None,
        }
    }

    /// Persist and report the unread total after each conversation list reconciliation
    pub fn with_badge(mut self, badge: Arc<BadgeCounter>) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn policies(&self) -> &CachePolicies {
        &self.policies
    }

    /// Entry for `key`, fetched first if absent or stale
    pub async fn get(&self, key: CacheKey) -> Result<ConversationCacheEntry, FetchError> {
        let now = self.clock.now();
        let policy = self.policies.for_key(&key);
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if !entry.is_stale(policy, now) {
                    return Ok(entry.clone());
                }
            }
        }
        self.refresh(key).await
    }

    /// A view started showing `key`
    pub async fn mount(&self, key: CacheKey) -> Result<ConversationCacheEntry, FetchError> {
        if self.policies.for_key(&key).refetch_on_mount {
            self.refresh(key).await
        } else {
            self.get(key).await
        }
    }

    /// The app returned to the foreground; refetch keys whose policy asks for it.
    ///
    /// Returns how many keys were refreshed successfully.
    pub async fn on_focus(&self) -> usize {
        let keys: Vec<CacheKey> = {
            let entries = self.entries.read().await;
            entries
                .keys()
                .filter(|key| self.policies.for_key(key).refetch_on_focus)
                .copied()
                .collect()
        };
        self.refresh_all(keys).await
    }

    /// Refetch every stale or invalidated key. Returns how many succeeded.
    pub async fn refetch_stale(&self) -> usize {
        let now = self.clock.now();
        let keys: Vec<CacheKey> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|entry| entry.is_stale(self.policies.for_key(&entry.key), now))
                .map(|entry| entry.key)
                .collect()
        };
        self.refresh_all(keys).await
    }

    /// Mark `key` for refetch on next access or tick
    pub async fn invalidate(&self, key: CacheKey) {
        if let Some(entry) = self.entries.write().await.get_mut(&key) {
            entry.invalidated = true;
            tracing::debug!(key = %key, "cache entry invalidated");
        }
    }

    /// Add a local mutation on top of `key` and return the new visible value
    pub async fn apply_optimistic(&self, key: CacheKey, mutation: OptimisticMutation) -> CacheValue {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key)
            .or_insert_with(|| ConversationCacheEntry::new(key));
        tracing::debug!(key = %key, correlation_id = %mutation.correlation_id, "optimistic mutation applied");
        entry.optimistic_overlay.push(mutation);
        entry.visible()
    }

    /// Replace the snapshot of `key` with an authoritative server value.
    ///
    /// Supersedes any fetch of `key` still in flight.
    pub async fn reconcile(&self, key: CacheKey, server_value: CacheValue) -> ReconciliationResult {
        let (result, unread) = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .entry(key)
                .or_insert_with(|| ConversationCacheEntry::new(key));
            entry.fetch_generation += 1;
            let result = self.reconcile_entry(entry, server_value);
            let unread = Self::unread_of(entry);
            self.invalidate_dependents(&mut entries, &key);
            (result, unread)
        };
        self.update_badge(unread).await;
        result
    }

    /// Fold a message the backend just returned into its conversation.
    ///
    /// Nothing happens if the conversation is not cached.
    pub async fn absorb_sent_message(&self, message: ChatMessage) -> Option<ReconciliationResult> {
        let key = CacheKey::Messages(message.conversation_id);
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&key)?;

        let CacheValue::Messages(mut messages) = entry.server_snapshot.clone() else {
            return None;
        };
        match messages.iter_mut().find(|existing| {
            (message.id.is_some() && existing.id == message.id)
                || (message.client_ref.is_some() && existing.client_ref == message.client_ref)
        }) {
            Some(existing) => *existing = message,
            None => messages.push(message),
        }

        // The snapshot now holds data newer than any fetch still in flight.
        entry.fetch_generation += 1;
        let last_fetched_at = entry.last_fetched_at;
        let result = self.reconcile_entry(entry, CacheValue::Messages(messages));
        entry.last_fetched_at = last_fetched_at;
        self.invalidate_dependents(&mut entries, &key);
        Some(result)
    }

    /// Mark every overlay entry of a delivered action as settled.
    ///
    /// Supersedes fetches of the touched keys still in flight: their
    /// responses predate the delivery and would drop the settled entries.
    pub async fn settle(&self, correlation_id: ActionId) {
        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            let mut touched = false;
            for mutation in entry
                .optimistic_overlay
                .iter_mut()
                .filter(|mutation| mutation.correlation_id == correlation_id)
            {
                mutation.settled = true;
                touched = true;
            }
            if touched {
                entry.fetch_generation += 1;
            }
        }
    }

    /// Drop every overlay entry of an action that will never be delivered.
    ///
    /// Returns the keys whose visible value changed.
    pub async fn rollback(&self, correlation_id: ActionId) -> Vec<CacheKey> {
        let mut entries = self.entries.write().await;
        let mut touched = Vec::new();
        for entry in entries.values_mut() {
            let before = entry.optimistic_overlay.len();
            entry
                .optimistic_overlay
                .retain(|mutation| mutation.correlation_id != correlation_id);
            if entry.optimistic_overlay.len() != before {
                touched.push(entry.key);
            }
        }
        if !touched.is_empty() {
            tracing::info!(correlation_id = %correlation_id, keys = touched.len(), "optimistic changes rolled back");
        }
        touched
    }

    /// Visible value of `key` without fetching
    pub async fn peek(&self, key: CacheKey) -> Option<CacheValue> {
        self.entries.read().await.get(&key).map(ConversationCacheEntry::visible)
    }

    /// Raw entry for `key` without fetching
    pub async fn entry(&self, key: CacheKey) -> Option<ConversationCacheEntry> {
        self.entries.read().await.get(&key).cloned()
    }

    /// Keys currently cached
    pub async fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.read().await.keys().copied().collect();
        keys.sort();
        keys
    }

    async fn refresh_all(&self, keys: Vec<CacheKey>) -> usize {
        let mut refreshed = 0;
        for key in keys {
            match self.refresh(key).await {
                Ok(_) => refreshed += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "refetch failed"),
            }
        }
        refreshed
    }

    async fn refresh(&self, key: CacheKey) -> Result<ConversationCacheEntry, FetchError> {
        let generation = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .entry(key)
                .or_insert_with(|| ConversationCacheEntry::new(key));
            entry.fetch_generation += 1;
            entry.fetch_generation
        };

        tracing::debug!(key = %key, generation, "fetching");
        let fetched = self.fetcher.fetch(&key).await;

        let (entry, unread) = {
            let mut entries = self.entries.write().await;
            let Some(entry) = entries.get_mut(&key) else {
                return Err(FetchError::Network("cache entry vanished".to_string()));
            };

            let value = match fetched {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "fetch failed");
                    return if entry.has_content() {
                        Ok(entry.clone())
                    } else {
                        Err(e)
                    };
                }
            };

            if entry.fetch_generation != generation {
                tracing::warn!(
                    key = %key,
                    generation,
                    current = entry.fetch_generation,
                    "discarding superseded fetch"
                );
                return Ok(entry.clone());
            }

            self.reconcile_entry(entry, value);
            let snapshot = entry.clone();
            let unread = Self::unread_of(&snapshot);
            self.invalidate_dependents(&mut entries, &key);
            (snapshot, unread)
        };

        self.update_badge(unread).await;
        Ok(entry)
    }

    fn reconcile_entry(&self, entry: &mut ConversationCacheEntry, server_value: CacheValue) -> ReconciliationResult {
        let overlay = std::mem::take(&mut entry.optimistic_overlay);
        let (retained, result) = reconcile_overlay(&server_value, overlay);
        entry.server_snapshot = server_value;
        entry.optimistic_overlay = retained;
        entry.last_fetched_at = Some(self.clock.now());
        entry.invalidated = false;

        tracing::debug!(
            key = %entry.key,
            confirmed = result.confirmed.len(),
            settled = result.settled.len(),
            pending = result.still_pending.len(),
            "reconciled"
        );
        result
    }

    fn invalidate_dependents(&self, entries: &mut HashMap<CacheKey, ConversationCacheEntry>, key: &CacheKey) {
        for dependent in key.dependents() {
            if let Some(entry) = entries.get_mut(&dependent) {
                entry.invalidated = true;
            }
        }
    }

    fn unread_of(entry: &ConversationCacheEntry) -> Option<u32> {
        match entry.key {
            CacheKey::ConversationList => Some(entry.visible().unread_total()),
            CacheKey::Messages(_) => None,
        }
    }

    async fn update_badge(&self, unread: Option<u32>) {
        let (Some(badge), Some(count)) = (&self.badge, unread) else {
            return;
        };
        if let Err(e) = badge.update(count).await {
            tracing::error!(error = %e, "failed to persist badge count");
        }
    }
}

impl fmt::Debug for RemoteStateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStateCache")
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}
