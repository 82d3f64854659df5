//! In-memory reactive key/value store.
//!
//! Values are JSON documents addressed by [`StoreKey`]. Every mutation is
//! announced on a broadcast channel so bindings can re-read what they watch.
//! Members of the safe-eviction collections are dropped least-recently-used
//! first once the store grows past its capacity, unless a binding pinned them.

pub mod keys;
mod subscription;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::{Error, Result};

pub use keys::StoreKey;
pub use subscription::{
    deserialize_selector, Binding, EvictionPolicy, KeySpec, Selector, SubscriptionDescriptor,
};

const DEFAULT_CAPACITY: usize = 512;
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Notification that the value under `key` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
}

/// How a server-provided update is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateMethod {
    Merge,
    Set,
}

/// One store write carried by an API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdate {
    pub onyx_method: UpdateMethod,
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl StoreUpdate {
    pub fn merge(key: &StoreKey, value: Value) -> Self {
        Self {
            onyx_method: UpdateMethod::Merge,
            key: key.as_string(),
            value,
        }
    }

    pub fn set(key: &StoreKey, value: Value) -> Self {
        Self {
            onyx_method: UpdateMethod::Set,
            key: key.as_string(),
            value,
        }
    }
}

#[derive(Default)]
struct StoreState {
    values: HashMap<String, Value>,
    last_access: HashMap<String, u64>,
    pins: HashMap<String, usize>,
    clock: u64,
}

impl StoreState {
    fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.last_access.insert(key.to_string(), self.clock);
    }

    fn write(&mut self, key: &str, value: Value) {
        if value.is_null() {
            self.values.remove(key);
            self.last_access.remove(key);
        } else {
            self.values.insert(key.to_string(), value);
            self.touch(key);
        }
    }

    /// Drop least-recently-used evictable keys until within capacity.
    fn evict_over(&mut self, capacity: usize, keep: &str) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.values.len() > capacity {
            let candidate = self
                .values
                .keys()
                .filter(|key| key.as_str() != keep)
                .filter(|key| !self.pins.contains_key(key.as_str()))
                .filter(|key| StoreKey::parse(key).is_evictable())
                .min_by_key(|key| self.last_access.get(key.as_str()).copied().unwrap_or(0))
                .cloned();
            let Some(key) = candidate else {
                break;
            };
            self.values.remove(&key);
            self.last_access.remove(&key);
            evicted.push(key);
        }
        evicted
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    changes: broadcast::Sender<StoreChange>,
    capacity: usize,
}

/// Shared handle to the reactive store. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("capacity", &self.inner.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl Store {
    /// Create a store that retains at most `capacity` keys before evicting.
    pub fn new(capacity: usize) -> Self {
        let (changes, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState::default()),
                changes,
                capacity: capacity.max(1),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive a notification for every subsequent mutation.
    pub fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.changes.subscribe()
    }

    /// Subscribe to a descriptor for the given route.
    pub fn subscribe<T>(
        &self,
        descriptor: SubscriptionDescriptor<T>,
        route: &crate::identity::RouteParams,
    ) -> Binding<T> {
        Binding::bind(self, descriptor, route)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.state().values.len()
    }

    /// Whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the raw value for a key.
    ///
    /// A collection key yields an object of every member keyed by its full key,
    /// or `None` when the collection is empty.
    pub fn read(&self, key: &StoreKey) -> Option<Value> {
        let mut state = self.state();
        match key {
            StoreKey::Collection(prefix) => {
                let members: Map<String, Value> = state
                    .values
                    .iter()
                    .filter(|(member, _)| member.starts_with(prefix))
                    .map(|(member, value)| (member.clone(), value.clone()))
                    .collect::<BTreeMap<_, _>>()
                    .into_iter()
                    .collect();
                if members.is_empty() {
                    None
                } else {
                    Some(Value::Object(members))
                }
            }
            _ => {
                let raw = key.as_string();
                let value = state.values.get(&raw).cloned();
                if value.is_some() {
                    state.touch(&raw);
                }
                value
            }
        }
    }

    /// Read and deserialize a value.
    pub fn get<T: DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>> {
        self.read(key)
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|error| Error::Store(format!("{key}: {error}")))
            })
            .transpose()
    }

    /// Replace the value under `key`. `null` removes it.
    pub fn set(&self, key: &StoreKey, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let raw = key.as_string();
        let evicted = {
            let mut state = self.state();
            state.write(&raw, value);
            state.evict_over(self.inner.capacity, &raw)
        };
        self.notify(raw, evicted);
        Ok(())
    }

    /// Deep-merge `patch` into the value under `key`.
    ///
    /// Objects merge recursively, any other value replaces, `null` removes.
    pub fn merge(&self, key: &StoreKey, patch: impl Serialize) -> Result<()> {
        let patch = serde_json::to_value(patch)?;
        let raw = key.as_string();
        let evicted = {
            let mut state = self.state();
            let mut current = state.values.get(&raw).cloned().unwrap_or(Value::Null);
            merge_value(&mut current, patch);
            state.write(&raw, current);
            state.evict_over(self.inner.capacity, &raw)
        };
        self.notify(raw, evicted);
        Ok(())
    }

    /// Remove the value under `key`.
    pub fn remove(&self, key: &StoreKey) {
        let raw = key.as_string();
        let existed = {
            let mut state = self.state();
            state.last_access.remove(&raw);
            state.values.remove(&raw).is_some()
        };
        if existed {
            self.notify(raw, Vec::new());
        }
    }

    /// Atomically replace the value under `key` when `update` returns a new one.
    ///
    /// `update` sees the current value while the store is locked, so two callers
    /// racing on the same key cannot both observe the old state. Returns whether
    /// a write happened.
    pub fn try_update<F>(&self, key: &StoreKey, update: F) -> bool
    where
        F: FnOnce(Option<&Value>) -> Option<Value>,
    {
        let raw = key.as_string();
        let evicted = {
            let mut state = self.state();
            let Some(next) = update(state.values.get(&raw)) else {
                return false;
            };
            state.write(&raw, next);
            state.evict_over(self.inner.capacity, &raw)
        };
        self.notify(raw, evicted);
        true
    }

    /// Apply a batch of server-provided updates in order.
    pub fn apply(&self, updates: Vec<StoreUpdate>) -> Result<()> {
        for update in updates {
            let key = StoreKey::parse(&update.key);
            match update.onyx_method {
                UpdateMethod::Merge => self.merge(&key, update.value)?,
                UpdateMethod::Set => self.set(&key, update.value)?,
            }
        }
        Ok(())
    }

    /// Protect `key` from eviction until a matching [`Store::unpin`].
    pub fn pin(&self, key: &StoreKey) {
        *self.state().pins.entry(key.as_string()).or_insert(0) += 1;
    }

    /// Release one pin on `key`.
    pub fn unpin(&self, key: &StoreKey) {
        let raw = key.as_string();
        let mut state = self.state();
        if let Some(count) = state.pins.get_mut(&raw) {
            *count -= 1;
            if *count == 0 {
                state.pins.remove(&raw);
            }
        }
    }

    /// Whether `key` is currently pinned by any binding.
    pub fn is_pinned(&self, key: &StoreKey) -> bool {
        self.state().pins.contains_key(&key.as_string())
    }

    fn notify(&self, key: String, evicted: Vec<String>) {
        for evicted_key in evicted {
            tracing::debug!(key = %evicted_key, "Evicted store key");
            let _ = self.inner.changes.send(StoreChange { key: evicted_key });
        }
        let _ = self.inner.changes.send(StoreChange { key });
    }
}

fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (field, value) in patch {
                if value.is_null() {
                    target.remove(&field);
                } else {
                    merge_value(target.entry(field).or_insert(Value::Null), value);
                }
            }
        }
        (target, Value::Object(patch)) => {
            let mut fresh = Value::Object(Map::new());
            merge_value(&mut fresh, Value::Object(patch));
            *target = fresh;
        }
        (target, patch) => *target = patch,
    }
}
