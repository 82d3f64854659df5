//! Subscription descriptors and live bindings.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Store, StoreKey};
use crate::error::Result;
use crate::identity::RouteParams;

/// Transform applied to a raw store value before it reaches the reader.
pub type Selector<T> = fn(Value) -> Result<T>;

/// Plain deserialization, the default selector.
pub fn deserialize_selector<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Where a subscription reads from.
#[derive(Debug, Clone)]
pub enum KeySpec {
    /// A fixed key, independent of the route.
    Static(StoreKey),
    /// A key computed from the current route.
    FromRoute(fn(&RouteParams) -> StoreKey),
}

impl KeySpec {
    pub fn resolve(&self, route: &RouteParams) -> StoreKey {
        match self {
            Self::Static(key) => key.clone(),
            Self::FromRoute(build) => build(route),
        }
    }
}

/// Whether a subscribed key may be dropped under cache pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    Evictable,
    NeverEvict,
}

/// Everything needed to open a binding: key, retention, and selector.
#[derive(Debug)]
pub struct SubscriptionDescriptor<T> {
    pub name: &'static str,
    pub key: KeySpec,
    pub eviction: EvictionPolicy,
    /// Keep delivering the previous key's value after a rebind until the new
    /// key yields one. Off by default: a rebind clears the value.
    pub keep_stale_on_rebind: bool,
    pub selector: Selector<T>,
}

impl<T: DeserializeOwned> SubscriptionDescriptor<T> {
    /// Descriptor for a fixed key with plain deserialization.
    pub fn fixed(name: &'static str, key: StoreKey) -> Self {
        Self {
            name,
            key: KeySpec::Static(key),
            eviction: EvictionPolicy::Evictable,
            keep_stale_on_rebind: false,
            selector: deserialize_selector::<T>,
        }
    }

    /// Descriptor for a route-derived key with plain deserialization.
    pub fn routed(name: &'static str, build: fn(&RouteParams) -> StoreKey) -> Self {
        Self {
            name,
            key: KeySpec::FromRoute(build),
            eviction: EvictionPolicy::Evictable,
            keep_stale_on_rebind: false,
            selector: deserialize_selector::<T>,
        }
    }
}

impl<T> SubscriptionDescriptor<T> {
    #[must_use]
    pub fn never_evict(mut self) -> Self {
        self.eviction = EvictionPolicy::NeverEvict;
        self
    }

    #[must_use]
    pub fn keep_stale_on_rebind(mut self) -> Self {
        self.keep_stale_on_rebind = true;
        self
    }

    #[must_use]
    pub fn with_selector(mut self, selector: Selector<T>) -> Self {
        self.selector = selector;
        self
    }
}

/// A live subscription: the last value delivered for the descriptor's key.
///
/// When the route moves the binding to a new key, the previous value is dropped,
/// unless the descriptor keeps stale values: then it stays visible until the new
/// key yields one, and readers compare the delivered entity against the route
/// to detect that window.
pub struct Binding<T> {
    store: Store,
    descriptor: SubscriptionDescriptor<T>,
    key: StoreKey,
    value: Option<T>,
    awaiting_new_key: bool,
}

impl<T> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.descriptor.name)
            .field("key", &self.key)
            .field("has_value", &self.value.is_some())
            .field("awaiting_new_key", &self.awaiting_new_key)
            .finish()
    }
}

impl<T> Binding<T> {
    pub(super) fn bind(
        store: &Store,
        descriptor: SubscriptionDescriptor<T>,
        route: &RouteParams,
    ) -> Self {
        let key = descriptor.key.resolve(route);
        if descriptor.eviction == EvictionPolicy::NeverEvict {
            store.pin(&key);
        }
        let mut binding = Self {
            store: store.clone(),
            descriptor,
            key,
            value: None,
            awaiting_new_key: false,
        };
        binding.value = binding.load();
        binding
    }

    /// The delivered value, if any.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// The key currently read.
    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Whether a change notification for `changed` concerns this binding.
    pub fn is_affected_by(&self, changed: &str) -> bool {
        self.key.covers(changed)
    }

    /// Point the binding at the key for `route`. Returns whether the key changed.
    pub fn rebind(&mut self, route: &RouteParams) -> bool {
        let key = self.descriptor.key.resolve(route);
        if key == self.key {
            return false;
        }
        if self.descriptor.eviction == EvictionPolicy::NeverEvict {
            self.store.pin(&key);
            self.store.unpin(&self.key);
        }
        tracing::debug!(
            binding = self.descriptor.name,
            from = %self.key,
            to = %key,
            "Rebinding subscription"
        );
        self.key = key;
        if self.descriptor.keep_stale_on_rebind {
            self.awaiting_new_key = true;
        } else {
            self.value = None;
        }
        self.sync();
        true
    }

    /// Re-read the bound key.
    pub fn sync(&mut self) {
        match self.load() {
            Some(value) => {
                self.value = Some(value);
                self.awaiting_new_key = false;
            }
            None if self.awaiting_new_key => {}
            None => self.value = None,
        }
    }

    fn load(&self) -> Option<T> {
        let raw = self.store.read(&self.key)?;
        match (self.descriptor.selector)(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(
                    binding = self.descriptor.name,
                    key = %self.key,
                    "Discarding unreadable store value: {error}"
                );
                None
            }
        }
    }
}

impl<T> Drop for Binding<T> {
    fn drop(&mut self) {
        if self.descriptor.eviction == EvictionPolicy::NeverEvict {
            self.store.unpin(&self.key);
        }
    }
}
