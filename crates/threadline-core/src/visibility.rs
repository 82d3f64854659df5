//! App foreground/background signal.
//!
//! Listeners are registered with [`Visibility::on_visibility_change`] and stay
//! registered for as long as the returned [`VisibilitySubscription`] lives.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

struct VisibilityInner {
    visible: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

/// Shared visibility signal. Cloning is cheap.
#[derive(Clone)]
pub struct Visibility {
    inner: Arc<VisibilityInner>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visibility")
            .field("visible", &self.is_visible())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Visibility {
    pub fn new(initially_visible: bool) -> Self {
        Self {
            inner: Arc::new(VisibilityInner {
                visible: AtomicBool::new(initially_visible),
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Whether the app is currently in the foreground.
    pub fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::SeqCst)
    }

    /// Record a foreground/background transition and notify listeners.
    ///
    /// Repeating the current state is not a transition and notifies nobody.
    pub fn set_visible(&self, visible: bool) {
        if self.inner.visible.swap(visible, Ordering::SeqCst) == visible {
            return;
        }
        tracing::debug!(visible, "App visibility changed");

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(visible);
        }
    }

    /// Register `listener` for every subsequent transition.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn on_visibility_change<F>(&self, listener: F) -> VisibilitySubscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));
        VisibilitySubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration handle; unregisters its listener on drop.
pub struct VisibilitySubscription {
    inner: Weak<VisibilityInner>,
    id: u64,
}

impl std::fmt::Debug for VisibilitySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilitySubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for VisibilitySubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}
