//! Composer side effects shared with the rest of the app through the store.

use crate::store::keys::{IS_EMOJI_PICKER_VISIBLE, SHOULD_SHOW_COMPOSE_INPUT};
use crate::store::{Store, StoreKey};

#[derive(Debug, Clone)]
pub struct ComposerActions {
    store: Store,
}

impl ComposerActions {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn set_should_show_compose_input(&self, show: bool) {
        self.write(SHOULD_SHOW_COMPOSE_INPUT, show);
    }

    /// Close the emoji picker if it is open.
    pub fn hide_emoji_picker(&self) {
        let key = StoreKey::single(IS_EMOJI_PICKER_VISIBLE);
        if self.store.get::<bool>(&key).ok().flatten() == Some(true) {
            tracing::debug!("Hiding emoji picker for hidden composer");
            self.write(IS_EMOJI_PICKER_VISIBLE, false);
        }
    }

    fn write(&self, key: &str, value: bool) {
        if let Err(error) = self.store.set(&StoreKey::single(key), value) {
            tracing::warn!(key, "Failed to update composer state: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_emoji_picker_only_writes_when_open() {
        let store = Store::default();
        let actions = ComposerActions::new(store.clone());
        let key = StoreKey::single(IS_EMOJI_PICKER_VISIBLE);

        actions.hide_emoji_picker();
        assert!(store.read(&key).is_none());

        store.set(&key, true).unwrap();
        actions.hide_emoji_picker();
        assert_eq!(store.get::<bool>(&key).unwrap(), Some(false));
    }

    #[test]
    fn compose_input_flag_is_stored() {
        let store = Store::default();
        ComposerActions::new(store.clone()).set_should_show_compose_input(true);
        assert_eq!(
            store
                .get::<bool>(&StoreKey::single(SHOULD_SHOW_COMPOSE_INPUT))
                .unwrap(),
            Some(true)
        );
    }
}
