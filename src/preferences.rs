//! Preferences
//!
//! The two flags the storefront keeps across visits: whether the onboarding
//! tour has been seen, and which alert banners were dismissed.

use rustc_hash::FxHashMap;

const ONBOARDING_KEY: &str = "hasSeenOnboarding";

/// Key/value storage for persisted flags, such as browser local storage.
pub trait FlagStorage {
    /// Read a stored value.
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value.
    fn set(&mut self, key: &str, value: &str);

    /// Delete a value.
    fn remove(&mut self, key: &str);
}

/// In-memory [`FlagStorage`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: FxHashMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Typed access to the persisted flags.
#[derive(Debug)]
pub struct Preferences<S> {
    storage: S,
}

impl<S: FlagStorage> Preferences<S> {
    /// Wrap a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Whether the onboarding tour was completed or skipped.
    pub fn has_seen_onboarding(&self) -> bool {
        self.flag(ONBOARDING_KEY)
    }

    /// Record that the onboarding tour was completed or skipped.
    pub fn mark_onboarding_seen(&mut self) {
        self.storage.set(ONBOARDING_KEY, "true");
    }

    /// Show the onboarding tour again on the next visit.
    pub fn reset_onboarding(&mut self) {
        self.storage.remove(ONBOARDING_KEY);
    }

    /// Whether the alert banner of this type was dismissed.
    pub fn is_alert_dismissed(&self, alert_type: &str) -> bool {
        self.flag(&alert_key(alert_type))
    }

    /// Dismiss the alert banner of this type.
    pub fn dismiss_alert(&mut self, alert_type: &str) {
        self.storage.set(&alert_key(alert_type), "true");
    }

    /// Borrow the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn flag(&self, key: &str) -> bool {
        self.storage.get(key).as_deref() == Some("true")
    }
}

fn alert_key(alert_type: &str) -> String {
    format!("alert-{alert_type}-dismissed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_flag_round_trips() {
        let mut prefs = Preferences::new(MemoryStorage::new());

        assert!(!prefs.has_seen_onboarding());

        prefs.mark_onboarding_seen();

        assert!(prefs.has_seen_onboarding());
        assert_eq!(
            prefs.storage().get("hasSeenOnboarding").as_deref(),
            Some("true")
        );

        prefs.reset_onboarding();

        assert!(!prefs.has_seen_onboarding());
    }

    #[test]
    fn alerts_are_dismissed_per_type() {
        let mut prefs = Preferences::new(MemoryStorage::new());

        prefs.dismiss_alert("delivery");

        assert!(prefs.is_alert_dismissed("delivery"));
        assert!(!prefs.is_alert_dismissed("offer"));
        assert!(prefs.storage().get("alert-delivery-dismissed").is_some());
    }

    #[test]
    fn only_true_counts_as_set() {
        let mut storage = MemoryStorage::new();
        storage.set("hasSeenOnboarding", "false");

        assert!(!Preferences::new(storage).has_seen_onboarding());
    }
}
