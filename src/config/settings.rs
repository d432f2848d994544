//! User preferences
//!
//! A fixed, typed schema of per-category attributes mirrored into a
//! [`KeyValueStore`]. Persisted values that are missing or do not decode as
//! the attribute's type leave the compiled-in default in place.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::storage::{KeyValueStore, StoreError};

/// Settings shared between the beacon loop and user actions
pub type SharedSettings<S> = Arc<RwLock<SettingsStore<S>>>;

/// Type of a settings attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
}

/// A single settings value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Int(u64),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Int(_) => ValueKind::Int,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            SettingValue::Int(n) => Some(*n),
            SettingValue::Bool(_) => None,
        }
    }

    /// JSON encoding used in the persisted store
    pub fn encode(&self) -> String {
        match self {
            SettingValue::Bool(b) => serde_json::Value::Bool(*b).to_string(),
            SettingValue::Int(n) => serde_json::Value::from(*n).to_string(),
        }
    }

    /// Decode a persisted value as `kind`. Returns `None` for anything that is
    /// not valid JSON of that type; integers must be whole and non-negative.
    pub fn decode(kind: ValueKind, raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        match kind {
            ValueKind::Bool => value.as_bool().map(SettingValue::Bool),
            ValueKind::Int => {
                if let Some(n) = value.as_u64() {
                    return Some(SettingValue::Int(n));
                }
                // 5000.0 is still an integer
                let f = value.as_f64()?;
                if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
                    Some(SettingValue::Int(f as u64))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(n) => write!(f, "{}", n),
        }
    }
}

/// Every attribute of the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    BeaconActive,
    BeaconInterval,
    MessagesQueryEnabled,
    MessagesInterval,
    MessagesMaxShow,
    NewsHideBoring,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::BeaconActive,
        SettingKey::BeaconInterval,
        SettingKey::MessagesQueryEnabled,
        SettingKey::MessagesInterval,
        SettingKey::MessagesMaxShow,
        SettingKey::NewsHideBoring,
    ];

    pub fn category(&self) -> &'static str {
        match self {
            SettingKey::BeaconActive | SettingKey::BeaconInterval => "beacon",
            SettingKey::MessagesQueryEnabled
            | SettingKey::MessagesInterval
            | SettingKey::MessagesMaxShow => "messages",
            SettingKey::NewsHideBoring => "news",
        }
    }

    pub fn attribute(&self) -> &'static str {
        match self {
            SettingKey::BeaconActive => "active",
            SettingKey::BeaconInterval => "interval",
            SettingKey::MessagesQueryEnabled => "queryEnabled",
            SettingKey::MessagesInterval => "interval",
            SettingKey::MessagesMaxShow => "maxShow",
            SettingKey::NewsHideBoring => "hideBoring",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            SettingKey::BeaconActive
            | SettingKey::MessagesQueryEnabled
            | SettingKey::NewsHideBoring => ValueKind::Bool,
            SettingKey::BeaconInterval
            | SettingKey::MessagesInterval
            | SettingKey::MessagesMaxShow => ValueKind::Int,
        }
    }

    /// Key under which the attribute is persisted
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.category(), self.attribute())
    }

    /// Resolve a category/attribute pair against the schema
    pub fn lookup(category: &str, attribute: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.category() == category && k.attribute() == attribute)
    }

    fn is_known_category(category: &str) -> bool {
        Self::ALL.iter().any(|k| k.category() == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeaconSettings {
    pub active: bool,
    /// Delay between two beacon cycles, in milliseconds
    #[serde(rename = "interval")]
    pub interval_ms: u64,
}

impl BeaconSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for BeaconSettings {
    fn default() -> Self {
        Self {
            active: false,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSettings {
    #[serde(rename = "queryEnabled")]
    pub query_enabled: bool,
    #[serde(rename = "interval")]
    pub interval_ms: u64,
    #[serde(rename = "maxShow")]
    pub max_show: u64,
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            query_enabled: true,
            interval_ms: 5000,
            max_show: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NewsSettings {
    #[serde(rename = "hideBoring")]
    pub hide_boring: bool,
}

/// The complete preference record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Settings {
    pub beacon: BeaconSettings,
    pub messages: MessageSettings,
    pub news: NewsSettings,
}

impl Settings {
    pub fn value(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::BeaconActive => SettingValue::Bool(self.beacon.active),
            SettingKey::BeaconInterval => SettingValue::Int(self.beacon.interval_ms),
            SettingKey::MessagesQueryEnabled => SettingValue::Bool(self.messages.query_enabled),
            SettingKey::MessagesInterval => SettingValue::Int(self.messages.interval_ms),
            SettingKey::MessagesMaxShow => SettingValue::Int(self.messages.max_show),
            SettingKey::NewsHideBoring => SettingValue::Bool(self.news.hide_boring),
        }
    }

    /// Store `value` in the field for `key`; false if the types disagree.
    fn assign(&mut self, key: SettingKey, value: SettingValue) -> bool {
        match (key, value) {
            (SettingKey::BeaconActive, SettingValue::Bool(b)) => self.beacon.active = b,
            (SettingKey::BeaconInterval, SettingValue::Int(n)) => self.beacon.interval_ms = n,
            (SettingKey::MessagesQueryEnabled, SettingValue::Bool(b)) => {
                self.messages.query_enabled = b
            }
            (SettingKey::MessagesInterval, SettingValue::Int(n)) => self.messages.interval_ms = n,
            (SettingKey::MessagesMaxShow, SettingValue::Int(n)) => self.messages.max_show = n,
            (SettingKey::NewsHideBoring, SettingValue::Bool(b)) => self.news.hide_boring = b,
            _ => return false,
        }
        true
    }
}

/// Settings mirrored between memory and a persisted store
#[derive(Debug)]
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    settings: Settings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Build the in-memory record from defaults overlaid with whatever the
    /// store holds for each known attribute.
    pub fn initialize(mut store: S) -> Self {
        let mut settings = Settings::default();

        for key in SettingKey::ALL {
            let storage_key = key.storage_key();
            let decoded = match store.get_item(&storage_key) {
                Some(raw) => {
                    let value = SettingValue::decode(key.kind(), &raw);
                    if value.is_none() {
                        tracing::debug!("Discarding malformed stored value {}={:?}", storage_key, raw);
                    }
                    value
                }
                None => None,
            };

            match decoded {
                Some(value) => {
                    settings.assign(key, value);
                }
                None if key == SettingKey::MessagesQueryEnabled => {
                    let default = settings.value(key).encode();
                    if let Err(e) = store.set_item(&storage_key, &default) {
                        tracing::warn!("Failed to write default for {}: {}", storage_key, e);
                    }
                }
                None => {}
            }
        }

        tracing::info!(
            "Settings initialized: beacon active={}, interval={}ms",
            settings.beacon.active,
            settings.beacon.interval_ms
        );

        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn into_shared(self) -> SharedSettings<S> {
        Arc::new(RwLock::new(self))
    }

    /// Current value of `category.attribute`, or `None` if the pair is not
    /// part of the schema.
    pub fn get(&self, category: &str, attribute: &str) -> Option<SettingValue> {
        match SettingKey::lookup(category, attribute) {
            Some(key) => Some(self.settings.value(key)),
            None => {
                tracing::warn!("Unknown setting {}.{}", category, attribute);
                None
            }
        }
    }

    /// Persist and apply a new value.
    ///
    /// Returns `Ok(false)` without touching anything when the category or
    /// attribute is unknown or the value has the wrong type. A failed write
    /// leaves the in-memory value unchanged.
    pub fn set(
        &mut self,
        category: &str,
        attribute: &str,
        value: SettingValue,
    ) -> Result<bool, StoreError> {
        if !SettingKey::is_known_category(category) {
            tracing::warn!("Invalid category: {}", category);
            return Ok(false);
        }
        let Some(key) = SettingKey::lookup(category, attribute) else {
            tracing::warn!("Invalid attribute: {}", attribute);
            return Ok(false);
        };
        self.set_key(key, value)
    }

    pub fn set_key(&mut self, key: SettingKey, value: SettingValue) -> Result<bool, StoreError> {
        if key.kind() != value.kind() {
            tracing::warn!(
                "Rejecting {} for {}: expected {:?}",
                value,
                key.storage_key(),
                key.kind()
            );
            return Ok(false);
        }

        self.store.set_item(&key.storage_key(), &value.encode())?;
        self.settings.assign(key, value);
        Ok(true)
    }

    /// Flip a boolean attribute, returning its new value. `None` when the
    /// pair is unknown or not a boolean.
    pub fn toggle(&mut self, category: &str, attribute: &str) -> Result<Option<bool>, StoreError> {
        let Some(current) = self.get(category, attribute).and_then(|v| v.as_bool()) else {
            tracing::warn!("Cannot toggle {}.{}", category, attribute);
            return Ok(None);
        };
        let next = !current;
        self.set(category, attribute, SettingValue::Bool(next))?;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::storage::MemoryStore;

    /// Store that reads fine but refuses every write
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    fn sample_value(key: SettingKey) -> SettingValue {
        match key.kind() {
            ValueKind::Bool => SettingValue::Bool(!Settings::default().value(key).as_bool().unwrap()),
            ValueKind::Int => SettingValue::Int(4242),
        }
    }

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(!s.beacon.active);
        assert_eq!(s.beacon.interval_ms, 1000);
        assert!(s.messages.query_enabled);
        assert_eq!(s.messages.interval_ms, 5000);
        assert_eq!(s.messages.max_show, 25);
        assert!(!s.news.hide_boring);
    }

    #[test]
    fn test_set_then_get_survives_reinitialize() {
        let mut store = SettingsStore::initialize(MemoryStore::new());
        for key in SettingKey::ALL {
            let value = sample_value(key);
            assert!(store.set(key.category(), key.attribute(), value).unwrap());
            assert_eq!(store.get(key.category(), key.attribute()), Some(value));
        }

        let expected = store.settings().clone();
        let reloaded = SettingsStore::initialize(store.into_store());
        assert_eq!(reloaded.settings(), &expected);
    }

    #[test]
    fn test_unknown_names_change_nothing() {
        let mut store = SettingsStore::initialize(MemoryStore::new());
        let before = store.settings().clone();

        assert!(!store.set("weather", "active", SettingValue::Bool(true)).unwrap());
        assert!(!store.set("beacon", "volume", SettingValue::Int(3)).unwrap());
        assert_eq!(store.settings(), &before);
        assert!(store.store().get_item("weather.active").is_none());
        assert!(store.get("beacon", "volume").is_none());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut store = SettingsStore::initialize(MemoryStore::new());
        assert!(!store.set("beacon", "interval", SettingValue::Bool(true)).unwrap());
        assert_eq!(store.settings().beacon.interval_ms, 1000);
    }

    #[test]
    fn test_malformed_values_fall_back_to_defaults() {
        let mut raw = MemoryStore::new();
        raw.set_item("beacon.interval", "not-a-number").unwrap();
        raw.set_item("messages.maxShow", "-3").unwrap();
        raw.set_item("news.hideBoring", "\"yes\"").unwrap();
        raw.set_item("messages.interval", "7500.0").unwrap();

        let store = SettingsStore::initialize(raw);
        let s = store.settings();
        assert_eq!(s.beacon.interval_ms, 1000);
        assert_eq!(s.messages.max_show, 25);
        assert!(!s.news.hide_boring);
        assert_eq!(s.messages.interval_ms, 7500);
    }

    #[test]
    fn test_query_enabled_default_is_written_back() {
        let store = SettingsStore::initialize(MemoryStore::new());
        assert_eq!(
            store.store().get_item("messages.queryEnabled").as_deref(),
            Some("true")
        );
        // Other missing keys stay missing
        assert!(store.store().get_item("beacon.active").is_none());

        let mut raw = MemoryStore::new();
        raw.set_item("messages.queryEnabled", "12").unwrap();
        let store = SettingsStore::initialize(raw);
        assert!(store.settings().messages.query_enabled);
        assert_eq!(
            store.store().get_item("messages.queryEnabled").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_toggle() {
        let mut store = SettingsStore::initialize(MemoryStore::new());
        assert_eq!(store.toggle("news", "hideBoring").unwrap(), Some(true));
        assert!(store.settings().news.hide_boring);
        assert_eq!(store.store().get_item("news.hideBoring").as_deref(), Some("true"));
        assert_eq!(store.toggle("beacon", "interval").unwrap(), None);
    }

    #[test]
    fn test_encode_decode() {
        assert_eq!(SettingValue::Int(1000).encode(), "1000");
        assert_eq!(SettingValue::Bool(false).encode(), "false");
        assert_eq!(SettingValue::decode(ValueKind::Bool, "true"), Some(SettingValue::Bool(true)));
        assert_eq!(SettingValue::decode(ValueKind::Int, "1.5"), None);
        assert_eq!(SettingValue::decode(ValueKind::Int, "true"), None);
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let mut store = SettingsStore::initialize(ReadOnlyStore);
        let before = store.settings().clone();

        let result = store.set("beacon", "active", SettingValue::Bool(true));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.toggle("news", "hideBoring").is_err());
        assert_eq!(store.settings(), &before);
        assert_eq!(store.get("beacon", "active"), Some(SettingValue::Bool(false)));
    }
}
