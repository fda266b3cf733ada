use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::storage::{SharedStore, StoreResult};

pub const GLOBAL_ENABLED_KEY: &str = "globalEnabled";
pub const GLOBAL_MODE_KEY: &str = "globalMode";
pub const SITE_KEY_PREFIX: &str = "site_";

/// Filter policy. `System` is resolved against the live theme at every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    System,
    Invert,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Invert => "invert",
        }
    }

    /// Unknown names fall back to `Invert`, never to "no filter".
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "system" => Self::System,
            "invert" => Self::Invert,
            other => {
                tracing::debug!(mode = other, "unrecognized mode; treating as invert");
                Self::Invert
            }
        }
    }

    /// Decode a stored value: missing, null or empty means `System`.
    pub fn from_stored(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            None | Some("") => Self::System,
            Some(raw) => Self::parse_lenient(raw),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            None | Some("") => Self::System,
            Some(raw) => Self::parse_lenient(raw),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub enabled: bool,
    pub mode: Mode,
}

/// Per-site override. The store encodes `Inherited` as an absent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mode", rename_all = "lowercase")]
pub enum SiteSetting {
    #[default]
    Inherited,
    Overridden(Mode),
}

impl SiteSetting {
    pub const fn is_overridden(self) -> bool {
        matches!(self, Self::Overridden(_))
    }

    pub const fn mode(self) -> Option<Mode> {
        match self {
            Self::Inherited => None,
            Self::Overridden(mode) => Some(mode),
        }
    }

    /// Decode a `site_*` record. Anything other than an object means no override.
    pub fn from_stored(value: Option<&Value>) -> Self {
        match value {
            Some(record @ Value::Object(_)) => {
                Self::Overridden(Mode::from_stored(record.get("mode")))
            }
            _ => Self::Inherited,
        }
    }

    pub fn to_stored(self) -> Option<Value> {
        self.mode().map(|mode| json!({ "mode": mode.as_str() }))
    }
}

/// Hostname plus path of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    pub fn new(hostname: &str, path: &str) -> Self {
        Self(format!("{hostname}{path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn store_key(&self) -> String {
        format!("{SITE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn read_global(store: &SharedStore) -> GlobalSettings {
    GlobalSettings {
        enabled: store.get(GLOBAL_ENABLED_KEY) == Some(Value::Bool(true)),
        mode: Mode::from_stored(store.get(GLOBAL_MODE_KEY).as_ref()),
    }
}

pub fn read_site(store: &SharedStore, site: &SiteKey) -> SiteSetting {
    SiteSetting::from_stored(store.get(&site.store_key()).as_ref())
}

pub fn write_global_enabled(store: &SharedStore, enabled: bool) -> StoreResult<u64> {
    store.set(GLOBAL_ENABLED_KEY, Value::Bool(enabled))
}

pub fn write_global_mode(store: &SharedStore, mode: Mode) -> StoreResult<u64> {
    store.set(GLOBAL_MODE_KEY, Value::String(mode.as_str().to_string()))
}

/// Persist a site setting; `Inherited` deletes the record.
pub fn write_site(store: &SharedStore, site: &SiteKey, setting: SiteSetting) -> StoreResult<u64> {
    match setting.to_stored() {
        Some(record) => store.set(&site.store_key(), record),
        None => store.remove(&site.store_key()),
    }
}

/// Drop the least recently written site records beyond `limit`, keeping `keep`.
pub fn evict_site_records(store: &SharedStore, keep: &SiteKey, limit: usize) -> StoreResult<usize> {
    let keep = keep.store_key();
    let mut records = store.entries_with_prefix(SITE_KEY_PREFIX);
    if records.len() <= limit {
        return Ok(0);
    }

    records.sort_by_key(|(_, version)| *version);
    let excess = records.len() - limit;
    let mut removed = 0;
    for (key, _) in records.into_iter().filter(|(key, _)| *key != keep) {
        if removed == excess {
            break;
        }
        store.remove(&key)?;
        tracing::debug!(key = %key, "evicted site override record");
        removed += 1;
    }
    Ok(removed)
}
