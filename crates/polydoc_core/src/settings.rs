//! Versioning settings and the providers they are read from.
//!
//! Settings live in an external key/value store grouped by name. The
//! version store re-reads the `versioning` group at every decision point,
//! so changes take effect without a restart.

use crate::error::{CoreError, CoreResult};
use crate::types::Status;
use parking_lot::RwLock;
use polydoc_storage::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Settings group holding the versioning switches.
pub const VERSIONING_GROUP: &str = "versioning";

/// Setting keys inside [`VERSIONING_GROUP`].
pub mod keys {
    /// Whether saves produce drafts at all.
    pub const DRAFTS_ENABLED: &str = "draftsEnabled";
    /// Whether publishing needs an explicit approval step.
    pub const REQUIRE_APPROVAL: &str = "requireApproval";
    /// Whether saves publish immediately.
    pub const AUTO_PUBLISH: &str = "autoPublish";
    /// Retention cap per (document, schema, locale).
    pub const MAX_VERSIONS: &str = "maxVersions";
}

/// One key/value entry of a settings group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting key.
    pub key: String,
    /// Setting value.
    pub value: Value,
}

impl Setting {
    /// Creates a setting.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Source of grouped settings.
pub trait SettingsProvider: Send + Sync {
    /// Returns every setting in `group`. Unknown groups are empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get_settings_by_group(&self, group: &str) -> CoreResult<Vec<Setting>>;
}

/// Settings held in memory, mutable at runtime.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    groups: RwLock<HashMap<String, Vec<Setting>>>,
}

impl InMemorySettings {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding the given versioning settings.
    #[must_use]
    pub fn with_versioning(settings: &VersioningSettings) -> Self {
        let provider = Self::new();
        provider.set_versioning(settings);
        provider
    }

    /// Sets (or replaces) one setting.
    pub fn set(&self, group: &str, key: &str, value: impl Into<Value>) {
        let mut groups = self.groups.write();
        let entries = groups.entry(group.to_string()).or_default();
        let value = value.into();
        match entries.iter_mut().find(|s| s.key == key) {
            Some(existing) => existing.value = value,
            None => entries.push(Setting::new(key, value)),
        }
    }

    /// Replaces the whole versioning group.
    pub fn set_versioning(&self, settings: &VersioningSettings) {
        self.groups
            .write()
            .insert(VERSIONING_GROUP.to_string(), settings.to_settings());
    }
}

impl SettingsProvider for InMemorySettings {
    fn get_settings_by_group(&self, group: &str) -> CoreResult<Vec<Setting>> {
        Ok(self.groups.read().get(group).cloned().unwrap_or_default())
    }
}

/// Settings loaded from a JSON document of the shape
/// `{ "<group>": [ { "key": "...", "value": ... } ] }`.
#[derive(Debug, Default)]
pub struct JsonSettings {
    inner: InMemorySettings,
}

impl JsonSettings {
    /// Parses settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the text is not a valid
    /// settings document.
    pub fn parse(json: &str) -> CoreResult<Self> {
        let groups: HashMap<String, Vec<Setting>> = serde_json::from_str(json)
            .map_err(|e| CoreError::configuration(format!("invalid settings document: {e}")))?;
        Ok(Self {
            inner: InMemorySettings {
                groups: RwLock::new(groups),
            },
        })
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

impl SettingsProvider for JsonSettings {
    fn get_settings_by_group(&self, group: &str) -> CoreResult<Vec<Setting>> {
        self.inner.get_settings_by_group(group)
    }
}

/// Effective versioning switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersioningSettings {
    /// Whether saves produce drafts.
    pub drafts_enabled: bool,
    /// Whether publishing needs approval.
    pub require_approval: bool,
    /// Whether saves publish immediately.
    pub auto_publish: bool,
    /// Retention cap per (document, schema, locale); 0 keeps everything.
    pub max_versions: u32,
}

impl Default for VersioningSettings {
    fn default() -> Self {
        Self {
            drafts_enabled: true,
            require_approval: false,
            auto_publish: false,
            max_versions: 20,
        }
    }
}

impl VersioningSettings {
    /// Reads the versioning group from `provider`.
    ///
    /// Missing keys keep their defaults; `default_max_versions` is the
    /// fallback retention cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or a value has the wrong
    /// shape.
    pub fn load(provider: &dyn SettingsProvider, default_max_versions: u32) -> CoreResult<Self> {
        let entries = provider.get_settings_by_group(VERSIONING_GROUP)?;
        let defaults = Self {
            max_versions: default_max_versions,
            ..Self::default()
        };
        Self::from_settings(&entries, defaults)
    }

    /// Applies `entries` over `defaults`. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] for values of the wrong shape.
    pub fn from_settings(entries: &[Setting], defaults: Self) -> CoreResult<Self> {
        let mut settings = defaults;
        for entry in entries {
            match entry.key.as_str() {
                keys::DRAFTS_ENABLED => settings.drafts_enabled = parse_bool(entry)?,
                keys::REQUIRE_APPROVAL => settings.require_approval = parse_bool(entry)?,
                keys::AUTO_PUBLISH => settings.auto_publish = parse_bool(entry)?,
                keys::MAX_VERSIONS => settings.max_versions = parse_count(entry)?,
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Encodes these settings as provider entries.
    pub fn to_settings(&self) -> Vec<Setting> {
        vec![
            Setting::new(keys::DRAFTS_ENABLED, self.drafts_enabled),
            Setting::new(keys::REQUIRE_APPROVAL, self.require_approval),
            Setting::new(keys::AUTO_PUBLISH, self.auto_publish),
            Setting::new(keys::MAX_VERSIONS, i64::from(self.max_versions)),
        ]
    }

    /// Status a freshly saved version starts in.
    ///
    /// Saves go live immediately when drafts are disabled, or when
    /// auto-publish is on and no approval is required.
    #[must_use]
    pub const fn initial_status(&self) -> Status {
        if !self.drafts_enabled || (self.auto_publish && !self.require_approval) {
            Status::Published
        } else {
            Status::Draft
        }
    }
}

fn parse_bool(entry: &Setting) -> CoreResult<bool> {
    // Older stores keep booleans as the strings "true"/"false"
    match &entry.value {
        Value::Bool(b) => Ok(*b),
        Value::Text(s) if s == "true" => Ok(true),
        Value::Text(s) if s == "false" => Ok(false),
        other => Err(CoreError::configuration(format!(
            "setting {} must be a boolean, got {other:?}",
            entry.key
        ))),
    }
}

fn parse_count(entry: &Setting) -> CoreResult<u32> {
    let parsed = match &entry.value {
        Value::Integer(n) => u32::try_from(*n).ok(),
        Value::Text(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CoreError::configuration(format!(
            "setting {} must be a non-negative integer, got {:?}",
            entry.key, entry.value
        ))
    })
}
