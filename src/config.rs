//! Runtime configuration.
//!
//! Deserialized from TOML; every field has a default so an empty document is
//! a valid configuration. Triggers configured here are only the initial set;
//! the settings collaborator replaces them at runtime through
//! [`crate::SessionHandle::settings_changed`].

use std::time::Duration;

use promptdock_insert_engine::NavigatorConfig;
use promptdock_session::SessionConfig;
use promptdock_trigger_watcher::{TriggerSet, TriggerSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_TRIGGER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Disarm the picker when the pointer goes down outside the composer.
    /// Off by default.
    pub dismiss_on_outside_click: bool,
    /// How long the transient placeholder Tab-navigation handler stays
    /// registered after an insertion.
    pub placeholder_expiry_secs: u64,
    /// Initial trigger configuration.
    pub triggers: Vec<TriggerEntry>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dismiss_on_outside_click: false,
            placeholder_expiry_secs: 30,
            triggers: vec![TriggerEntry {
                value: DEFAULT_TRIGGER.to_string(),
                enabled: true,
            }],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriggerEntry {
    pub value: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl RuntimeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            dismiss_on_outside_click: self.dismiss_on_outside_click,
            navigator: NavigatorConfig {
                expiry: Duration::from_secs(self.placeholder_expiry_secs),
            },
        }
    }

    pub fn trigger_specs(&self) -> Vec<TriggerSpec> {
        self.triggers
            .iter()
            .map(|entry| TriggerSpec {
                value: entry.value.clone(),
                enabled: entry.enabled,
            })
            .collect()
    }

    pub fn trigger_set(&self) -> TriggerSet {
        TriggerSet::from_specs(self.trigger_specs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_default_config() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert!(!config.dismiss_on_outside_click);
        assert_eq!(config.placeholder_expiry_secs, 30);
        assert_eq!(config.triggers.len(), 1);
        assert_eq!(config.triggers[0].value, DEFAULT_TRIGGER);
    }

    #[test]
    fn triggers_parse_with_enabled_defaulting_on() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            dismiss_on_outside_click = true

            [[triggers]]
            value = "@@"

            [[triggers]]
            value = "//"
            enabled = false
            "#,
        )
        .unwrap();
        assert!(config.dismiss_on_outside_click);
        let set = config.trigger_set();
        assert_eq!(set.len(), 1);
        assert_eq!(set.matched_suffix("x@@"), Some("@@"));
    }

    #[test]
    fn malformed_document_reports_parse_error() {
        assert!(RuntimeConfig::from_toml_str("triggers = 3").is_err());
    }
}
