//! Configuration for the cachegate engine
//!
//! The configuration is an immutable record constructed once (from code or a
//! YAML file) and injected into the engine at startup; the engine owns no
//! implicit global state.

use crate::error::{CacheGateError, Result};
use crate::rules::RuleTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine configuration supplied by the host at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Origin the engine serves, used to resolve warm-set paths
    /// (e.g. "https://blog.example")
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix this engine is responsible for (default: "/")
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Segment holding pre-warmed and cache-first entries
    #[serde(default = "default_static_segment")]
    pub static_segment: String,

    /// Segment holding network-first and revalidated entries
    #[serde(default = "default_dynamic_segment")]
    pub dynamic_segment: String,

    /// Paths pre-loaded into the static segment during install
    #[serde(default = "default_warm_set")]
    pub warm_set: Vec<String>,

    /// Path of the designated offline fallback entry for navigations
    #[serde(default = "default_scope")]
    pub fallback_path: String,

    /// Path opened by the notification "open view" action
    #[serde(default = "default_notification_view")]
    pub notification_view: String,

    /// Ordered strategy rules; defaults to the built-in table
    #[serde(default)]
    pub rules: RuleTable,
}

// Default value functions for serde
fn default_origin() -> String {
    "http://localhost".to_string()
}

fn default_scope() -> String {
    "/".to_string()
}

fn default_static_segment() -> String {
    "static-v1".to_string()
}

fn default_dynamic_segment() -> String {
    "dynamic-v1".to_string()
}

fn default_warm_set() -> Vec<String> {
    vec![
        "/".to_string(),
        "/posts".to_string(),
        "/resources".to_string(),
        "/roadmap".to_string(),
        "/favicon.ico".to_string(),
        "/manifest.json".to_string(),
    ]
}

fn default_notification_view() -> String {
    "/posts".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            origin: default_origin(),
            scope: default_scope(),
            static_segment: default_static_segment(),
            dynamic_segment: default_dynamic_segment(),
            warm_set: default_warm_set(),
            fallback_path: default_scope(),
            notification_view: default_notification_view(),
            rules: RuleTable::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` if loading and validation succeed
    /// * `Err(CacheGateError)` if the file cannot be read or is invalid
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| CacheGateError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: EngineConfig = serde_yaml::from_str(&content)
            .map_err(|e| CacheGateError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Validation Rules
    /// - origin must be an http(s) URL without a trailing slash
    /// - scope, fallback_path, and every warm-set entry must start with '/'
    /// - segment names must be non-empty and distinct
    pub fn validate(&self) -> Result<()> {
        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(CacheGateError::ConfigError(format!(
                "origin must be an http(s) URL, got '{}'",
                self.origin
            )));
        }
        if self.origin.ends_with('/') {
            return Err(CacheGateError::ConfigError(
                "origin must not end with '/'".to_string(),
            ));
        }

        if !self.scope.starts_with('/') {
            return Err(CacheGateError::ConfigError(format!(
                "scope must start with '/', got '{}'",
                self.scope
            )));
        }
        if !self.fallback_path.starts_with('/') {
            return Err(CacheGateError::ConfigError(format!(
                "fallback_path must start with '/', got '{}'",
                self.fallback_path
            )));
        }

        if self.static_segment.is_empty() || self.dynamic_segment.is_empty() {
            return Err(CacheGateError::ConfigError(
                "segment names must not be empty".to_string(),
            ));
        }
        if self.static_segment == self.dynamic_segment {
            return Err(CacheGateError::ConfigError(format!(
                "static and dynamic segments must be distinct, both are '{}'",
                self.static_segment
            )));
        }

        for path in &self.warm_set {
            if !path.starts_with('/') {
                return Err(CacheGateError::ConfigError(format!(
                    "warm_set entries must start with '/', got '{}'",
                    path
                )));
            }
        }

        Ok(())
    }

    /// Segment names that make up the current generation's allow-list
    pub fn generation(&self) -> Vec<String> {
        vec![self.static_segment.clone(), self.dynamic_segment.clone()]
    }

    /// Warm-set paths resolved against the origin
    pub fn warm_set_urls(&self) -> Vec<String> {
        self.warm_set
            .iter()
            .map(|path| format!("{}{}", self.origin, path))
            .collect()
    }

    /// Absolute URL of the offline fallback entry
    pub fn fallback_url(&self) -> String {
        format!("{}{}", self.origin, self.fallback_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Strategy;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warm_set.len(), 6);
        assert_eq!(config.generation(), vec!["static-v1", "dynamic-v1"]);
    }

    #[test]
    fn test_warm_set_urls_resolved_against_origin() {
        let config = EngineConfig {
            origin: "https://blog.example".to_string(),
            ..Default::default()
        };
        let urls = config.warm_set_urls();
        assert_eq!(urls[0], "https://blog.example/");
        assert_eq!(urls[1], "https://blog.example/posts");
        assert_eq!(config.fallback_url(), "https://blog.example/");
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let config = EngineConfig {
            origin: "blog.example".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            origin: "https://blog.example/".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_identical_segments_rejected() {
        let config = EngineConfig {
            static_segment: "v1".to_string(),
            dynamic_segment: "v1".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_warm_set_entry_rejected() {
        let config = EngineConfig {
            warm_set: vec!["favicon.ico".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_parse_with_defaults() {
        let yaml = r#"
origin: "https://blog.example"
static_segment: "static-v2"
dynamic_segment: "dynamic-v2"
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.static_segment, "static-v2");
        // Unspecified fields fall back to defaults
        assert_eq!(config.scope, "/");
        assert_eq!(config.rules.default_strategy, Strategy::NetworkFirst);
    }
}
