use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::utils::file::file_get;
use crate::utils::http::DEFAULT_TIMEOUT;

fn default_input() -> String {
    "V2RayConfigs".to_string()
}

fn default_template() -> String {
    "mihomo-config.json".to_string()
}

fn default_output() -> String {
    "generated/clashConfig.yaml".to_string()
}

fn default_placeholder_prefix() -> String {
    "proxy".to_string()
}

fn default_info_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_geo_endpoint() -> String {
    "http://ip-api.com/json/{host}".to_string()
}

fn default_geo_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_geo_delay() -> u64 {
    100
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of the geolocation lookups used for display names
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeoSettings {
    /// When off, every server is labelled with the unknown placeholder
    pub enabled: bool,
    /// Lookup URL; `{host}` is replaced with the server address
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Pause before each uncached lookup, to stay under the provider quota
    pub delay_ms: u64,
    /// Remember failed lookups for the rest of the run instead of retrying
    pub cache_failures: bool,
}

impl Default for GeoSettings {
    fn default() -> Self {
        GeoSettings {
            enabled: default_true(),
            endpoint: default_geo_endpoint(),
            timeout_secs: default_geo_timeout(),
            delay_ms: default_geo_delay(),
            cache_failures: false,
        }
    }
}

/// Settings of one conversion run
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_output")]
    pub output: String,
    /// Group members starting with this prefix are template placeholders
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
    #[serde(default = "default_info_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub geo: GeoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: default_input(),
            template: default_template(),
            output: default_output(),
            placeholder_prefix: default_placeholder_prefix(),
            log_level: default_info_log_level(),
            geo: GeoSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a file, picking the format from its extension.
    ///
    /// Files without a recognised extension are tried as TOML, then YAML.
    pub fn load_from_file(path: &str) -> Result<Self, SettingsError> {
        let content = file_get(path).map_err(|source| SettingsError::Io {
            path: path.to_string(),
            source,
        })?;

        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("yaml") | Some("yml") => Self::load_from_yaml(&content),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Self::load_from_content(&content),
        }
    }

    /// Load settings from text of unknown format.
    pub fn load_from_content(content: &str) -> Result<Self, SettingsError> {
        match toml::from_str(content) {
            Ok(settings) => Ok(settings),
            Err(toml_err) => Self::load_from_yaml(content).map_err(|_| toml_err.into()),
        }
    }

    fn load_from_yaml(content: &str) -> Result<Self, SettingsError> {
        // An empty YAML document deserializes as null rather than an empty map
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.input, "V2RayConfigs");
        assert_eq!(settings.template, "mihomo-config.json");
        assert_eq!(settings.output, "generated/clashConfig.yaml");
        assert_eq!(settings.placeholder_prefix, "proxy");
        assert!(settings.geo.enabled);
        assert_eq!(settings.geo.timeout_secs, 5);
        assert_eq!(settings.geo.delay_ms, 100);
        assert!(!settings.geo.cache_failures);
    }

    #[test]
    fn test_toml_content() {
        let toml_content = r#"
input = "links.txt"
log_level = "debug"

[geo]
enabled = false
cache_failures = true
        "#;

        let settings = Settings::load_from_content(toml_content).unwrap();
        assert_eq!(settings.input, "links.txt");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.template, "mihomo-config.json");
        assert!(!settings.geo.enabled);
        assert!(settings.geo.cache_failures);
        assert_eq!(settings.geo.delay_ms, 100);
    }

    #[test]
    fn test_yaml_file() {
        let yaml_content = r#"
output: out/config.yaml
placeholder_prefix: "placeholder"
geo:
  endpoint: "http://geo.local/{host}"
  delay_ms: 0
        "#;

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml_content.as_bytes()).unwrap();

        let settings = Settings::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.output, "out/config.yaml");
        assert_eq!(settings.placeholder_prefix, "placeholder");
        assert_eq!(settings.geo.endpoint, "http://geo.local/{host}");
        assert_eq!(settings.geo.delay_ms, 0);
        assert!(settings.geo.enabled);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load_from_file("/nonexistent/linkforge.toml").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }
}
