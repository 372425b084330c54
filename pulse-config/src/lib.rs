//! Loader for workspace configuration with YAML + environment overlays.
//!
//! A `pulse.yaml` file declares the platform clients to construct; values
//! may reference environment variables with `${VAR}` syntax, and any
//! field can be overridden through `PULSE_`-prefixed environment
//! variables. Expansion is recursive with a depth cap so cyclic
//! references terminate.
use config::{Config, ConfigError, Environment, File};
use pulse_common::TelemetryPolicy;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct PulseConfig {
    pub version: Option<String>,
    pub platforms: Vec<PlatformSpec>,
}

/// Shared fields + the per-kind details.
#[derive(Debug, Deserialize)]
pub struct PlatformSpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: PlatformDetails,
}

/// The tag is `kind`; the payload lives in `config`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum PlatformDetails {
    #[serde(rename = "instagram")]
    Instagram { config: InstagramConfig },

    #[serde(rename = "tiktok")]
    Tiktok { config: TikTokConfig },

    #[serde(rename = "twitter")]
    Twitter { config: TwitterConfig },
}

#[derive(Debug, Deserialize)]
pub struct InstagramConfig {
    pub access_token: String,
    /// What to do when a response carries no quota headers.
    #[serde(default)]
    pub telemetry_policy: TelemetryPolicy,
}

#[derive(Debug, Deserialize)]
pub struct TikTokConfig {
    pub api_key: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    /// Upper bound on memoised request payloads.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    256
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct PulseConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PulseConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseConfigLoader {
    /// Start with sensible defaults: YAML file + `PULSE_` env overrides.
    ///
    /// ```
    /// use pulse_config::PulseConfigLoader;
    ///
    /// let config = PulseConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nplatforms: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.platforms.is_empty());
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("PULSE").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use pulse_config::{PlatformDetails, PulseConfigLoader};
    ///
    /// let cfg = PulseConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "test"
    /// platforms:
    ///   - id: "clips"
    ///     kind: "tiktok"
    ///     config:
    ///       api_key: "example"
    ///       user_id: "2222"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.platforms.len(), 1);
    /// assert!(matches!(cfg.platforms[0].details, PlatformDetails::Tiktok { .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Sources are merged, `${VAR}` placeholders expanded recursively, and
    /// the result materialised into strongly typed structs.
    pub fn load(self) -> Result<PulseConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PulseConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("PULSE_TEST_FOO", Some("bar"), || {
            let mut v = json!("prefix-${PULSE_TEST_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars(
            [("PULSE_TEST_KEY", Some("k1")), ("PULSE_TEST_UID", Some("9"))],
            || {
                let mut v = json!([
                    "key-$PULSE_TEST_KEY",
                    { "uid": "${PULSE_TEST_UID}-suffix" },
                    42,
                    true,
                    null
                ]);
                expand_env_in_value(&mut v);
                assert_eq!(v, json!(["key-k1", { "uid": "9-suffix" }, 42, true, null]));
            },
        );
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("PULSE_TEST_C", Some("qux")),
                ("PULSE_TEST_B", Some("mid-${PULSE_TEST_C}")),
                ("PULSE_TEST_A", Some("start-${PULSE_TEST_B}-end")),
            ],
            || {
                let mut v = json!("X=${PULSE_TEST_A}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars(
            [
                ("PULSE_TEST_X", Some("${PULSE_TEST_Y}")),
                ("PULSE_TEST_Y", Some("${PULSE_TEST_X}")),
            ],
            || {
                let mut v = json!("x=${PULSE_TEST_X}-y");
                // Only terminates thanks to the depth cap; the leftover
                // placeholder is expected.
                expand_env_in_value(&mut v);
                let s = v.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${PULSE_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${PULSE_DOES_NOT_EXIST}"));
    }
}
