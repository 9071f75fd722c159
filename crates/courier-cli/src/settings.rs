use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use courier_core::DispatcherConfig;
use serde::{Deserialize, Serialize};

/// デモの設定
///
/// 読み込み順（後勝ち）:
/// 1. `config/courier.{json,toml,yaml}`（任意）
/// 2. `--config` で渡されたファイル（指定時は必須）
/// 3. `COURIER_` で始まる環境変数（ネストは `__`、例: `COURIER_DISPATCHER__FAILURE_POLICY`）
///
/// Every field has a serde default, so an empty source set is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_producers")]
    pub producers: usize,
    #[serde(default = "default_events_per_producer")]
    pub events_per_producer: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_producers() -> usize {
    4
}

fn default_events_per_producer() -> usize {
    25
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherConfig::default(),
            log_level: default_log_level(),
            producers: default_producers(),
            events_per_producer: default_events_per_producer(),
        }
    }
}

impl Settings {
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::build(path, environment())
    }

    fn build(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name("config/courier").required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.add_source(env).build()?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("COURIER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Same environment source, fed from a map instead of the process env.
#[cfg(test)]
fn environment_from(vars: &[(&str, &str)]) -> Environment {
    let vars: config::Map<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    environment().source(Some(vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::FailurePolicy;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn no_sources_gives_defaults() {
        let settings = Settings::build(None, environment_from(&[])).unwrap();

        assert_eq!(settings.producers, 4);
        assert_eq!(settings.events_per_producer, 25);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.dispatcher.failure_policy, FailurePolicy::Halt);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config(
            r#"{"dispatcher":{"failure_policy":"collect"},"producers":2,"log_level":"debug"}"#,
        );

        let settings = Settings::build(Some(file.path()), environment_from(&[])).unwrap();

        assert_eq!(settings.dispatcher.failure_policy, FailurePolicy::Collect);
        assert_eq!(settings.producers, 2);
        assert_eq!(settings.events_per_producer, 25);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(r#"{"producers":2,"events_per_producer":10}"#);
        let env = environment_from(&[
            ("COURIER_PRODUCERS", "1"),
            ("COURIER_DISPATCHER__FAILURE_POLICY", "collect"),
        ]);

        let settings = Settings::build(Some(file.path()), env).unwrap();

        assert_eq!(settings.producers, 1);
        assert_eq!(settings.events_per_producer, 10);
        assert_eq!(settings.dispatcher.failure_policy, FailurePolicy::Collect);
    }

    #[test]
    fn unprefixed_variables_are_ignored() {
        let env = environment_from(&[("PRODUCERS", "9")]);
        let settings = Settings::build(None, env).unwrap();
        assert_eq!(settings.producers, 4);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = Settings::build(
            Some(Path::new("/nonexistent/courier.json")),
            environment_from(&[]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("{ not json");
        let result = Settings::build(Some(file.path()), environment_from(&[]));
        assert!(result.is_err());
    }
}
