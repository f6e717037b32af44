//! Pipeline orchestration.
//!
//! Runs the whole resolution once: discover, parse, overlay environment
//! variables, expand dotted keys, merge onto defaults, normalize, and
//! deserialize into the typed [`Config`]. Single-threaded, synchronous and
//! run-to-completion; there is no partial-success mode.

use super::discover::discover_config_file;
use super::env::apply_env_overrides;
use super::expand::expand_dotted_keys;
use super::merge::merge_with_defaults;
use super::normalize::normalize;
use super::types::Config;
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

/// Resolves the server configuration from a base directory and a set of
/// environment variables.
///
/// The environment is taken as explicit pairs so tests can drive the
/// resolver without touching the process environment;
/// [`Resolver::from_process`] wires in `std::env::vars()`.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_dir: PathBuf,
    env: Vec<(String, String)>,
}

impl Resolver {
    /// Resolver over `base_dir` with the process environment.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            env: std::env::vars().collect(),
        }
    }

    /// Resolver over the current directory with the process environment.
    pub fn from_process() -> Self {
        Self::new(".")
    }

    /// Replace the environment variable set.
    pub fn with_env(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env = vars.into_iter().collect();
        self
    }

    /// Run the pipeline once and produce the final configuration.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut user = match discover_config_file(&self.base_dir) {
            Some(file) => {
                info!("Loading configuration from {}...", file.name);
                super::parse::parse_config_file(&file)?
            }
            None => Map::new(),
        };

        let applied = apply_env_overrides(&mut user, &self.env);
        if applied > 0 {
            info!(
                "Loaded {} {} from environment variables",
                applied,
                if applied == 1 { "value" } else { "values" }
            );
        }

        expand_dotted_keys(&mut user);

        let database_url = self
            .env
            .iter()
            .find(|(name, _)| name == "DATABASE_URL")
            .map(|(_, value)| value.as_str());
        let mut merged = merge_with_defaults(user, &self.base_dir, database_url)?;

        normalize(&mut merged)?;

        let config: Config = serde_json::from_value(Value::Object(merged))?;
        info!("Configuration ok");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn required_env() -> Vec<(String, String)> {
        vec![
            ("MM_TOKEN".to_string(), "abc".to_string()),
            ("MM_MAIL_GUILD_ID".to_string(), "100".to_string()),
            ("MM_MAIN_GUILD_ID".to_string(), "200".to_string()),
            ("MM_LOG_CHANNEL_ID".to_string(), "300".to_string()),
        ]
    }

    #[test]
    fn test_no_file_no_env_fails_on_required() {
        let temp = TempDir::new().unwrap();
        let err = Resolver::new(temp.path())
            .with_env(Vec::new())
            .resolve()
            .unwrap_err();
        match err {
            ConfigError::MissingRequired { key } => assert_eq!(key, "token"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_only_resolution() {
        let temp = TempDir::new().unwrap();
        let config = Resolver::new(temp.path())
            .with_env(required_env())
            .resolve()
            .unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.mail_guild_id, "100");
        assert_eq!(config.main_guild_id, vec!["200".to_string()]);
        assert_eq!(config.log_channel_id, "300");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.ini"),
            "prefix=?\ncommandAliases.mv=move\n",
        )
        .unwrap();
        let resolver = Resolver::new(temp.path()).with_env(required_env());
        let first = resolver.resolve().unwrap();
        let second = resolver.resolve().unwrap();
        assert_eq!(first, second);
    }
}
