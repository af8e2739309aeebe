//! Layered settings loader: defaults, optional file, environment

use super::{ConfigError, Settings};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Variables read without a prefix
const BARE_KEYS: &[&str] = &["OPA_SERVER_URL", "APP_NAME", "DEBUG", "HOST", "PORT"];

/// Prefix for every other key, e.g. `POLICY_GATE_METRICS_PORT`
pub const ENV_PREFIX: &str = "POLICY_GATE";

/// Settings loader
///
/// Later sources win: an environment variable overrides the same key from
/// the file, which overrides the built-in default. Only the five service
/// variables are read unprefixed; a prefixed variable beats its bare form.
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env: Option<config::Map<String, String>>,
}

impl SettingsLoader {
    /// Create a loader reading only defaults and the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration file (format inferred from its extension)
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use the given variables instead of the process environment
    pub fn env_source<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Build and validate the settings
    pub fn load(self) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();

        if let Some(ref path) = self.file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let vars: config::Map<String, String> = match self.env {
            Some(vars) => vars,
            None => std::env::vars().collect(),
        };
        let bare: config::Map<String, String> = vars
            .iter()
            .filter(|(key, _)| BARE_KEYS.iter().any(|bare| bare.eq_ignore_ascii_case(key)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let prefixed = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("exempt_paths")
            .source(Some(vars));

        let settings: Settings = builder
            .add_source(Environment::default().try_parsing(true).source(Some(bare)))
            .add_source(prefixed)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}
