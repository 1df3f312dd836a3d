//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (`kestrel.yml`, `kestrel.yaml`, `config.yml`, `config.yaml`)
//! 3. Extra providers added with [`ConfigLoader::provider`]
//! 4. Environment variables (`KESTREL_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `KESTREL_` prefix with `__` as
//! separator:
//!
//! - `KESTREL_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `KESTREL_SESSION__RETRY_LIMIT=3` → `session.retry_limit = 3`
//!
//! # Example
//!
//! ```rust,ignore
//! use kestrel_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./config.yml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::{Figment, Provider};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::AppConfig;
use super::validation::validate_config;

const ENV_PREFIX: &str = "KESTREL_";

const FILE_NAMES: &[&str] = &["kestrel.yml", "kestrel.yaml", "config.yml", "config.yaml"];

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Providers merged after the config file.
    figment: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load. A missing file is an
    /// error, unlike a failed search.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges an additional source, e.g. `Yaml::string(..)`.
    pub fn provider<P: Provider>(mut self, provider: P) -> Self {
        self.figment = self.figment.merge(provider);
        self
    }

    /// Merges a configuration value over the defaults.
    pub fn merge(self, config: AppConfig) -> Self {
        self.provider(Serialized::defaults(config))
    }

    /// Loads, extracts and validates the configuration.
    pub fn load(self) -> ConfigResult<AppConfig> {
        let figment = self.build_figment()?;

        let config: AppConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            channels = config.channels.len(),
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = figment.merge(Yaml::file(path));
        } else {
            figment = self.load_config_file(figment);
        }

        figment = figment.merge(std::mem::take(&mut self.figment));

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kestrel"));
        }
        paths
    }

    /// Merges the first configuration file found in the search paths.
    fn load_config_file(&self, figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for name in FILE_NAMES {
                let path = search_path.join(name);
                if path.exists() {
                    info!(path = %path.display(), "Loading configuration file");
                    return figment.merge(Yaml::file(path));
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<AppConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<AppConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kestrel_actions::{PrintSettings, QueueType};
    use kestrel_framework::middleware::{FilterKind, PenaltyKind};

    use super::*;
    use crate::config::schema::{ActionConfig, LogLevel, MiddlewareConfig};

    fn load(yaml: &str) -> ConfigResult<AppConfig> {
        ConfigLoader::new()
            .search_path("/nonexistent")
            .without_env()
            .provider(Yaml::string(yaml))
            .load()
    }

    const FULL: &str = r#"
debug: true
logging:
  level: debug
  filters:
    kestrel_transport: trace
session:
  dial_timeout: 5s
  retry_limit: 3
channels:
  - name: streamer
    chat:
      spam:
        text: "Follow the channel!"
        period: 10m
      middlewares:
        - type: filter
          settings:
            type: blockLinks
            penalty: timeout
            duration: 1m
            reason: links
            allowMod: true
      rewards:
        - key: 0b1c-song
          action:
            type: songRequest
            settings:
              requestCmd: "!sr"
      commands:
        - key: hello
          action:
            type: print
            settings:
              text: hi there
          middlewares:
            - type: autorespond
              settings:
                text: "Use !help"
                period: 30s
                gap: 2
        - key: elo
          action:
            type: elo
            settings:
              region: euw
              summonerName: streamer
              queueType: flex
        - key: emote
          action:
            type: emote
  - name: quiet
"#;

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new()
            .search_path("/nonexistent")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.session.dial_timeout, Duration::from_secs(10));
        assert_eq!(config.session.retry_limit, 10);
        assert_eq!(config.session.initial_backoff, Duration::from_secs(2));
        assert_eq!(config.session.response_buffer, 10);
        assert_eq!(config.session.endpoint, "wss://irc-ws.chat.twitch.tv:443");
        assert!(config.channels.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = load(FULL).unwrap();

        assert!(config.debug);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.filters.get("kestrel_transport"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.session.dial_timeout, Duration::from_secs(5));
        assert_eq!(config.session.retry_limit, 3);
        assert_eq!(config.channel_names(), ["streamer", "quiet"]);

        let chat = config.channels[0].chat.as_ref().unwrap();
        assert_eq!(chat.spam.as_ref().unwrap().period, Duration::from_secs(600));

        let MiddlewareConfig::Filter(filter) = &chat.middlewares[0] else {
            panic!("expected a filter");
        };
        assert_eq!(filter.kind, FilterKind::BlockLinks);
        assert_eq!(filter.penalty, Some(PenaltyKind::Timeout));
        assert_eq!(filter.duration, Some(Duration::from_secs(60)));
        assert!(filter.allow_mod);

        assert_eq!(chat.rewards[0].action.type_name(), "songRequest");
        assert_eq!(
            chat.commands[0].action,
            ActionConfig::Print(PrintSettings {
                text: "hi there".into()
            })
        );
        assert!(matches!(
            &chat.commands[0].middlewares[0],
            MiddlewareConfig::Autorespond(settings) if settings.gap == 2
        ));
        assert!(matches!(
            &chat.commands[1].action,
            ActionConfig::Elo(settings) if settings.queue_type == QueueType::Flex
        ));
        assert_eq!(chat.commands[2].action, ActionConfig::Emote);

        assert!(config.channels[1].chat.is_none());
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let yaml = r#"
channels:
  - name: streamer
    chat:
      commands:
        - key: x
          action: { type: dance, settings: {} }
"#;
        assert!(matches!(load(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_draw_is_not_an_emote_alias() {
        let yaml = r#"
channels:
  - name: streamer
    chat:
      commands:
        - key: draw
          action: { type: draw }
"#;
        assert!(matches!(load(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_setting_is_rejected() {
        let yaml = r#"
channels:
  - name: streamer
    chat:
      commands:
        - key: x
          action: { type: print, settings: {} }
"#;
        assert!(matches!(load(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let yaml = "session:\n  dial_timeout: soon\n";
        assert!(matches!(load(yaml), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/kestrel.yml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
