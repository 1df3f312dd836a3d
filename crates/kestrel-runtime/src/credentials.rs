//! Login and API credentials.
//!
//! Read once at startup from a flat YAML file:
//!
//! ```yaml
//! twitchuser: my_bot
//! twitchpass: oauth:xxxxxxxx
//! riotapikey: RGAPI-xxxxxxxx
//! ```
//!
//! Every key can be overridden with a `KESTREL_CREDS_` environment variable,
//! e.g. `KESTREL_CREDS_TWITCHPASS`.

use std::fmt;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use tracing::debug;

use crate::config::{ConfigError, ConfigResult};

const ENV_PREFIX: &str = "KESTREL_CREDS_";

/// Credentials of the bot account and third-party services.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    twitchuser: String,
    twitchpass: String,
    #[serde(default)]
    riotapikey: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            twitchuser: user.into(),
            twitchpass: pass.into(),
            riotapikey: None,
        }
    }

    pub fn with_riot_api_key(mut self, key: impl Into<String>) -> Self {
        self.riotapikey = Some(key.into());
        self
    }

    /// Loads credentials from `path`, with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        Self::from_figment(Figment::from(Yaml::file(path)).merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Self::from_figment(Figment::from(Yaml::string(yaml)))
    }

    fn from_figment(figment: Figment) -> ConfigResult<Self> {
        let creds: Self = figment.extract()?;
        debug!(user = %creds.twitchuser, "Credentials loaded");
        Ok(creds)
    }

    /// Login name of the bot account.
    pub fn twitch_user(&self) -> &str {
        &self.twitchuser
    }

    /// OAuth token of the bot account, `oauth:` prefix included.
    pub fn twitch_pass(&self) -> &str {
        &self.twitchpass
    }

    pub fn riot_api_key(&self) -> ConfigResult<&str> {
        self.riotapikey
            .as_deref()
            .ok_or(ConfigError::MissingCredential("riotapikey"))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("twitchuser", &self.twitchuser)
            .field("twitchpass", &"<redacted>")
            .field("riotapikey", &self.riotapikey.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let creds = Credentials::from_yaml_str(
            "twitchuser: kestrel_bot\ntwitchpass: oauth:secret\nriotapikey: RGAPI-1\n",
        )
        .unwrap();

        assert_eq!(creds.twitch_user(), "kestrel_bot");
        assert_eq!(creds.twitch_pass(), "oauth:secret");
        assert_eq!(creds.riot_api_key().unwrap(), "RGAPI-1");
    }

    #[test]
    fn test_optional_api_key() {
        let creds =
            Credentials::from_yaml_str("twitchuser: kestrel_bot\ntwitchpass: oauth:secret\n")
                .unwrap();

        assert!(matches!(
            creds.riot_api_key(),
            Err(ConfigError::MissingCredential("riotapikey"))
        ));
    }

    #[test]
    fn test_login_is_required() {
        let result = Credentials::from_yaml_str("twitchuser: kestrel_bot\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::new("kestrel_bot", "oauth:secret").with_riot_api_key("RGAPI-1");
        let shown = format!("{creds:?}");

        assert!(shown.contains("kestrel_bot"));
        assert!(!shown.contains("secret"));
        assert!(!shown.contains("RGAPI"));
    }
}
