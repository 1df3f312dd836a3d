//! Configuration validation utilities.
//!
//! Type-level problems (unknown action names, missing settings) are caught
//! during extraction; this pass checks the values that parse but make no
//! sense together.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{AppConfig, ChatConfig, LogOutput, SessionConfig, TriggerConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &AppConfig) -> ConfigResult<()> {
    validate_session_config(&config.session)?;

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when output is 'file'",
        ));
    }

    let mut seen = HashSet::new();
    for channel in &config.channels {
        validate_channel_name(&channel.name)?;

        if !seen.insert(channel.name.to_lowercase()) {
            return Err(ConfigError::validation(format!(
                "Duplicate channel: {}",
                channel.name
            )));
        }

        if let Some(chat) = &channel.chat {
            validate_chat_config(&channel.name, chat, config.session.command_prefix)?;
        }
    }

    Ok(())
}

fn validate_session_config(session: &SessionConfig) -> ConfigResult<()> {
    if session.endpoint.is_empty() {
        return Err(ConfigError::validation("session.endpoint must not be empty"));
    }

    if session.dial_timeout.is_zero() {
        return Err(ConfigError::validation(
            "session.dial_timeout must be greater than 0",
        ));
    }

    if session.retry_limit == 0 {
        return Err(ConfigError::validation(
            "session.retry_limit must be at least 1",
        ));
    }

    if session.response_buffer == 0 {
        return Err(ConfigError::validation(
            "session.response_buffer must be at least 1",
        ));
    }

    if session.command_prefix.is_whitespace() {
        return Err(ConfigError::validation(
            "session.command_prefix must not be whitespace",
        ));
    }

    Ok(())
}

fn validate_channel_name(name: &str) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::validation("Channel name must not be empty"));
    }

    if name.starts_with('#') {
        return Err(ConfigError::validation(format!(
            "Channel name must not start with '#': {name}"
        )));
    }

    if name.contains(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Channel name cannot contain spaces: {name}"
        )));
    }

    Ok(())
}

fn validate_chat_config(channel: &str, chat: &ChatConfig, prefix: char) -> ConfigResult<()> {
    validate_triggers(channel, "reward", &chat.rewards)?;
    validate_triggers(channel, "command", &chat.commands)?;

    for trigger in &chat.commands {
        if trigger.key.starts_with(prefix) {
            return Err(ConfigError::validation(format!(
                "Command '{}' in channel '{channel}' must not include the '{prefix}' prefix",
                trigger.key
            )));
        }
    }

    Ok(())
}

fn validate_triggers(channel: &str, kind: &str, triggers: &[TriggerConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for trigger in triggers {
        if trigger.key.is_empty() || trigger.key.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid {kind} key '{}' in channel '{channel}'",
                trigger.key
            )));
        }

        if !seen.insert(trigger.key.as_str()) {
            return Err(ConfigError::validation(format!(
                "Duplicate {kind} key '{}' in channel '{channel}'",
                trigger.key
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use kestrel_actions::PrintSettings;

    use super::*;
    use crate::config::schema::{ActionConfig, ChannelConfig};

    fn print_trigger(key: &str) -> TriggerConfig {
        TriggerConfig {
            key: key.to_string(),
            action: ActionConfig::Print(PrintSettings { text: "hi".into() }),
            middlewares: Vec::new(),
        }
    }

    fn config_with_commands(commands: Vec<TriggerConfig>) -> AppConfig {
        AppConfig {
            channels: vec![ChannelConfig {
                name: "streamer".into(),
                chat: Some(ChatConfig {
                    commands,
                    ..Default::default()
                }),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_empty_config() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_commands() {
        let ok = config_with_commands(vec![print_trigger("hello"), print_trigger("elo")]);
        assert!(validate_config(&ok).is_ok());

        for bad in [
            vec![print_trigger("hello"), print_trigger("hello")],
            vec![print_trigger("!hello")],
            vec![print_trigger("")],
            vec![print_trigger("two words")],
        ] {
            let result = validate_config(&config_with_commands(bad));
            assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
        }
    }

    #[test]
    fn test_validate_channels() {
        let mut config = AppConfig::default();
        for name in ["streamer", "Streamer"] {
            config.channels.push(ChannelConfig {
                name: name.into(),
                chat: None,
            });
        }
        assert!(validate_config(&config).is_err());

        config.channels.truncate(1);
        config.channels[0].name = "#streamer".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_session() {
        let mut config = AppConfig::default();
        config.session.retry_limit = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.session.response_buffer = 0;
        assert!(validate_config(&config).is_err());
    }
}
