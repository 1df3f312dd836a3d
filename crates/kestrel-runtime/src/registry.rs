//! Handler tree assembly.
//!
//! Turns the typed channel configuration into one root handler:
//!
//! ```text
//! [debug] ─► Mux(channel) ─► spam ─► chat middlewares ─► Mux(type: PRIVMSG)
//!                                                            │
//!                        Router[ Mux(reward), Mux(command) ] ◄┘
//!                                       │
//!                       trigger middlewares ─► action
//! ```
//!
//! Every failure here is a startup error: settings that parse but cannot be
//! built, or an action that needs a credential the bot was not given.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use kestrel_actions::{
    Elo, Emote, ExtensionEmotes, HttpClient, SongRequest, http_client, print,
};
use kestrel_core::kind;
use kestrel_framework::middleware::{Autorespond, DebugLogger, Filter};
use kestrel_framework::{BoxedHandler, KeyMatcher, Middleware, Mux, Router, wrap};

use crate::config::{
    ActionConfig, AppConfig, ChatConfig, ConfigError, ConfigResult, MiddlewareConfig,
    TriggerConfig,
};
use crate::credentials::Credentials;

/// Builds handlers and middlewares from their descriptors.
pub struct Registry<'a> {
    creds: &'a Credentials,
    command_prefix: char,
    http: OnceLock<HttpClient>,
}

impl<'a> Registry<'a> {
    pub fn new(creds: &'a Credentials, command_prefix: char) -> Self {
        Self {
            creds,
            command_prefix,
            http: OnceLock::new(),
        }
    }

    /// Builds the root handler for `config`.
    pub fn build(&self, config: &AppConfig) -> ConfigResult<BoxedHandler> {
        let mut channels = Mux::new(KeyMatcher::Channel);

        for channel in &config.channels {
            let Some(chat) = &channel.chat else {
                debug!(channel = %channel.name, "Channel has no chat handling");
                continue;
            };

            let handler = self.chat_handler(&channel.name, chat)?;
            channels.add(channel.name.to_lowercase(), handler, &[]);
        }

        let root = channels.into_handler();
        if config.debug {
            return Ok(wrap(root, &[DebugLogger.into_middleware()]));
        }
        Ok(root)
    }

    /// Builds the handler of one channel.
    pub fn chat_handler(&self, channel: &str, chat: &ChatConfig) -> ConfigResult<BoxedHandler> {
        let rewards = self.trigger_mux(channel, KeyMatcher::Reward, &chat.rewards)?;
        let commands = self.trigger_mux(
            channel,
            KeyMatcher::Command {
                prefix: self.command_prefix,
            },
            &chat.commands,
        )?;

        let mut chain = Vec::with_capacity(chat.middlewares.len() + 1);
        if let Some(spam) = &chat.spam {
            chain.push(Autorespond::spam(spam).into_middleware());
        }
        chain.extend(self.middlewares(channel, &chat.middlewares)?);

        let mut types = Mux::new(KeyMatcher::Type);
        types.add(kind::PRIVMSG, Router::new(vec![rewards, commands]).into_handler(), &chain);

        debug!(
            channel = %channel,
            rewards = chat.rewards.len(),
            commands = chat.commands.len(),
            "Chat handler built"
        );

        Ok(types.into_handler())
    }

    fn trigger_mux(
        &self,
        channel: &str,
        matcher: KeyMatcher,
        triggers: &[TriggerConfig],
    ) -> ConfigResult<Mux> {
        let mut mux = Mux::new(matcher);

        for trigger in triggers {
            let context = format!("channel '{channel}', trigger '{}'", trigger.key);
            let handler = self.action(&context, &trigger.action)?;
            let middlewares = self.middlewares(&context, &trigger.middlewares)?;
            mux.add(trigger.key.as_str(), handler, &middlewares);
        }

        Ok(mux)
    }

    /// Builds the handler for an action descriptor.
    pub fn action(&self, context: &str, action: &ActionConfig) -> ConfigResult<BoxedHandler> {
        let handler = match action {
            ActionConfig::Print(settings) => print(settings),
            ActionConfig::SongRequest(settings) => SongRequest::new(settings)
                .map_err(|e| ConfigError::invalid_settings(context, e))?
                .into_handler(),
            ActionConfig::Elo(settings) => {
                let key = self.creds.riot_api_key()?;
                Elo::with_api_key(self.http(context)?, settings, key)
                    .map_err(|e| ConfigError::invalid_settings(context, e))?
                    .into_handler()
            }
            ActionConfig::Emote => {
                Emote::new(Arc::new(ExtensionEmotes::new(self.http(context)?))).into_handler()
            }
        };

        Ok(handler)
    }

    /// Builds a middleware from its descriptor.
    pub fn middleware(&self, context: &str, config: &MiddlewareConfig) -> ConfigResult<Middleware> {
        let middleware = match config {
            MiddlewareConfig::Filter(settings) => Filter::new(settings)
                .map_err(|e| ConfigError::invalid_settings(context, e))?
                .into_middleware(),
            MiddlewareConfig::Autorespond(settings) => {
                Autorespond::new(settings).into_middleware()
            }
        };

        Ok(middleware)
    }

    /// Builds a list of middlewares, outermost first.
    pub fn middlewares(
        &self,
        context: &str,
        configs: &[MiddlewareConfig],
    ) -> ConfigResult<Vec<Middleware>> {
        configs
            .iter()
            .map(|config| self.middleware(context, config))
            .collect()
    }

    /// The HTTP client shared by every action, created on first use.
    fn http(&self, context: &str) -> ConfigResult<HttpClient> {
        if let Some(client) = self.http.get() {
            return Ok(client.clone());
        }

        let client = http_client().map_err(|e| ConfigError::invalid_settings(context, e))?;
        Ok(self.http.get_or_init(|| client).clone())
    }
}

/// Builds the root handler for `config`.
pub fn build_handler(config: &AppConfig, creds: &Credentials) -> ConfigResult<BoxedHandler> {
    Registry::new(creds, config.session.command_prefix).build(config)
}
