use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SelfbotError};

pub const DEFAULT_PREFIX: &str = ".";
pub const DEFAULT_NOTICE_LIFETIME_SECS: u64 = 5;

/// Top-level config (selfbot.toml + SELFBOT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfbotConfig {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub notices: NoticesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Account token of the user the selfbot runs as, exactly as the
    /// client uses it. Sent verbatim in REST `Authorization` headers;
    /// a bot token needs its `Bot ` prefix written out.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Leading text that marks one of our own messages as a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesConfig {
    /// Seconds an ephemeral notice stays visible before it is deleted.
    #[serde(default = "default_lifetime")]
    pub lifetime: u64,
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            lifetime: default_lifetime(),
        }
    }
}

impl NoticesConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime)
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}
fn default_lifetime() -> u64 {
    DEFAULT_NOTICE_LIFETIME_SECS
}

impl SelfbotConfig {
    /// Load config from a TOML file with SELFBOT_* env var overrides.
    ///
    /// Uses `config_path` when given, otherwise `~/.selfbot/selfbot.toml`.
    /// Nested keys map to env vars by `_`, e.g. `SELFBOT_DISCORD_TOKEN`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(path = %path, "loading config");

        let config: SelfbotConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SELFBOT_").split("_"))
            .extract()
            .map_err(|e| SelfbotError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.commands.prefix.is_empty() {
            return Err(SelfbotError::Config(
                "commands.prefix must not be empty".to_string(),
            ));
        }
        if self.discord.token.trim().is_empty() {
            return Err(SelfbotError::Config("discord.token is empty".to_string()));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.selfbot/selfbot.toml", home)
}
