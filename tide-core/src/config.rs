use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::TideError,
    forecast::cwa::{DEFAULT_BASE_URL, DEFAULT_RESOURCE_ID},
    locale::Locale,
    registrar::{CommandScope, CommandSpec},
};

pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_TIDE_API_TOKEN: &str = "TIDE_API_TOKEN";
pub const ENV_GUILD_ID: &str = "DISCORD_GUILD_ID";
pub const ENV_LOCATIONS_PATH: &str = "TIDE_LOCATIONS_PATH";
pub const ENV_LOCALE: &str = "TIDE_LOCALE";

/// Slash command text. Unset fields fall back to the locale's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TideApiConfig {
    pub base_url: String,
    pub resource_id: String,
    pub timeout_secs: u64,
}

impl Default for TideApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource_id: DEFAULT_RESOURCE_ID.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::default() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// discord_token = "..."
/// tide_api_token = "CWA-..."
/// guild_id = 123456789012345678
/// locale = "zh-TW"
///
/// [command]
/// name = "潮汐查詢"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discord_token: Option<String>,
    pub tide_api_token: Option<String>,

    /// When set, the command is registered on this guild only instead of globally.
    pub guild_id: Option<u64>,

    pub locations_path: PathBuf,
    pub locale: Locale,

    /// IANA zone used to decide what "today" is.
    pub timezone: String,

    pub command: CommandConfig,
    pub tide_api: TideApiConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: None,
            tide_api_token: None,
            guild_id: None,
            locations_path: PathBuf::from("data/locations.json"),
            locale: Locale::default(),
            timezone: "Asia/Taipei".to_string(),
            command: CommandConfig::default(),
            tide_api: TideApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Both tokens, checked to be present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub discord_token: String,
    pub tide_api_token: String,
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tide-bot", "tide-bot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), TideError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), TideError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_DISCORD_TOKEN) {
            self.discord_token = Some(token);
        }
        if let Some(token) = get(ENV_TIDE_API_TOKEN) {
            self.tide_api_token = Some(token);
        }
        if let Some(raw) = get(ENV_GUILD_ID) {
            let id = raw.trim().parse::<u64>().map_err(|_| {
                TideError::config(format!("{ENV_GUILD_ID} must be a numeric id, got '{raw}'"))
            })?;
            self.guild_id = Some(id);
        }
        if let Some(path) = get(ENV_LOCATIONS_PATH) {
            self.locations_path = PathBuf::from(path);
        }
        if let Some(raw) = get(ENV_LOCALE) {
            self.locale = Locale::try_from(raw.trim())
                .map_err(|e| TideError::config(format!("{ENV_LOCALE}: {e}")))?;
        }

        Ok(())
    }

    /// Both tokens, or a config error naming whichever is missing.
    pub fn credentials(&self) -> Result<Credentials, TideError> {
        Ok(Credentials {
            discord_token: required_token(self.discord_token.as_deref(), ENV_DISCORD_TOKEN)?,
            tide_api_token: self.require_tide_api_token()?,
        })
    }

    /// The tide API token alone, for commands that never touch Discord.
    pub fn require_tide_api_token(&self) -> Result<String, TideError> {
        required_token(self.tide_api_token.as_deref(), ENV_TIDE_API_TOKEN)
    }

    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            name: self
                .command
                .name
                .clone()
                .unwrap_or_else(|| self.locale.default_command_name().to_string()),
            description: self
                .command
                .description
                .clone()
                .unwrap_or_else(|| self.locale.default_command_description().to_string()),
        }
    }

    pub fn command_scope(&self) -> CommandScope {
        CommandScope::from_guild_id(self.guild_id)
    }

    pub fn timezone(&self) -> Result<Tz, TideError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| TideError::config(format!("Unknown timezone '{}'", self.timezone)))
    }
}

fn required_token(value: Option<&str>, name: &str) -> Result<String, TideError> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string).ok_or_else(|| {
        TideError::config(format!(
            "{name} is not set.\n\
             Hint: export {name} or run `tide-bot configure`."
        ))
    })
}
