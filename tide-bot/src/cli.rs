use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use tide_core::{
    Config, InteractionEvent, Locale, LocationDirectory,
    interaction::{self, ComponentKind, LOCATION_MENU_ID},
};

use crate::{discord, logging};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tide-bot", version, about = "Discord bot for daily tide forecasts")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to Discord and serve the tide command (default).
    Run,

    /// Interactively store the Discord and tide API credentials.
    Configure,

    /// Print the forecast reply for one location without going through Discord.
    Forecast {
        /// Location id as listed by `tide-bot locations`.
        location_id: String,

        /// Day to look up, YYYY-MM-DD; defaults to today in the configured timezone.
        #[arg(long)]
        date: Option<String>,
    },

    /// List known locations, optionally filtered by name.
    Locations {
        /// Case-insensitive part of the location name.
        query: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        let mut config = Config::load_from(&path)?;
        config.apply_env()?;
        logging::init(&config.logging);

        match self.command.unwrap_or(Command::Run) {
            Command::Run => discord::run(config).await,
            Command::Configure => configure(config, &path),
            Command::Forecast { location_id, date } => forecast(&config, location_id, date).await,
            Command::Locations { query } => locations(&config, query.as_deref().unwrap_or("")),
        }
    }
}

/// Answers collected by `configure`; empty strings mean "keep what's there".
#[derive(Debug, Default)]
struct ConfigureAnswers {
    discord_token: String,
    tide_api_token: String,
    guild_id: String,
    locale: Locale,
}

fn configure(mut config: Config, path: &Path) -> Result<()> {
    let keep_hint = "Leave empty to keep the current value";

    let discord_token = Password::new("Discord bot token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message(keep_hint)
        .prompt()?;

    let tide_api_token = Password::new("CWA open data API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message(keep_hint)
        .prompt()?;

    let current_guild = config.guild_id.map(|id| id.to_string()).unwrap_or_default();
    let guild_id = Text::new("Guild id for guild-only registration:")
        .with_default(&current_guild)
        .with_help_message("Leave empty to register the command globally")
        .prompt()?;

    let locales = vec![Locale::En, Locale::ZhTw];
    let start = locales.iter().position(|l| *l == config.locale).unwrap_or(0);
    let locale = Select::new("Reply language:", locales).with_starting_cursor(start).prompt()?;

    apply_answers(
        &mut config,
        ConfigureAnswers { discord_token, tide_api_token, guild_id, locale },
    )?;
    config.save_to(path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn apply_answers(config: &mut Config, answers: ConfigureAnswers) -> Result<()> {
    if !answers.discord_token.trim().is_empty() {
        config.discord_token = Some(answers.discord_token.trim().to_string());
    }
    if !answers.tide_api_token.trim().is_empty() {
        config.tide_api_token = Some(answers.tide_api_token.trim().to_string());
    }

    let guild = answers.guild_id.trim();
    config.guild_id = if guild.is_empty() {
        None
    } else {
        Some(guild.parse().with_context(|| format!("Guild id must be numeric, got '{guild}'"))?)
    };

    config.locale = answers.locale;
    Ok(())
}

async fn forecast(config: &Config, location_id: String, date: Option<String>) -> Result<()> {
    let token = config.require_tide_api_token()?;
    let controller = interaction::controller_from_config(config, &token)?;

    let date = match date {
        Some(raw) => parse_date(&raw)?,
        None => controller.today(),
    };

    let event = InteractionEvent::Component {
        kind: ComponentKind::StringSelect,
        custom_id: LOCATION_MENU_ID.to_string(),
        values: vec![location_id],
    };

    if let Some(reply) = controller.handle_on(&event, date).await {
        println!("{}", reply.content);
    }
    Ok(())
}

fn locations(config: &Config, query: &str) -> Result<()> {
    let directory = LocationDirectory::load(&config.locations_path)?;

    let matches = directory.search(query);
    if matches.is_empty() {
        println!("No locations match '{query}'.");
        return Ok(());
    }

    for entry in matches {
        println!("{}\t{}", entry.id, entry.name);
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}', expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["tide-bot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_forecast_with_date_and_config() {
        let cli = Cli::try_parse_from([
            "tide-bot",
            "forecast",
            "6300200",
            "--date",
            "2024-06-01",
            "--config",
            "/tmp/tide.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/tide.toml")));
        match cli.command {
            Some(Command::Forecast { location_id, date }) => {
                assert_eq!(location_id, "6300200");
                assert_eq!(date.as_deref(), Some("2024-06-01"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_date_accepts_iso_and_rejects_others() {
        assert_eq!(parse_date("2024-06-01").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_date("01/06/2024").is_err());
    }

    #[test]
    fn answers_keep_existing_tokens_when_blank() {
        let mut config = Config {
            discord_token: Some("old-bot".into()),
            tide_api_token: Some("old-cwa".into()),
            guild_id: Some(5),
            ..Config::default()
        };

        apply_answers(
            &mut config,
            ConfigureAnswers {
                discord_token: "".into(),
                tide_api_token: " new-cwa ".into(),
                guild_id: "".into(),
                locale: Locale::ZhTw,
            },
        )
        .unwrap();

        assert_eq!(config.discord_token.as_deref(), Some("old-bot"));
        assert_eq!(config.tide_api_token.as_deref(), Some("new-cwa"));
        assert_eq!(config.guild_id, None);
        assert_eq!(config.locale, Locale::ZhTw);
    }

    #[test]
    fn answers_reject_non_numeric_guild() {
        let mut config = Config::default();
        let answers = ConfigureAnswers { guild_id: "general".into(), ..ConfigureAnswers::default() };
        assert!(apply_answers(&mut config, answers).is_err());
    }

    #[tokio::test]
    async fn forecast_without_token_fails_before_any_request() {
        let config = Config::default();
        let err = forecast(&config, "X".into(), None).await.unwrap_err();
        assert!(err.to_string().contains("TIDE_API_TOKEN"));
    }

    #[tokio::test]
    async fn run_without_credentials_fails_before_connecting() {
        let config = Config { tide_api_token: Some("CWA".into()), ..Config::default() };
        let err = discord::run(config).await.unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn locations_lists_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.json");
        std::fs::write(&path, r#"{"1": "Anping"}"#).unwrap();

        let config = Config { locations_path: path, ..Config::default() };
        assert!(locations(&config, "anp").is_ok());
        assert!(locations(&config, "zzz").is_ok());
    }
}
