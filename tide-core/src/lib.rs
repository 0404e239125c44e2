//! Core library for the tide forecast bot.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The location directory and the CWA tide forecast client
//! - Idempotent slash-command registration
//! - The command → menu → forecast interaction flow
//!
//! Nothing here talks to the chat gateway directly; `tide-bot` adapts these
//! types to Discord.

pub mod config;
pub mod error;
pub mod forecast;
pub mod interaction;
pub mod locale;
pub mod location;
pub mod model;
pub mod registrar;

pub use config::{Config, Credentials};
pub use error::{ForecastError, RegistrationError, TideError};
pub use forecast::TideForecastSource;
pub use interaction::{InteractionController, InteractionEvent, InteractionReply};
pub use locale::Locale;
pub use location::LocationDirectory;
pub use model::{ForecastQuery, ForecastTime, LocationEntry, TideEvent};
pub use registrar::{CommandRegistrar, CommandScope, CommandSpec, CommandStore};
