use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::RegistrationError;

/// Where a slash command lives: bot-wide, or on a single guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandScope {
    Global,
    Guild(u64),
}

impl CommandScope {
    pub fn from_guild_id(guild_id: Option<u64>) -> Self {
        guild_id.map_or(CommandScope::Global, CommandScope::Guild)
    }
}

impl std::fmt::Display for CommandScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandScope::Global => f.write_str("global"),
            CommandScope::Guild(id) => write!(f, "guild:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
}

/// The platform's view of registered commands.
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Names of the commands currently registered in `scope`.
    async fn list_commands(&self, scope: CommandScope) -> Result<Vec<String>, RegistrationError>;

    async fn create_command(
        &self,
        scope: CommandScope,
        spec: &CommandSpec,
    ) -> Result<(), RegistrationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    AlreadyRegistered,
    Failed(String),
}

/// Registers a command only if one with the same name isn't there already.
#[derive(Debug, Clone, Copy)]
pub struct CommandRegistrar {
    scope: CommandScope,
}

impl CommandRegistrar {
    pub fn new(scope: CommandScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> CommandScope {
        self.scope
    }

    /// Never fails: errors are logged and reported as [`RegistrationOutcome::Failed`].
    pub async fn ensure_registered(
        &self,
        store: &dyn CommandStore,
        spec: &CommandSpec,
    ) -> RegistrationOutcome {
        match self.try_register(store, spec).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    command = %spec.name,
                    scope = %self.scope,
                    %error,
                    "command registration failed, continuing with existing commands"
                );
                RegistrationOutcome::Failed(error.to_string())
            }
        }
    }

    async fn try_register(
        &self,
        store: &dyn CommandStore,
        spec: &CommandSpec,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let existing = store.list_commands(self.scope).await?;

        if existing.iter().any(|name| name == &spec.name) {
            info!(command = %spec.name, scope = %self.scope, "command already registered, skipping");
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }

        store.create_command(self.scope, spec).await?;
        info!(command = %spec.name, scope = %self.scope, "registered command");
        Ok(RegistrationOutcome::Created)
    }
}
