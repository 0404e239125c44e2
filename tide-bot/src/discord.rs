//! Serenity glue: gateway events in, interaction responses out.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::all::{
    Client, Command, ComponentInteractionDataKind, Context, CreateActionRow, CreateCommand,
    CreateInteractionResponse, CreateInteractionResponseMessage, CreateSelectMenu,
    CreateSelectMenuKind, CreateSelectMenuOption, EventHandler, GatewayIntents, GuildId, Http,
    Interaction, Ready,
};
use tide_core::{
    CommandRegistrar, CommandScope, CommandSpec, CommandStore, Config, InteractionController,
    InteractionEvent, InteractionReply, RegistrationError,
    interaction::{self, ComponentKind, SelectMenu},
};
use tracing::{info, warn};

/// Discord rejects select menus with more options than this.
const MAX_MENU_OPTIONS: usize = 25;

/// Validate config, load data, then connect and serve until the gateway stops.
pub async fn run(config: Config) -> Result<()> {
    let credentials = config.credentials()?;
    let controller = interaction::controller_from_config(&config, &credentials.tide_api_token)?;
    let command = config.command_spec();
    info!(command = %command.name, locale = %config.locale, "interaction controller ready");

    let handler = Handler {
        controller: Arc::new(controller),
        registrar: CommandRegistrar::new(config.command_scope()),
        command,
    };

    let mut client = Client::builder(&credentials.discord_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .context("Failed to build Discord gateway client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, closing gateway connections");
            shard_manager.shutdown_all().await;
        }
    });

    client.start().await.context("Discord gateway client stopped unexpectedly")
}

struct Handler {
    controller: Arc<InteractionController>,
    registrar: CommandRegistrar,
    command: CommandSpec,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, scope = %self.registrar.scope(), "gateway ready");

        let store = DiscordCommandStore::new(ctx.http.clone());
        self.registrar.ensure_registered(&store, &self.command).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let event = to_event(&interaction);
        let Some(reply) = self.controller.handle(&event).await else {
            return;
        };
        let response = to_response(reply);

        let sent = match &interaction {
            Interaction::Command(command) => command.create_response(&ctx.http, response).await,
            Interaction::Component(component) => {
                component.create_response(&ctx.http, response).await
            }
            _ => return,
        };

        if let Err(error) = sent {
            warn!(interaction_id = %interaction.id(), %error, "failed to send interaction response");
        }
    }
}

/// Application commands through Discord's REST API.
pub struct DiscordCommandStore {
    http: Arc<Http>,
}

impl DiscordCommandStore {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CommandStore for DiscordCommandStore {
    async fn list_commands(&self, scope: CommandScope) -> Result<Vec<String>, RegistrationError> {
        let commands = match scope {
            CommandScope::Global => Command::get_global_commands(&self.http).await,
            CommandScope::Guild(id) => GuildId::new(id).get_commands(&self.http).await,
        }
        .map_err(|e| RegistrationError::List(e.to_string()))?;

        Ok(commands.into_iter().map(|c| c.name).collect())
    }

    async fn create_command(
        &self,
        scope: CommandScope,
        spec: &CommandSpec,
    ) -> Result<(), RegistrationError> {
        let builder = CreateCommand::new(&spec.name).description(&spec.description);

        match scope {
            CommandScope::Global => Command::create_global_command(&self.http, builder).await,
            CommandScope::Guild(id) => GuildId::new(id).create_command(&self.http, builder).await,
        }
        .map(|_| ())
        .map_err(|e| RegistrationError::Create { name: spec.name.clone(), reason: e.to_string() })
    }
}

fn to_event(interaction: &Interaction) -> InteractionEvent {
    match interaction {
        Interaction::Command(command) => InteractionEvent::Command { name: command.data.name.clone() },
        Interaction::Component(component) => {
            component_event(&component.data.custom_id, &component.data.kind)
        }
        _ => InteractionEvent::Other,
    }
}

fn component_event(custom_id: &str, kind: &ComponentInteractionDataKind) -> InteractionEvent {
    let (kind, values) = match kind {
        ComponentInteractionDataKind::StringSelect { values } => {
            (ComponentKind::StringSelect, values.clone())
        }
        ComponentInteractionDataKind::Button => (ComponentKind::Other(2), Vec::new()),
        ComponentInteractionDataKind::Unknown(n) => (ComponentKind::from(*n), Vec::new()),
        _ => (ComponentKind::Other(0), Vec::new()),
    };

    InteractionEvent::Component { kind, custom_id: custom_id.to_string(), values }
}

fn to_response(reply: InteractionReply) -> CreateInteractionResponse {
    let mut message = CreateInteractionResponseMessage::new().content(reply.content);
    if reply.ephemeral {
        message = message.ephemeral(true);
    }
    if let Some(menu) = reply.menu.and_then(select_menu) {
        message = message.components(vec![CreateActionRow::SelectMenu(menu)]);
    }
    CreateInteractionResponse::Message(message)
}

/// `None` when there is nothing to pick from; Discord refuses an empty menu.
fn select_menu(menu: SelectMenu) -> Option<CreateSelectMenu> {
    if menu.options.is_empty() {
        warn!(custom_id = %menu.custom_id, "no locations to offer, sending prompt without a menu");
        return None;
    }
    if menu.options.len() > MAX_MENU_OPTIONS {
        warn!(
            offered = menu.options.len(),
            shown = MAX_MENU_OPTIONS,
            "too many locations for one menu, truncating"
        );
    }

    let options = menu
        .options
        .into_iter()
        .take(MAX_MENU_OPTIONS)
        .map(|o| CreateSelectMenuOption::new(o.label, o.value))
        .collect();

    Some(
        CreateSelectMenu::new(menu.custom_id, CreateSelectMenuKind::String { options })
            .placeholder(menu.placeholder),
    )
}
