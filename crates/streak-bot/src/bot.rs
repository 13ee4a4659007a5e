//! Event dispatch.
//!
//! Gateway events are turned into [`BotEvent`]s and handled one at a time.
//! A handler reads and updates the store, then returns the [`Effect`]s to
//! apply on Discord; [`Bot::execute`] applies them in order. Effects never
//! roll back the store: a failed nickname change is logged at debug level
//! and ignored, any other failed effect is logged as a warning.

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use streak_core::{StaffRoles, engine, leaderboard, nickname};
use streak_discord::models::interaction_type;
use streak_discord::{
    ChatPlatform, Embed, GatewayEvent, Interaction, InteractionHandle, InteractionResponse, Member,
    Message, ResponseData, User,
};
use streak_store::RecordStore;
use streak_types::{StreakRecord, UserId, millis};

use crate::commands::Command;
use crate::render;
use crate::state::AppState;

/// Errors raised while handling a single event.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Store error: {0}")]
    Store(#[from] streak_store::Error),
    #[error("Discord error: {0}")]
    Platform(#[from] streak_discord::Error),
    #[error(transparent)]
    Leaderboard(#[from] streak_core::Error),
    #[error("Malformed interaction: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, BotError>;

/// An event the bot reacts to.
#[derive(Debug, Clone)]
pub enum BotEvent {
    Message(Box<Message>),
    Command(Box<Interaction>),
    Button(Box<Interaction>),
}

impl BotEvent {
    /// Map a gateway event, `None` for events the bot does not act on.
    pub fn from_gateway(event: GatewayEvent) -> Option<Self> {
        match event {
            GatewayEvent::MessageCreate(message) => Some(BotEvent::Message(message)),
            GatewayEvent::InteractionCreate(interaction) => match interaction.kind {
                interaction_type::APPLICATION_COMMAND => Some(BotEvent::Command(interaction)),
                interaction_type::MESSAGE_COMPONENT => Some(BotEvent::Button(interaction)),
                _ => None,
            },
            GatewayEvent::Ready { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BotEvent::Message(_) => "message",
            BotEvent::Command(_) => "command",
            BotEvent::Button(_) => "button",
        }
    }
}

/// A change to make on Discord.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetNickname {
        guild: String,
        user: UserId,
        nick: String,
    },
    SendEmbed {
        channel: String,
        embed: Embed,
    },
    Respond {
        interaction: InteractionHandle,
        response: InteractionResponse,
    },
}

impl Effect {
    fn reply(interaction: &Interaction, data: ResponseData) -> Self {
        Effect::Respond {
            interaction: handle(interaction),
            response: InteractionResponse::message(data),
        }
    }

    fn deny(interaction: &Interaction, text: &str) -> Self {
        Self::reply(interaction, ResponseData::ephemeral_text(text))
    }
}

fn handle(interaction: &Interaction) -> InteractionHandle {
    InteractionHandle::new(&interaction.id, &interaction.token)
}

/// The streak bot.
pub struct Bot<S, P> {
    state: Arc<AppState<S>>,
    platform: Arc<P>,
    staff: StaffRoles,
}

impl<S: RecordStore, P: ChatPlatform> Bot<S, P> {
    pub fn new(state: Arc<AppState<S>>, platform: Arc<P>) -> Self {
        let staff = StaffRoles::new(state.config.access.staff_roles.iter().cloned());
        if staff.is_empty() {
            warn!("No staff roles configured; admin commands are disabled");
        }
        Self {
            state,
            platform,
            staff,
        }
    }

    /// Consume gateway events until the channel closes.
    pub async fn run(&self, mut events: mpsc::Receiver<GatewayEvent>) {
        while let Some(event) = events.recv().await {
            if let GatewayEvent::Ready { user, .. } = &event {
                info!("Connected to Discord as {}", user.tag());
                continue;
            }
            if let Some(event) = BotEvent::from_gateway(event) {
                self.handle(event).await;
            }
        }
        info!("Event stream closed");
    }

    /// Handle one event and apply its effects.
    pub async fn handle(&self, event: BotEvent) {
        self.state.stats.record_event();

        match self.dispatch(&event, millis::now()).await {
            Ok(effects) => {
                if self.execute(effects).await > 0 {
                    self.state.stats.record_failure();
                }
            }
            Err(e) => {
                warn!("Failed to handle {}: {}", event.kind(), e);
                self.state.stats.record_failure();
            }
        }
    }

    /// Run the handler for `event` as of `now` and return its effects.
    pub async fn dispatch(&self, event: &BotEvent, now: OffsetDateTime) -> Result<Vec<Effect>> {
        match event {
            BotEvent::Message(message) => self.on_message(message, now).await,
            BotEvent::Command(interaction) => self.on_command(interaction, now).await,
            BotEvent::Button(interaction) => self.on_button(interaction).await,
        }
    }

    /// Apply effects in order. Returns how many failed, nickname changes excluded.
    pub async fn execute(&self, effects: Vec<Effect>) -> usize {
        let mut failures = 0;

        for effect in effects {
            match &effect {
                Effect::SetNickname { guild, user, nick } => {
                    match self.platform.set_nickname(guild, user, nick).await {
                        Ok(()) => {}
                        Err(e) if e.is_rejection() => {
                            debug!("Could not set nickname of {} to {:?}: {}", user, nick, e);
                        }
                        Err(e) => warn!("Failed to set nickname of {}: {}", user, e),
                    }
                }
                Effect::SendEmbed { channel, embed } => {
                    if let Err(e) = self.platform.send_embed(channel, embed).await {
                        warn!("Failed to post to channel {}: {}", channel, e);
                        failures += 1;
                    }
                }
                Effect::Respond {
                    interaction,
                    response,
                } => {
                    if let Err(e) = self.platform.respond(interaction, response).await {
                        warn!("Failed to answer interaction {}: {}", interaction.id, e);
                        failures += 1;
                    }
                }
            }
        }

        failures
    }

    async fn on_message(&self, message: &Message, now: OffsetDateTime) -> Result<Vec<Effect>> {
        if message.author.bot {
            return Ok(Vec::new());
        }
        let Some(guild) = message.guild_id.as_deref() else {
            return Ok(Vec::new());
        };
        let user = &message.author.id;

        let transition = {
            let mut store = self.state.store.lock().await;
            let transition = engine::transition(store.get(user), now);
            if transition.changed() {
                store.set(user, transition.record)?;
            }
            transition
        };
        if !transition.changed() {
            debug!("{} already counted within the last 24h", user);
            return Ok(Vec::new());
        }

        let streak = transition.record.streak;
        self.state.stats.record_streak_update();
        info!(
            "Streak of {} is now {} ({:?})",
            message.author.tag(),
            streak,
            transition.outcome
        );

        let member = match &message.member {
            Some(member) => Some(Member {
                user: Some(message.author.clone()),
                ..member.clone()
            }),
            None => self.lookup_member(guild, user).await,
        };
        let name = display_name(member.as_ref(), Some(&message.author), user);

        let appearance = &self.state.config.appearance;
        let channels = &self.state.config.channels;
        let mut effects = Vec::new();

        if let Some(member) = &member
            && let Some(change) = nickname::plan(member.display_name(), streak)
        {
            effects.push(Effect::SetNickname {
                guild: guild.to_string(),
                user: user.clone(),
                nick: change.after.clone(),
            });
            if let Some(channel) = &channels.nickname_log {
                effects.push(Effect::SendEmbed {
                    channel: channel.clone(),
                    embed: render::nickname_log(appearance, &message.author, &change, now),
                });
            }
        }

        if let Some(channel) = &channels.streak_log {
            effects.push(Effect::SendEmbed {
                channel: channel.clone(),
                embed: render::streak_log(appearance, &name, streak, now),
            });
        }

        Ok(effects)
    }

    async fn on_command(&self, interaction: &Interaction, now: OffsetDateTime) -> Result<Vec<Effect>> {
        let Some(command) = Command::parse(interaction) else {
            warn!("Ignoring unknown command {:?}", interaction.command_name());
            return Ok(Vec::new());
        };
        let guild = interaction
            .guild_id
            .as_deref()
            .ok_or_else(|| BotError::Malformed("command used outside a guild".to_string()))?;

        if command.requires_staff() {
            let roles = interaction
                .member
                .as_ref()
                .map(|m| m.roles.as_slice())
                .unwrap_or(&[]);
            if !self.staff.permits(roles) {
                info!(
                    "Denied {:?} to non-staff caller {:?}",
                    interaction.command_name(),
                    caller_id(interaction)
                );
                return Ok(vec![Effect::deny(interaction, render::DENIED)]);
            }
        }

        let appearance = &self.state.config.appearance;

        match command {
            Command::Racha { target } => {
                let (user, member) = match target {
                    Some(target) => {
                        let member = self.resolve_member(interaction, guild, &target).await;
                        (target, member)
                    }
                    None => {
                        let user = caller_id(interaction).ok_or_else(|| {
                            BotError::Malformed("command without a caller".to_string())
                        })?;
                        (user, interaction.member.clone())
                    }
                };
                let record = self.state.store.lock().await.get(&user);
                let name = display_name(member.as_ref(), resolved_user(interaction, &user), &user);
                let card = render::streak_card(appearance, &name, record.streak, now);
                Ok(vec![Effect::reply(interaction, ResponseData::embed(card))])
            }

            Command::SumarRacha { target, days } => {
                let Ok(days) = u32::try_from(days) else {
                    return Ok(vec![Effect::deny(interaction, render::NEGATIVE_DAYS)]);
                };
                let adjusted = self
                    .adjust(interaction, guild, &target, |record| engine::add_days(record, days))
                    .await?;
                let Some((name, mut effects)) = adjusted else {
                    return Ok(vec![Effect::deny(interaction, render::UNKNOWN_MEMBER)]);
                };
                let embed = render::days_added(appearance, &name, days);
                effects.push(Effect::reply(interaction, ResponseData::embed(embed)));
                Ok(effects)
            }

            Command::ResetRacha { target } => {
                let adjusted = self
                    .adjust(interaction, guild, &target, |_| engine::reset())
                    .await?;
                let Some((name, mut effects)) = adjusted else {
                    return Ok(vec![Effect::deny(interaction, render::UNKNOWN_MEMBER)]);
                };
                let embed = render::streak_reset(appearance, &name);
                effects.push(Effect::reply(interaction, ResponseData::embed(embed)));
                Ok(effects)
            }

            Command::TopRachas => {
                let data = self.leaderboard(guild, 0).await;
                Ok(vec![Effect::reply(interaction, data)])
            }
        }
    }

    /// Apply an admin change to `target` and plan the nickname refresh.
    ///
    /// Returns the member's display name and the effects so far, or `None`
    /// without touching the store when `target` is not a guild member.
    async fn adjust(
        &self,
        interaction: &Interaction,
        guild: &str,
        target: &UserId,
        change: impl FnOnce(StreakRecord) -> StreakRecord,
    ) -> Result<Option<(String, Vec<Effect>)>> {
        let Some(member) = self.resolve_member(interaction, guild, target).await else {
            info!("Admin command names {}, who is not a member", target);
            return Ok(None);
        };

        let record = {
            let mut store = self.state.store.lock().await;
            let record = change(store.get(target));
            store.set(target, record)?;
            record
        };
        info!(
            "{} set streak of {} to {}",
            caller_id(interaction).map(|id| id.to_string()).unwrap_or_default(),
            target,
            record.streak
        );

        let mut effects = Vec::new();
        if let Some(change) = nickname::plan(member.display_name(), record.streak) {
            effects.push(Effect::SetNickname {
                guild: guild.to_string(),
                user: target.clone(),
                nick: change.after,
            });
        }
        Ok(Some((member.display_name().to_string(), effects)))
    }

    async fn on_button(&self, interaction: &Interaction) -> Result<Vec<Effect>> {
        let custom_id = interaction.custom_id().unwrap_or_default();
        let requested = leaderboard::parse_button_id(custom_id)?;
        let guild = interaction
            .guild_id
            .as_deref()
            .ok_or_else(|| BotError::Malformed("button used outside a guild".to_string()))?;

        let data = self.leaderboard(guild, requested).await;
        Ok(vec![Effect::Respond {
            interaction: handle(interaction),
            response: InteractionResponse::update(data),
        }])
    }

    /// Render a leaderboard page, skipping members that cannot be fetched.
    async fn leaderboard(&self, guild: &str, requested: i64) -> ResponseData {
        let page = {
            let store = self.state.store.lock().await;
            leaderboard::page(store.list_all(), requested)
        };

        let mut rows = Vec::with_capacity(page.entries.len());
        for entry in &page.entries {
            match self.platform.fetch_member(guild, &entry.user).await {
                Ok(Some(member)) => rows.push((entry.clone(), member.display_name().to_string())),
                Ok(None) => debug!("Skipping {}: not in guild", entry.user),
                Err(e) => debug!("Skipping {}: {}", entry.user, e),
            }
        }

        render::leaderboard(&self.state.config.appearance, &page, &rows)
    }

    /// The member an argument refers to, from the interaction or from Discord.
    async fn resolve_member(
        &self,
        interaction: &Interaction,
        guild: &str,
        user: &UserId,
    ) -> Option<Member> {
        match interaction.resolved_member(user) {
            Some(member) => Some(member),
            None => self.lookup_member(guild, user).await,
        }
    }

    async fn lookup_member(&self, guild: &str, user: &UserId) -> Option<Member> {
        match self.platform.fetch_member(guild, user).await {
            Ok(member) => member,
            Err(e) => {
                warn!("Failed to fetch member {}: {}", user, e);
                None
            }
        }
    }
}

fn caller_id(interaction: &Interaction) -> Option<UserId> {
    interaction
        .member
        .as_ref()
        .and_then(|m| m.id())
        .or(interaction.user.as_ref().map(|u| &u.id))
        .cloned()
}

fn resolved_user<'a>(interaction: &'a Interaction, user: &UserId) -> Option<&'a User> {
    interaction
        .data
        .as_ref()?
        .resolved
        .as_ref()?
        .users
        .get(user.as_str())
}

/// Member display name, then user name, then a mention.
fn display_name(member: Option<&Member>, user: Option<&User>, id: &UserId) -> String {
    if let Some(name) = member.map(Member::display_name).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    match user {
        Some(user) => user.global_name.clone().unwrap_or_else(|| user.username.clone()),
        None => format!("<@{}>", id),
    }
}
