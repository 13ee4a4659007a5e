//! Trait abstraction over the chat platform.
//!
//! [`ChatPlatform`] covers every outbound call the bot makes, so handlers can
//! run against the real [`RestClient`](crate::RestClient) or the
//! [`MockPlatform`](crate::MockPlatform) in tests.

use async_trait::async_trait;

use streak_types::UserId;

use crate::error::Result;
use crate::models::{CommandDefinition, Embed, InteractionResponse, Member};

/// Identifies an interaction to reply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionHandle {
    pub id: String,
    pub token: String,
}

impl InteractionHandle {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
        }
    }
}

/// Outbound operations against the chat platform.
///
/// # Example
///
/// ```ignore
/// use streak_discord::{ChatPlatform, Embed, Result};
///
/// async fn announce<P: ChatPlatform>(platform: &P, channel: &str) -> Result<()> {
///     platform.send_embed(channel, &Embed::new().title("hola")).await
/// }
/// ```
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Fetch a guild member, `None` when the user is not in the guild.
    async fn fetch_member(&self, guild: &str, user: &UserId) -> Result<Option<Member>>;

    /// Change a member's guild nickname.
    async fn set_nickname(&self, guild: &str, user: &UserId, nick: &str) -> Result<()>;

    /// Post an embed to a channel.
    async fn send_embed(&self, channel: &str, embed: &Embed) -> Result<()>;

    /// Answer an interaction.
    async fn respond(
        &self,
        interaction: &InteractionHandle,
        response: &InteractionResponse,
    ) -> Result<()>;

    /// Replace the guild's slash commands.
    async fn register_commands(&self, guild: &str, commands: &[CommandDefinition]) -> Result<()>;
}
