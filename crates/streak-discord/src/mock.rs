//! Mock platform for testing.
//!
//! [`MockPlatform`] implements [`ChatPlatform`] in memory. Guild members are
//! seeded with [`MockPlatform::add_member`], every outbound call is recorded
//! as a [`PlatformCall`], and individual operations can be made to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use streak_types::UserId;

use crate::error::{Error, Result};
use crate::models::{CommandDefinition, Embed, InteractionResponse, Member, User};
use crate::platform::{ChatPlatform, InteractionHandle};

/// An outbound call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    FetchMember {
        guild: String,
        user: UserId,
    },
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
    RegisterCommands {
        guild: String,
        commands: Vec<CommandDefinition>,
    },
}

/// In-memory [`ChatPlatform`].
///
/// # Example
///
/// ```
/// use streak_discord::{ChatPlatform, MockPlatform};
/// use streak_types::UserId;
///
/// #[tokio::main]
/// async fn main() {
///     let platform = MockPlatform::new();
///     platform.add_member(MockPlatform::member(7, "luna", &[])).await;
///
///     platform.set_nickname("1", &UserId::new(7), "luna ✦ 🔥 1").await.unwrap();
///     assert_eq!(platform.nicknames().await, vec!["luna ✦ 🔥 1".to_string()]);
/// }
/// ```
#[derive(Default)]
pub struct MockPlatform {
    members: RwLock<HashMap<UserId, Member>>,
    calls: RwLock<Vec<PlatformCall>>,
    call_count: AtomicU32,
    fail_nickname: AtomicBool,
    fail_embeds: AtomicBool,
    fail_members: AtomicBool,
    fail_responses: AtomicBool,
}

impl std::fmt::Debug for MockPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPlatform")
            .field("call_count", &self.call_count.load(Ordering::Relaxed))
            .field("fail_nickname", &self.fail_nickname.load(Ordering::Relaxed))
            .field("fail_embeds", &self.fail_embeds.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a member fixture with the given id, username and role ids.
    pub fn member(id: u64, username: &str, roles: &[&str]) -> Member {
        Member {
            user: Some(User {
                id: UserId::new(id),
                username: username.to_string(),
                global_name: None,
                discriminator: None,
                avatar: None,
                bot: false,
            }),
            nick: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Make a member visible to `fetch_member`.
    pub async fn add_member(&self, member: Member) {
        if let Some(id) = member.id().cloned() {
            self.members.write().await.insert(id, member);
        }
    }

    /// Remove a member, as if they left the guild.
    pub async fn remove_member(&self, user: &UserId) {
        self.members.write().await.remove(user);
    }

    /// Current state of a seeded member.
    pub async fn get_member(&self, user: &UserId) -> Option<Member> {
        self.members.read().await.get(user).cloned()
    }

    /// Reject nickname changes, like a member above the bot in the role list.
    pub fn set_fail_nickname(&self, fail: bool) {
        self.fail_nickname.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_embeds(&self, fail: bool) {
        self.fail_embeds.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_members(&self, fail: bool) {
        self.fail_members.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_responses(&self, fail: bool) {
        self.fail_responses.store(fail, Ordering::Relaxed);
    }

    /// Number of calls made so far, failed ones included.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<PlatformCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
        self.call_count.store(0, Ordering::Relaxed);
    }

    /// Nicknames set successfully or not, in order.
    pub async fn nicknames(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                PlatformCall::SetNickname { nick, .. } => Some(nick.clone()),
                _ => None,
            })
            .collect()
    }

    /// Embeds posted to channels, with the channel id.
    pub async fn embeds(&self) -> Vec<(String, Embed)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                PlatformCall::SendEmbed { channel, embed } => Some((channel.clone(), embed.clone())),
                _ => None,
            })
            .collect()
    }

    /// Interaction replies, in order.
    pub async fn responses(&self) -> Vec<InteractionResponse> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                PlatformCall::Respond { response, .. } => Some(response.clone()),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: PlatformCall) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.calls.write().await.push(call);
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::Relaxed) {
            return Err(Error::Api {
                status: 403,
                message: format!("Missing Permissions ({what})"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn fetch_member(&self, guild: &str, user: &UserId) -> Result<Option<Member>> {
        self.record(PlatformCall::FetchMember {
            guild: guild.to_string(),
            user: user.clone(),
        })
        .await;
        if self.fail_members.load(Ordering::Relaxed) {
            return Err(Error::Mock("member lookup unavailable".to_string()));
        }
        Ok(self.members.read().await.get(user).cloned())
    }

    async fn set_nickname(&self, guild: &str, user: &UserId, nick: &str) -> Result<()> {
        self.record(PlatformCall::SetNickname {
            guild: guild.to_string(),
            user: user.clone(),
            nick: nick.to_string(),
        })
        .await;
        Self::check(&self.fail_nickname, "nickname")?;

        let mut members = self.members.write().await;
        let member = members.get_mut(user).ok_or_else(|| Error::Api {
            status: 404,
            message: "Unknown Member".to_string(),
        })?;
        member.nick = Some(nick.to_string());
        Ok(())
    }

    async fn send_embed(&self, channel: &str, embed: &Embed) -> Result<()> {
        self.record(PlatformCall::SendEmbed {
            channel: channel.to_string(),
            embed: embed.clone(),
        })
        .await;
        Self::check(&self.fail_embeds, "send message")
    }

    async fn respond(
        &self,
        interaction: &InteractionHandle,
        response: &InteractionResponse,
    ) -> Result<()> {
        self.record(PlatformCall::Respond {
            interaction: interaction.clone(),
            response: response.clone(),
        })
        .await;
        if self.fail_responses.load(Ordering::Relaxed) {
            return Err(Error::Api {
                status: 404,
                message: "Unknown interaction".to_string(),
            });
        }
        Ok(())
    }

    async fn register_commands(&self, guild: &str, commands: &[CommandDefinition]) -> Result<()> {
        self.record(PlatformCall::RegisterCommands {
            guild: guild.to_string(),
            commands: commands.to_vec(),
        })
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseData;

    #[tokio::test]
    async fn test_fetch_member() {
        let platform = MockPlatform::new();
        platform.add_member(MockPlatform::member(7, "luna", &["100"])).await;

        let member = platform.fetch_member("1", &UserId::new(7)).await.unwrap();
        assert_eq!(member.unwrap().roles, vec!["100".to_string()]);
        assert!(platform.fetch_member("1", &UserId::new(8)).await.unwrap().is_none());
        assert_eq!(platform.call_count(), 2);
    }

    #[tokio::test]
    async fn test_set_nickname_updates_member() {
        let platform = MockPlatform::new();
        platform.add_member(MockPlatform::member(7, "luna", &[])).await;

        platform.set_nickname("1", &UserId::new(7), "luna ✦ 🔥 3").await.unwrap();
        let member = platform.get_member(&UserId::new(7)).await.unwrap();
        assert_eq!(member.display_name(), "luna ✦ 🔥 3");
    }

    #[tokio::test]
    async fn test_nickname_failure_is_rejection() {
        let platform = MockPlatform::new();
        platform.add_member(MockPlatform::member(7, "luna", &[])).await;
        platform.set_fail_nickname(true);

        let err = platform
            .set_nickname("1", &UserId::new(7), "x")
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(platform.get_member(&UserId::new(7)).await.unwrap().nick, None);
        // the attempt is still recorded
        assert_eq!(platform.nicknames().await, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_records_embeds_and_responses() {
        let platform = MockPlatform::new();
        platform
            .send_embed("55", &Embed::new().title("Racha"))
            .await
            .unwrap();
        platform
            .respond(
                &InteractionHandle::new("1", "tok"),
                &InteractionResponse::message(ResponseData::ephemeral_text("no")),
            )
            .await
            .unwrap();

        let embeds = platform.embeds().await;
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].0, "55");
        assert!(platform.responses().await[0].is_ephemeral());

        platform.clear_calls().await;
        assert!(platform.calls().await.is_empty());
        assert_eq!(platform.call_count(), 0);
    }

    #[tokio::test]
    async fn test_member_lookup_failure() {
        let platform = MockPlatform::new();
        platform.set_fail_members(true);
        assert!(platform.fetch_member("1", &UserId::new(7)).await.is_err());
    }
}
