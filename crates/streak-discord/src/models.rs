//! Discord wire models.
//!
//! Only the fields the bot reads or writes are modelled; unknown fields are
//! ignored on input and omitted on output.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use streak_types::UserId;

/// Guild (server) id.
pub type GuildId = String;
/// Channel id.
pub type ChannelId = String;

const CDN: &str = "https://cdn.discordapp.com";

/// A Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// `name#1234` for legacy accounts, the bare username otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" && !d.is_empty() => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    /// Avatar URL, falling back to the default avatar for the account.
    pub fn avatar_url(&self) -> String {
        if let Some(hash) = &self.avatar {
            let ext = if hash.starts_with("a_") { "gif" } else { "png" };
            return format!("{CDN}/avatars/{}/{hash}.{ext}", self.id);
        }

        let index = match self.discriminator.as_deref().and_then(|d| d.parse::<u64>().ok()) {
            Some(d) if d != 0 => d % 5,
            _ => self.id.as_u64().map(|id| (id >> 22) % 6).unwrap_or(0),
        };
        format!("{CDN}/embed/avatars/{index}.png")
    }
}

/// A guild member.
///
/// Member objects nested in messages and resolved interaction data omit
/// `user`; see [`Interaction::resolved_member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Member {
    /// Guild nickname, then global display name, then username.
    pub fn display_name(&self) -> &str {
        if let Some(nick) = self.nick.as_deref() {
            return nick;
        }
        match &self.user {
            Some(user) => user.global_name.as_deref().unwrap_or(&user.username),
            None => "",
        }
    }

    pub fn id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }
}

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub author: User,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub content: String,
}

/// Interaction kinds the bot handles.
pub mod interaction_type {
    pub const PING: u8 = 1;
    pub const APPLICATION_COMMAND: u8 = 2;
    pub const MESSAGE_COMPONENT: u8 = 3;
}

/// A slash command invocation or component click.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

/// Payload of an interaction.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Option<Resolved>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// A single command argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Users and members referenced by command arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Resolved {
    #[serde(default)]
    pub users: HashMap<String, User>,
    #[serde(default)]
    pub members: HashMap<String, Member>,
}

impl Interaction {
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref()?.name.as_deref()
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref()?.custom_id.as_deref()
    }

    fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)?
            .value
            .as_ref()
    }

    /// A user-typed argument, as the user id it refers to.
    pub fn option_user(&self, name: &str) -> Option<UserId> {
        self.option(name)?.as_str().map(UserId::from)
    }

    pub fn option_integer(&self, name: &str) -> Option<i64> {
        self.option(name)?.as_i64()
    }

    /// A member referenced by an argument, with its `user` filled in.
    pub fn resolved_member(&self, user: &UserId) -> Option<Member> {
        let resolved = self.data.as_ref()?.resolved.as_ref()?;
        let mut member = resolved.members.get(user.as_str())?.clone();
        if member.user.is_none() {
            member.user = resolved.users.get(user.as_str()).cloned();
        }
        Some(member)
    }
}

/// A rich embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedImage { url: url.into() });
        self
    }

    pub fn timestamp(mut self, at: OffsetDateTime) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Value of the first field called `name`.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Button styles.
pub mod button_style {
    pub const PRIMARY: u8 = 1;
    pub const SECONDARY: u8 = 2;
}

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;

/// A row of message components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn new(components: Vec<Button>) -> Self {
        Self {
            kind: ACTION_ROW,
            components,
        }
    }
}

/// An interactive button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    pub custom_id: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn new(style: u8, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: BUTTON,
            style,
            label: label.into(),
            custom_id: custom_id.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Interaction callback kinds.
pub mod response_type {
    pub const PONG: u8 = 1;
    pub const CHANNEL_MESSAGE: u8 = 4;
    pub const UPDATE_MESSAGE: u8 = 7;
}

/// Only the invoking user sees the reply.
pub const EPHEMERAL: u64 = 1 << 6;

/// Reply to an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl InteractionResponse {
    /// Post a new message in reply.
    pub fn message(data: ResponseData) -> Self {
        Self {
            kind: response_type::CHANNEL_MESSAGE,
            data: Some(data),
        }
    }

    /// Edit the message the clicked component belongs to.
    pub fn update(data: ResponseData) -> Self {
        Self {
            kind: response_type::UPDATE_MESSAGE,
            data: Some(data),
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.flags)
            .is_some_and(|f| f & EPHEMERAL != 0)
    }
}

impl ResponseData {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            flags: Some(EPHEMERAL),
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = components;
        self
    }
}

/// Slash command option kinds.
pub mod option_type {
    pub const INTEGER: u8 = 4;
    pub const USER: u8 = 6;
}

/// A slash command to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

/// A slash command argument definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn user_option(mut self, name: &str, description: &str, required: bool) -> Self {
        self.options.push(OptionDefinition {
            kind: option_type::USER,
            name: name.to_string(),
            description: description.to_string(),
            required,
            min_value: None,
        });
        self
    }

    pub fn integer_option(
        mut self,
        name: &str,
        description: &str,
        required: bool,
        min_value: Option<i64>,
    ) -> Self {
        self.options.push(OptionDefinition {
            kind: option_type::INTEGER,
            name: name.to_string(),
            description: description.to_string(),
            required,
            min_value,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str, username: &str) -> User {
        User {
            id: UserId::from(id),
            username: username.to_string(),
            global_name: None,
            discriminator: None,
            avatar: None,
            bot: false,
        }
    }

    #[test]
    fn test_display_name_precedence() {
        let mut member = Member {
            user: Some(user("1", "luna")),
            nick: None,
            roles: Vec::new(),
        };
        assert_eq!(member.display_name(), "luna");

        member.user.as_mut().unwrap().global_name = Some("Luna".to_string());
        assert_eq!(member.display_name(), "Luna");

        member.nick = Some("Luna ✦ 🔥 2".to_string());
        assert_eq!(member.display_name(), "Luna ✦ 🔥 2");
    }

    #[test]
    fn test_user_tag() {
        let mut u = user("1", "luna");
        assert_eq!(u.tag(), "luna");
        u.discriminator = Some("0".to_string());
        assert_eq!(u.tag(), "luna");
        u.discriminator = Some("0420".to_string());
        assert_eq!(u.tag(), "luna#0420");
    }

    #[test]
    fn test_avatar_url() {
        let mut u = user("80351110224678912", "nelly");
        assert_eq!(
            u.avatar_url(),
            format!(
                "https://cdn.discordapp.com/embed/avatars/{}.png",
                (80351110224678912u64 >> 22) % 6
            )
        );

        u.avatar = Some("8342729096ea3675442027381ff50dfe".to_string());
        assert_eq!(
            u.avatar_url(),
            "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
        );

        u.avatar = Some("a_abc".to_string());
        assert!(u.avatar_url().ends_with("a_abc.gif"));
    }

    #[test]
    fn test_parse_command_interaction() {
        let raw = json!({
            "id": "900",
            "application_id": "1",
            "type": 2,
            "token": "tok",
            "guild_id": "10",
            "channel_id": "20",
            "member": {
                "user": { "id": "5", "username": "staff" },
                "roles": ["100"],
                "nick": null
            },
            "data": {
                "name": "sumar_racha",
                "options": [
                    { "name": "usuario", "type": 6, "value": "7" },
                    { "name": "dias", "type": 4, "value": 5 }
                ],
                "resolved": {
                    "users": { "7": { "id": "7", "username": "luna" } },
                    "members": { "7": { "nick": "Luna", "roles": [] } }
                }
            }
        });

        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.kind, interaction_type::APPLICATION_COMMAND);
        assert_eq!(interaction.command_name(), Some("sumar_racha"));
        assert_eq!(interaction.option_user("usuario"), Some(UserId::from("7")));
        assert_eq!(interaction.option_integer("dias"), Some(5));
        assert_eq!(interaction.option_integer("missing"), None);

        let target = interaction.resolved_member(&UserId::from("7")).unwrap();
        assert_eq!(target.display_name(), "Luna");
        assert_eq!(target.id(), Some(&UserId::from("7")));
    }

    #[test]
    fn test_parse_button_interaction() {
        let raw = json!({
            "id": "901",
            "application_id": "1",
            "type": 3,
            "token": "tok",
            "guild_id": "10",
            "data": { "custom_id": "top_1", "component_type": 2 }
        });
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.custom_id(), Some("top_1"));
        assert_eq!(interaction.command_name(), None);
    }

    #[test]
    fn test_embed_serialization_skips_empty() {
        let embed = Embed::new().color(0xf7a1c4).description("hola");
        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value, json!({ "description": "hola", "color": 0xf7a1c4 }));
    }

    #[test]
    fn test_response_serialization() {
        let response = InteractionResponse::update(
            ResponseData::embed(Embed::new().title("Top")).with_components(vec![ActionRow::new(
                vec![Button::new(button_style::SECONDARY, "◀", "top_-1").disabled(true)],
            )]),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], 7);
        assert_eq!(value["data"]["components"][0]["type"], 1);
        assert_eq!(value["data"]["components"][0]["components"][0]["custom_id"], "top_-1");
        assert_eq!(value["data"]["components"][0]["components"][0]["disabled"], true);
    }

    #[test]
    fn test_ephemeral_flag() {
        let response = InteractionResponse::message(ResponseData::ephemeral_text("no"));
        assert!(response.is_ephemeral());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["data"]["flags"], 64);
    }

    #[test]
    fn test_command_definition_serialization() {
        let command = CommandDefinition::new("sumar_racha", "Sumar racha (staff)")
            .user_option("usuario", "Usuario", true)
            .integer_option("dias", "Días a sumar", true, Some(0));
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["options"][0]["type"], 6);
        assert_eq!(value["options"][1]["type"], 4);
        assert_eq!(value["options"][1]["min_value"], 0);
        assert_eq!(value["options"][1]["required"], true);
    }
}
