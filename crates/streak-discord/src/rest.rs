//! HTTP client for the Discord REST API (v10).
//!
//! # Example
//!
//! ```no_run
//! use streak_discord::{ChatPlatform, RestClient};
//! use streak_types::UserId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RestClient::new("bot-token", "1234567890")?;
//! let member = client.fetch_member("1442", &UserId::new(80351110224678912)).await?;
//! if let Some(member) = member {
//!     println!("{}", member.display_name());
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use streak_types::UserId;

use crate::error::{Error, Result};
use crate::models::{CommandDefinition, Embed, InteractionResponse, Member};
use crate::platform::{ChatPlatform, InteractionHandle};

/// Default API base URL.
pub const API_BASE: &str = "https://discord.com/api/v10";

/// HTTP client for the Discord API.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: String,
    application_id: String,
}

impl RestClient {
    /// Create a client for the given bot token and application.
    pub fn new(token: &str, application_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!(
                "DiscordBot (",
                env!("CARGO_PKG_REPOSITORY"),
                ", ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;
        Self::with_client(API_BASE, token, application_id, client)
    }

    /// Create a client with a custom base URL and reqwest Client.
    pub fn with_client(
        base_url: &str,
        token: &str,
        application_id: &str,
        client: Client,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "API URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        if token.trim().is_empty() {
            return Err(Error::InvalidConfig("bot token is empty".to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token: token.trim().to_string(),
            application_id: application_id.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bot {}", self.token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let message = api_error_message(&response.text().await.unwrap_or_default());
        Err(Error::Api { status, message })
    }

    async fn send_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }
}

/// Pull the human-readable message out of a Discord error body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ChatPlatform for RestClient {
    async fn fetch_member(&self, guild: &str, user: &UserId) -> Result<Option<Member>> {
        match self
            .send_json(&format!("/guilds/{}/members/{}", guild, user))
            .await
        {
            Ok(member) => Ok(Some(member)),
            Err(Error::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_nickname(&self, guild: &str, user: &UserId, nick: &str) -> Result<()> {
        let body = serde_json::json!({ "nick": nick });
        self.send(
            Method::PATCH,
            &format!("/guilds/{}/members/{}", guild, user),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn send_embed(&self, channel: &str, embed: &Embed) -> Result<()> {
        let body = serde_json::json!({ "embeds": [embed] });
        self.send(
            Method::POST,
            &format!("/channels/{}/messages", channel),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn respond(
        &self,
        interaction: &InteractionHandle,
        response: &InteractionResponse,
    ) -> Result<()> {
        self.send(
            Method::POST,
            &format!(
                "/interactions/{}/{}/callback",
                interaction.id, interaction.token
            ),
            Some(response),
        )
        .await?;
        Ok(())
    }

    async fn register_commands(&self, guild: &str, commands: &[CommandDefinition]) -> Result<()> {
        self.send(
            Method::PUT,
            &format!(
                "/applications/{}/guilds/{}/commands",
                self.application_id, guild
            ),
            Some(commands),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = RestClient::new("token", "1").unwrap();
        assert_eq!(client.base_url(), API_BASE);
        assert_eq!(client.application_id(), "1");
    }

    #[test]
    fn test_client_rejects_bad_url() {
        let result = RestClient::with_client("discord.com/api", "token", "1", Client::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_client_rejects_empty_token() {
        let result = RestClient::with_client(API_BASE, "  ", "1", Client::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client =
            RestClient::with_client("http://localhost:9000/api/", "token", "1", Client::new())
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"message": "Missing Permissions", "code": 50013}"#),
            "Missing Permissions"
        );
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_rejection_classification() {
        let forbidden = Error::Api {
            status: 403,
            message: "Missing Permissions".to_string(),
        };
        assert!(forbidden.is_rejection());
        let outage = Error::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(!outage.is_rejection());
    }
}
