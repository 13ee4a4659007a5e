//! Discord binding for the daily streak bot.
//!
//! This crate covers the two halves of talking to Discord:
//!
//! - **REST**: [`RestClient`] fetches members, edits nicknames, posts embeds,
//!   answers interactions and registers slash commands
//! - **Gateway**: [`Gateway`] keeps a websocket session alive (heartbeats,
//!   resume, reconnect with backoff) and forwards the events the bot handles
//!
//! Bot logic depends on the [`ChatPlatform`] trait rather than on the REST
//! client directly, so it can be exercised against [`MockPlatform`].
//!
//! # Quick Start
//!
//! ```no_run
//! use streak_discord::{Gateway, GatewayConfig, GatewayEvent};
//! use tokio::sync::{mpsc, watch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::channel(64);
//!     let (_stop, shutdown) = watch::channel(false);
//!     tokio::spawn(Gateway::new(GatewayConfig::new("bot-token")).run(tx, shutdown));
//!
//!     while let Some(event) = rx.recv().await {
//!         if let GatewayEvent::MessageCreate(message) = event {
//!             println!("{}: {}", message.author.username, message.content);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod gateway;
pub mod mock;
pub mod models;
pub mod platform;
pub mod rest;

pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayConfig, GatewayEvent, ReconnectOptions};
pub use mock::{MockPlatform, PlatformCall};
pub use models::{
    ActionRow, Button, CommandDefinition, Embed, Interaction, InteractionResponse, Member, Message,
    ResponseData, User,
};
pub use platform::{ChatPlatform, InteractionHandle};
pub use rest::RestClient;
