//! Discord bot that tracks daily message streaks.
//!
//! A member's first message in a 24h window advances their streak when it
//! lands within 48h of the last counted one, and restarts it otherwise. The
//! streak is shown in the member's nickname (`Luna ✦ 🔥 12`), logged to
//! optional channels, and exposed through slash commands:
//!
//! - `/racha [usuario]` - show a streak
//! - `/sumar_racha usuario dias` - staff: add days
//! - `/reset_racha usuario` - staff: reset
//! - `/top_rachas` - paginated leaderboard
//!
//! # HTTP Endpoints
//!
//! - `GET /` - keep-alive banner
//! - `GET /api/health` - status and counters
//! - `GET /api/leaderboard?page=k` - leaderboard page as JSON
//!
//! # Configuration
//!
//! The bot reads `~/.config/streak-bot/bot.toml`; the token is usually given
//! through `DISCORD_TOKEN`:
//!
//! ```toml
//! [discord]
//! application_id = "1465000000000000000"
//! guild_id = "1442000000000000000"
//!
//! [channels]
//! nickname_log = "1465065450999386207"
//! streak_log = "1465800351839158590"
//!
//! [access]
//! staff_roles = ["1442360657386147961"]
//!
//! [server]
//! bind = "0.0.0.0:3000"
//!
//! [storage]
//! path = "~/.local/share/streak-bot/rachas.json"
//! ```

pub mod api;
pub mod bot;
pub mod commands;
pub mod config;
pub mod render;
pub mod state;

pub use bot::{Bot, BotError, BotEvent, Effect};
pub use config::{
    AccessConfig, AppearanceConfig, ChannelsConfig, Config, ConfigError, DiscordConfig,
    ServerConfig, StorageConfig,
};
pub use state::AppState;
