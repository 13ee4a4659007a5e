//! Bot configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embed accent color used by the stock configuration.
pub const DEFAULT_COLOR: u32 = 0xf7a1c4;

/// Bot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord credentials and target guild.
    pub discord: DiscordConfig,
    /// Log channels.
    pub channels: ChannelsConfig,
    /// Who may run the admin commands.
    pub access: AccessConfig,
    /// Keep-alive HTTP server.
    pub server: ServerConfig,
    /// Streak store.
    pub storage: StorageConfig,
    /// Embed look.
    pub appearance: AppearanceConfig,
}

impl Config {
    /// Load configuration from the default path, or defaults if it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem found.
    ///
    /// Credentials are not required here; commands that talk to Discord
    /// check them with [`DiscordConfig::require_credentials`].
    ///
    /// ```
    /// use streak_bot::Config;
    ///
    /// Config::default().validate().expect("default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.discord.validate());
        errors.extend(self.channels.validate());
        errors.extend(self.access.validate());
        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.appearance.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Discord credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied through `DISCORD_TOKEN` instead.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Application (client) id, used to register slash commands.
    pub application_id: String,
    /// The guild the bot serves.
    pub guild_id: String,
}

impl DiscordConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !self.application_id.is_empty() {
            check_snowflake(&mut errors, "discord.application_id", &self.application_id);
        }
        if !self.guild_id.is_empty() {
            check_snowflake(&mut errors, "discord.guild_id", &self.guild_id);
        }
        errors
    }

    /// Errors for every credential missing to connect and register commands.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("discord.token", &self.token),
            ("discord.application_id", &self.application_id),
            ("discord.guild_id", &self.guild_id),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "required to connect to Discord".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Log channels. Unset channels are not posted to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Receives an embed each time a nickname label changes.
    pub nickname_log: Option<String>,
    /// Receives an embed each time a streak advances.
    pub streak_log: Option<String>,
}

impl ChannelsConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(id) = &self.nickname_log {
            check_snowflake(&mut errors, "channels.nickname_log", id);
        }
        if let Some(id) = &self.streak_log {
            check_snowflake(&mut errors, "channels.streak_log", id);
        }
        errors
    }
}

/// Staff access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Role ids allowed to run `/sumar_racha` and `/reset_racha`.
    pub staff_roles: Vec<String>,
}

impl AccessConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for (i, role) in self.staff_roles.iter().enumerate() {
            let field = format!("access.staff_roles[{}]", i);
            check_snowflake(&mut errors, &field, role);
            if !seen.insert(role.as_str()) {
                errors.push(ValidationError {
                    field,
                    message: format!("duplicate role id '{}'", role),
                });
            }
        }
        errors
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Whether to serve the keep-alive API at all.
    pub enabled: bool,
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
            return errors;
        }

        match self.bind.rsplit_once(':') {
            None => errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            }),
            Some((_, port)) => match port.parse::<u16>() {
                Ok(0) => errors.push(ValidationError {
                    field: "server.bind".to_string(),
                    message: "port cannot be 0".to_string(),
                }),
                Err(_) => errors.push(ValidationError {
                    field: "server.bind".to_string(),
                    message: format!("invalid port '{}': must be a number 1-65535", port),
                }),
                Ok(_) => {}
            },
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Streak file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: streak_store::default_store_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "store path cannot be empty".to_string(),
            });
        }
        errors
    }
}

/// Embed appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Name shown in embed titles ("💗 {brand} • Racha").
    pub brand: String,
    /// Embed accent color as 0xRRGGBB.
    pub color: u32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            brand: "Destiny Archive".to_string(),
            color: DEFAULT_COLOR,
        }
    }
}

impl AppearanceConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.brand.trim().is_empty() {
            errors.push(ValidationError {
                field: "appearance.brand".to_string(),
                message: "brand cannot be empty".to_string(),
            });
        }
        if self.color > 0xFF_FF_FF {
            errors.push(ValidationError {
                field: "appearance.color".to_string(),
                message: format!("color {:#x} is not a 24-bit RGB value", self.color),
            });
        }
        errors
    }
}

fn check_snowflake(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) || value.parse::<u64>().is_err()
    {
        errors.push(ValidationError {
            field: field.to_string(),
            message: format!("'{}' is not a Discord id", value),
        });
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `access.staff_roles[0]`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("streak-bot")
        .join("bot.toml")
}
