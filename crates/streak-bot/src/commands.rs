//! Slash command definitions and parsing.

use streak_discord::{CommandDefinition, Interaction};
use streak_types::UserId;

pub const RACHA: &str = "racha";
pub const SUMAR_RACHA: &str = "sumar_racha";
pub const RESET_RACHA: &str = "reset_racha";
pub const TOP_RACHAS: &str = "top_rachas";

const OPT_USUARIO: &str = "usuario";
const OPT_DIAS: &str = "dias";

/// The guild commands the bot registers.
pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(RACHA, "Ver tu racha o la de otro usuario").user_option(
            OPT_USUARIO,
            "Usuario",
            false,
        ),
        CommandDefinition::new(SUMAR_RACHA, "Sumar racha (staff)")
            .user_option(OPT_USUARIO, "Usuario", true)
            .integer_option(OPT_DIAS, "Días a sumar", true, Some(0)),
        CommandDefinition::new(RESET_RACHA, "Resetear racha (staff)").user_option(
            OPT_USUARIO,
            "Usuario",
            true,
        ),
        CommandDefinition::new(TOP_RACHAS, "Top de rachas"),
    ]
}

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show a streak; `None` means the caller's own.
    Racha { target: Option<UserId> },
    /// Staff: add days to a member's streak.
    SumarRacha { target: UserId, days: i64 },
    /// Staff: reset a member's streak.
    ResetRacha { target: UserId },
    /// Leaderboard, first page.
    TopRachas,
}

impl Command {
    /// Parse an application command interaction.
    ///
    /// Returns `None` for unknown commands or missing required arguments.
    pub fn parse(interaction: &Interaction) -> Option<Self> {
        let command = match interaction.command_name()? {
            RACHA => Command::Racha {
                target: interaction.option_user(OPT_USUARIO),
            },
            SUMAR_RACHA => Command::SumarRacha {
                target: interaction.option_user(OPT_USUARIO)?,
                days: interaction.option_integer(OPT_DIAS)?,
            },
            RESET_RACHA => Command::ResetRacha {
                target: interaction.option_user(OPT_USUARIO)?,
            },
            TOP_RACHAS => Command::TopRachas,
            _ => return None,
        };
        Some(command)
    }

    /// Whether only staff may run this command.
    pub fn requires_staff(&self) -> bool {
        matches!(self, Command::SumarRacha { .. } | Command::ResetRacha { .. })
    }
}
