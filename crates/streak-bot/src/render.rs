//! Embeds and replies shown to users.

use time::OffsetDateTime;

use streak_core::leaderboard::Entry;
use streak_core::{NicknameChange, Page, progress};
use streak_discord::models::button_style;
use streak_discord::{ActionRow, Button, Embed, ResponseData, User};

use crate::config::AppearanceConfig;

/// Reply to non-staff callers of admin commands.
pub const DENIED: &str = "💔 Sin permisos";
/// Reply when an admin command names someone who is not in the guild.
pub const UNKNOWN_MEMBER: &str = "💔 Usuario no encontrado";
/// Reply when `/sumar_racha` gets a negative amount.
pub const NEGATIVE_DAYS: &str = "💔 Los días deben ser 0 o más";
/// Leaderboard body when the page has no resolvable members.
pub const EMPTY_LEADERBOARD: &str = "Sin datos";

fn base(appearance: &AppearanceConfig) -> Embed {
    Embed::new().color(appearance.color)
}

/// Posted to the nickname log when a label changes.
pub fn nickname_log(
    appearance: &AppearanceConfig,
    user: &User,
    change: &NicknameChange,
    at: OffsetDateTime,
) -> Embed {
    base(appearance)
        .title(format!("💗 {} • Nickname", appearance.brand))
        .field("Usuario", user.tag(), false)
        .field(
            "Cambio",
            format!("{} → {}", change.before, change.after),
            false,
        )
        .thumbnail(user.avatar_url())
        .timestamp(at)
}

fn streak_fields(embed: Embed, name: &str, streak: u32) -> Embed {
    embed
        .field("Usuario", name, false)
        .field("🔥 Días", streak.to_string(), true)
        .field("Progreso", format!("[{}]", progress::bar(streak)), false)
}

/// Posted to the streak log when a message advances a streak.
pub fn streak_log(appearance: &AppearanceConfig, name: &str, streak: u32, at: OffsetDateTime) -> Embed {
    let embed = base(appearance).title(format!("💗 {} • Racha", appearance.brand));
    streak_fields(embed, name, streak).timestamp(at)
}

/// Reply to `/racha`.
pub fn streak_card(appearance: &AppearanceConfig, name: &str, streak: u32, at: OffsetDateTime) -> Embed {
    let embed = base(appearance).title(format!("📊 {} • Racha", appearance.brand));
    streak_fields(embed, name, streak).timestamp(at)
}

/// Reply to `/sumar_racha`.
pub fn days_added(appearance: &AppearanceConfig, name: &str, days: u32) -> Embed {
    base(appearance).description(format!("💞 Se sumaron **{} días** a {}", days, name))
}

/// Reply to `/reset_racha`.
pub fn streak_reset(appearance: &AppearanceConfig, name: &str) -> Embed {
    base(appearance).description(format!("💔 Racha reseteada para {}", name))
}

/// Leaderboard page with its navigation buttons.
///
/// `rows` holds the page entries whose member could be resolved, paired with
/// the display name to show; ranks come from the full ranking.
pub fn leaderboard(appearance: &AppearanceConfig, page: &Page, rows: &[(Entry, String)]) -> ResponseData {
    let description: String = rows
        .iter()
        .map(|(entry, name)| format!("**{}.** {} — 🔥 {}\n", entry.rank, name, entry.streak))
        .collect();

    let embed = base(appearance)
        .title(format!("🏆 {} • Top Rachas", appearance.brand))
        .description(if description.is_empty() {
            EMPTY_LEADERBOARD.to_string()
        } else {
            description
        })
        .footer(format!("Página {}/{}", page.index + 1, page.count));

    let buttons = ActionRow::new(vec![
        Button::new(button_style::SECONDARY, "◀", page.previous_button_id())
            .disabled(!page.has_previous()),
        Button::new(button_style::SECONDARY, "▶", page.next_button_id()).disabled(!page.has_next()),
    ]);

    ResponseData::embed(embed).with_components(vec![buttons])
}
