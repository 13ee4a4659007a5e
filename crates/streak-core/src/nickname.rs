//! Streak labels embedded in member nicknames.
//!
//! A member with a positive streak is shown as `Name ✦ 🔥 12`. Any label
//! already present is replaced, never appended to.

use std::sync::LazyLock;

use regex::Regex;

/// Discord rejects nicknames longer than this many characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*✦\s*🔥\s*[0-9]+").expect("streak label pattern is valid")
});

/// A nickname update to apply to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameChange {
    pub before: String,
    pub after: String,
}

/// Remove every streak label from a display name.
///
/// ```
/// use streak_core::nickname::strip_label;
///
/// assert_eq!(strip_label("Luna ✦ 🔥 12"), "Luna");
/// assert_eq!(strip_label("Luna"), "Luna");
/// ```
#[must_use]
pub fn strip_label(name: &str) -> String {
    LABEL.replace_all(name, "").trim().to_string()
}

/// Render the nickname a member with `streak` days should carry.
///
/// The base name is shortened when the labelled result would exceed
/// [`MAX_NICKNAME_CHARS`].
#[must_use]
pub fn render(display_name: &str, streak: u32) -> String {
    let base = strip_label(display_name);
    if streak == 0 {
        return base;
    }

    let label = format!(" ✦ 🔥 {streak}");
    let room = MAX_NICKNAME_CHARS.saturating_sub(label.chars().count());
    // Cuts at a code point, so a grapheme cluster on the boundary (ZWJ
    // emoji, combining mark) can lose its trailing code points.
    let base = if base.chars().count() > room {
        base.chars().take(room).collect::<String>().trim_end().to_string()
    } else {
        base
    };
    format!("{base}{label}")
}

/// Work out whether a member's nickname needs to change.
///
/// Returns `None` when the rendered nickname already matches.
#[must_use]
pub fn plan(display_name: &str, streak: u32) -> Option<NicknameChange> {
    let after = render(display_name, streak);
    if after == display_name {
        return None;
    }
    Some(NicknameChange {
        before: display_name.to_string(),
        after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_appends_label() {
        assert_eq!(render("Luna", 3), "Luna ✦ 🔥 3");
    }

    #[test]
    fn test_render_replaces_existing_label() {
        assert_eq!(render("Luna ✦ 🔥 3", 4), "Luna ✦ 🔥 4");
    }

    #[test]
    fn test_render_zero_removes_label() {
        assert_eq!(render("Luna ✦ 🔥 9", 0), "Luna");
    }

    #[test]
    fn test_strip_handles_loose_spacing_and_repeats() {
        assert_eq!(strip_label("Luna✦🔥1 ✦  🔥  22"), "Luna");
        assert_eq!(strip_label("  Luna ✦ 🔥 5  "), "Luna");
    }

    #[test]
    fn test_strip_keeps_partial_labels() {
        assert_eq!(strip_label("Luna ✦ star"), "Luna ✦ star");
        assert_eq!(strip_label("Luna 🔥 5"), "Luna 🔥 5");
        assert_eq!(strip_label("Luna ✦ 🔥"), "Luna ✦ 🔥");
    }

    #[test]
    fn test_render_truncates_long_names() {
        let long = "A".repeat(40);
        let nick = render(&long, 123);
        assert_eq!(nick.chars().count(), MAX_NICKNAME_CHARS);
        assert!(nick.ends_with(" ✦ 🔥 123"));
    }

    #[test]
    fn test_render_truncation_trims_trailing_space() {
        let name = format!("{} tail", "B".repeat(25));
        let nick = render(&name, 7);
        assert_eq!(nick, format!("{} ✦ 🔥 7", "B".repeat(25)));
    }

    #[test]
    fn test_render_truncation_counts_code_points() {
        // " ✦ 🔥 7" leaves room for 26 chars; the combining acute is the 27th
        let name = format!("{}e\u{301}xyz", "A".repeat(25));
        let nick = render(&name, 7);
        assert_eq!(nick, format!("{}e ✦ 🔥 7", "A".repeat(25)));
        assert_eq!(nick.chars().count(), MAX_NICKNAME_CHARS);
    }

    #[test]
    fn test_plan_detects_no_change() {
        assert_eq!(plan("Luna ✦ 🔥 3", 3), None);
        assert_eq!(plan("Luna", 0), None);
    }

    #[test]
    fn test_plan_reports_before_and_after() {
        let change = plan("Luna ✦ 🔥 3", 4).unwrap();
        assert_eq!(change.before, "Luna ✦ 🔥 3");
        assert_eq!(change.after, "Luna ✦ 🔥 4");
    }

    #[test]
    fn test_plan_cleans_whitespace_only_change() {
        let change = plan(" Luna ", 0).unwrap();
        assert_eq!(change.after, "Luna");
    }
}
