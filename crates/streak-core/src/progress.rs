//! Fixed-width streak progress bar.

/// Number of cells in the bar; streaks beyond this render full.
pub const BAR_WIDTH: u32 = 20;

const FILLED: char = '█';
const EMPTY: char = '░';

/// Render `streak` as a [`BAR_WIDTH`]-cell bar.
///
/// ```
/// use streak_core::progress::bar;
///
/// assert_eq!(bar(3).chars().filter(|c| *c == '█').count(), 3);
/// assert_eq!(bar(500).chars().count(), 20);
/// ```
#[must_use]
pub fn bar(streak: u32) -> String {
    let filled = streak.min(BAR_WIDTH) as usize;
    let mut out = String::with_capacity(BAR_WIDTH as usize * FILLED.len_utf8());
    out.extend(std::iter::repeat_n(FILLED, filled));
    out.extend(std::iter::repeat_n(EMPTY, BAR_WIDTH as usize - filled));
    out
}
