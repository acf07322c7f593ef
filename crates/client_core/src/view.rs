//! Pure projection from cached game state to display values.

use shared::domain::{Side, INSET_HALF_WINDOW, TOTAL_STEPS};

use crate::types::GameState;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub left_pulls_text: String,
    pub right_pulls_text: String,
    pub players_text: Option<String>,
    pub flag_percent: f64,
    pub inset_percent: f64,
    pub score: u64,
    pub percent_to_win: f64,
    pub leading: Side,
    pub score_text: String,
}

impl Default for ViewFrame {
    fn default() -> Self {
        Self::project(&GameState::default())
    }
}

impl ViewFrame {
    pub fn project(state: &GameState) -> Self {
        let score = state.position.unsigned_abs();
        let percent_to_win = score as f64 / TOTAL_STEPS as f64 * 100.0;
        let leading = Side::leading(state.position);

        Self {
            left_pulls_text: format!("Left Pulls: {}", group_thousands(state.left_pulls)),
            right_pulls_text: format!("Right Pulls: {}", group_thousands(state.right_pulls)),
            players_text: state.active_users.map(|users| format!("Players: {users}")),
            flag_percent: flag_percent(state.position),
            inset_percent: inset_percent(state.position),
            score,
            percent_to_win,
            leading,
            score_text: format!(
                "Score: {} ({percent_to_win:.1}% to {leading})",
                group_thousands(score)
            ),
        }
    }
}

/// Maps `[-TOTAL_STEPS, TOTAL_STEPS]` onto `[0, 100]`. Not clamped.
pub fn flag_percent(position: i64) -> f64 {
    (position as f64 + TOTAL_STEPS as f64) / (2.0 * TOTAL_STEPS as f64) * 100.0
}

/// Maps the inset window onto `[0, 100]`, pinning outside values to an edge.
pub fn inset_percent(position: i64) -> f64 {
    let window = INSET_HALF_WINDOW as f64;
    let raw = (position as f64 + window) / (2.0 * window) * 100.0;
    raw.clamp(0.0, 100.0)
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_digits_in_threes() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(10_000_000), "10,000,000");
    }

    #[test]
    fn flag_spans_full_track() {
        assert_eq!(flag_percent(-TOTAL_STEPS), 0.0);
        assert_eq!(flag_percent(0), 50.0);
        assert_eq!(flag_percent(TOTAL_STEPS), 100.0);
        assert!((flag_percent(1) - 50.000005).abs() < 1e-9);
    }

    #[test]
    fn inset_pins_outside_window() {
        assert_eq!(inset_percent(0), 50.0);
        assert_eq!(inset_percent(25_000), 75.0);
        assert_eq!(inset_percent(60_000), 100.0);
        assert_eq!(inset_percent(-2_000_000), 0.0);
    }

    #[test]
    fn projects_counters_and_score() {
        let frame = ViewFrame::project(&GameState {
            position: -2_500_000,
            left_pulls: 3_000_000,
            right_pulls: 500_000,
            active_users: Some(4),
        });
        assert_eq!(frame.left_pulls_text, "Left Pulls: 3,000,000");
        assert_eq!(frame.right_pulls_text, "Right Pulls: 500,000");
        assert_eq!(frame.players_text.as_deref(), Some("Players: 4"));
        assert_eq!(frame.leading, Side::Left);
        assert_eq!(frame.score, 2_500_000);
        assert_eq!(frame.score_text, "Score: 2,500,000 (25.0% to Left)");
    }
}
