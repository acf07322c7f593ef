//! Text rendering of a controller's current view.

use chrono::Local;
use client_core::{
    animation::{PulseFrame, PulsePhase},
    message_log::{EntryPhase, MessageLog},
    ViewFrame,
};

const TRACK_WIDTH: usize = 51;
const INSET_WIDTH: usize = 31;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws a track of `width` cells with `marker` at `percent` (clamped to the
/// track ends).
pub fn track(percent: f64, width: usize, marker: char) -> String {
    let width = width.max(2);
    let last = (width - 1) as f64;
    let index = (percent.clamp(0.0, 100.0) / 100.0 * last).round() as usize;
    let centre = width / 2;
    (0..width)
        .map(|cell| {
            if cell == index {
                marker
            } else if cell == centre {
                '|'
            } else {
                '-'
            }
        })
        .collect()
}

fn pulse_line(pulse: &PulseFrame) -> String {
    match pulse.phase {
        PulsePhase::Idle => String::new(),
        PulsePhase::Expanding => format!(
            "  (*) pulse at {:.2}% ({}px)",
            pulse.anchor_percent, pulse.size_px
        ),
        PulsePhase::FadingOut => format!(
            "  ( ) pulse at {:.2}% ({}px)",
            pulse.anchor_percent, pulse.size_px
        ),
    }
}

pub fn render_screen(
    frame: &ViewFrame,
    pulse: &PulseFrame,
    log: &MessageLog,
    notice: Option<&str>,
    connected: bool,
) -> String {
    let mut out = String::from(CLEAR_SCREEN);

    let mut header = format!("{}    {}", frame.left_pulls_text, frame.right_pulls_text);
    if let Some(players) = &frame.players_text {
        header.push_str("    ");
        header.push_str(players);
    }
    if !connected {
        header.push_str("    [offline]");
    }
    out.push_str(&header);
    out.push('\n');

    out.push_str(&format!(
        "LEFT [{}] RIGHT  {:.5}%\n",
        track(frame.flag_percent, TRACK_WIDTH, 'F'),
        frame.flag_percent
    ));
    out.push_str(&format!(
        "inset     [{}]\n",
        track(frame.inset_percent, INSET_WIDTH, 'f')
    ));
    out.push_str(&frame.score_text);
    out.push('\n');

    let pulse = pulse_line(pulse);
    if !pulse.is_empty() {
        out.push_str(&pulse);
        out.push('\n');
    }

    if let Some(notice) = notice {
        out.push_str(&format!("*** {notice} ***\n"));
    }

    for entry in log.entries() {
        let marker = match entry.phase {
            EntryPhase::Visible => ' ',
            EntryPhase::Fading => '~',
        };
        out.push_str(&format!(
            "{marker} {} {}\n",
            entry.logged_at.with_timezone(&Local).format("%H:%M:%S"),
            entry.text
        ));
    }

    out.push_str("> ");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::GameState;
    use shared::domain::Side;
    use std::time::Instant;

    #[test]
    fn track_places_marker_at_ends_and_centre() {
        assert_eq!(track(0.0, 5, 'F'), "F-|--");
        assert_eq!(track(50.0, 5, 'F'), "--F--");
        assert_eq!(track(100.0, 5, 'F'), "--|-F");
        assert_eq!(track(250.0, 5, 'F'), "--|-F");
    }

    #[test]
    fn screen_shows_counters_score_and_log() {
        let frame = ViewFrame::project(&GameState {
            position: 3,
            left_pulls: 1,
            right_pulls: 4,
            active_users: Some(2),
        });
        let mut log = MessageLog::with_capacity(5);
        log.push(Side::Right, 3, Instant::now(), chrono::Utc::now());
        let pulse = PulseFrame {
            phase: PulsePhase::Idle,
            anchor_percent: 50.0,
            size_px: 0.0,
            opacity: 0.8,
        };

        let screen = render_screen(&frame, &pulse, &log, Some("Right Wins!"), false);
        assert!(screen.contains("Left Pulls: 1    Right Pulls: 4    Players: 2    [offline]"));
        assert!(screen.contains("Score: 3 (0.0% to Right)"));
        assert!(screen.contains("Right pulled! 3 steps"));
        assert!(screen.contains("*** Right Wins! ***"));
        assert!(!screen.contains("pulse at"));
    }
}
