//! Three-line status renderer.
//!
//! The status region is a block of three rows reserved at startup and
//! redrawn in place, once a second from the tick thread and synchronously
//! after every handled key. Rendering is best-effort: failures are
//! swallowed, so a resize or a closed terminal never takes the player down.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal;

use crate::player::NowPlaying;

/// Rows the status region occupies.
pub const STATUS_ROWS: u16 = 3;

/// Renders the status region at a fixed origin row.
#[derive(Debug, Clone, Copy)]
pub struct StatusLine {
    origin_row: u16,
}

impl StatusLine {
    pub fn new(origin_row: u16) -> Self {
        Self { origin_row }
    }

    /// Redraw the status region. Errors are deliberately dropped.
    pub fn render(&self, now: Option<&NowPlaying>) {
        let _ = self.try_render(now);
    }

    fn try_render(&self, now: Option<&NowPlaying>) -> io::Result<()> {
        let (width, _) = terminal::size()?;
        let lines = status_lines(now);

        let mut out = io::stdout().lock();
        for (i, line) in lines.iter().enumerate() {
            queue!(
                out,
                MoveTo(0, self.origin_row + i as u16),
                Print(fit_to_width(line, width as usize)),
            )?;
        }
        // Park the cursor on the spacer row.
        queue!(out, MoveTo(0, self.origin_row + STATUS_ROWS - 1))?;
        out.flush()
    }
}

/// The three status lines for the given snapshot.
fn status_lines(now: Option<&NowPlaying>) -> [String; STATUS_ROWS as usize] {
    match now {
        Some(now) => {
            let paused = if now.paused { "  (Paused)" } else { "" };
            [
                format!("Playing ({}/{}): {}", now.index, now.total, now.title),
                format!(
                    "{}/{} -- Volume: {:.0}%{}",
                    format_hms(now.position),
                    format_hms(now.duration),
                    f64::from(now.volume) * 100.0,
                    paused
                ),
                String::new(),
            ]
        }
        None => ["Nothing playing".to_string(), String::new(), String::new()],
    }
}

/// Format a `Duration` as `hh:mm:ss`.
fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Pad or truncate to the terminal width so stale characters never survive
/// a redraw.
fn fit_to_width(line: &str, width: usize) -> String {
    let mut out: String = line.chars().take(width).collect();
    let used = out.chars().count();
    if used < width {
        out.push_str(&" ".repeat(width - used));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::player::NowPlaying;

    use super::{fit_to_width, format_hms, status_lines};

    fn snapshot() -> NowPlaying {
        NowPlaying {
            title: "Metallica - Blackened".into(),
            index: 2,
            total: 9,
            position: Duration::from_secs(75),
            duration: Duration::from_secs(4 * 3600 + 2 * 60 + 1),
            volume: 0.85,
            paused: false,
        }
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(Duration::ZERO), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(75)), "00:01:15");
        assert_eq!(format_hms(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn status_lines_show_track_position_and_volume() {
        let lines = status_lines(Some(&snapshot()));
        assert_eq!(lines[0], "Playing (2/9): Metallica - Blackened");
        assert_eq!(lines[1], "00:01:15/04:02:01 -- Volume: 85%");
        assert_eq!(lines[2], "");
    }

    #[test]
    fn status_lines_flag_paused_playback() {
        let mut now = snapshot();
        now.paused = true;
        let lines = status_lines(Some(&now));
        assert!(lines[1].ends_with("(Paused)"));
    }

    #[test]
    fn status_lines_without_a_snapshot() {
        let lines = status_lines(None);
        assert_eq!(lines[0], "Nothing playing");
    }

    #[test]
    fn fit_to_width_pads_and_truncates() {
        assert_eq!(fit_to_width("abc", 5), "abc  ");
        assert_eq!(fit_to_width("abcdef", 4), "abcd");
        assert_eq!(fit_to_width("", 3), "   ");
    }
}
