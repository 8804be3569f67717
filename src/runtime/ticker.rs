//! Periodic status refresh, independent of the input loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ui::StatusLine;

use super::StatusHandle;

/// Redraw the status region every `interval` until `running` clears.
///
/// The wait is sliced so that shutdown is observed well before a full
/// interval has passed.
pub(super) fn spawn_status_ticker(
    status: StatusHandle,
    status_line: StatusLine,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let slice = Duration::from_millis(50);
        while running.load(Ordering::Relaxed) {
            let mut slept = Duration::ZERO;
            while slept < interval && running.load(Ordering::Relaxed) {
                let step = slice.min(interval - slept);
                thread::sleep(step);
                slept += step;
            }
            if !running.load(Ordering::Relaxed) {
                break;
            }
            let snapshot = status.lock().ok().and_then(|s| s.clone());
            status_line.render(snapshot.as_ref());
        }
    })
}
