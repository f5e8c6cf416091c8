//! Animated progress indicator shown while the lookup is in flight.
//!
//! The animation runs on its own thread and owns its output stream for the
//! whole run (for stdout, the stdout lock), so nothing else can write to that
//! stream until the indicator has stopped. Stopping is cooperative: the
//! foreground clears a shared flag and the thread notices it on its next tick.

use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use tracing::warn;

use crate::term::{ERASE_LINE, HIDE_CURSOR, MAGENTA, RESET, SHOW_CURSOR};

pub const TICK: Duration = Duration::from_millis(150);

/// Quadrant glyphs, U+25E2..=U+25E5.
pub const FRAMES: [char; 4] = ['\u{25E2}', '\u{25E3}', '\u{25E4}', '\u{25E5}'];

#[derive(Debug)]
pub struct Spinner {
    active: Arc<AtomicBool>,
    handle: Option<JoinHandle<io::Result<()>>>,
}

impl Spinner {
    /// A spinner that never draws, used when stdout is not a terminal.
    pub fn idle() -> Self {
        Self { active: Arc::new(AtomicBool::new(false)), handle: None }
    }

    /// Start animating on the stream returned by `open`.
    ///
    /// `open` runs on the animation thread, so lock guards such as
    /// `StdoutLock` (which cannot cross threads) are held there for the run.
    pub fn start<W, F>(label: impl Into<String>, open: F) -> Self
    where
        W: Write,
        F: FnOnce() -> W + Send + 'static,
    {
        let label = label.into();
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let handle = thread::Builder::new()
            .name("airq-spinner".into())
            .spawn(move || {
                let mut out = open();
                animate(&mut out, &label, &flag)
            });

        match handle {
            Ok(handle) => Self { active, handle: Some(handle) },
            Err(err) => {
                warn!(%err, "could not start progress indicator");
                Self::idle()
            }
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the animation, erase its line and show the cursor again.
    /// Returns once the thread has released the stream.
    pub fn stop(mut self) -> io::Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        self.active.store(false, Ordering::Release);
        handle.thread().unpark();

        handle
            .join()
            .map_err(|_| io::Error::other("progress indicator thread panicked"))?
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(%err, "progress indicator did not shut down cleanly");
        }
    }
}

fn animate<W: Write>(out: &mut W, label: &str, active: &AtomicBool) -> io::Result<()> {
    write!(out, "{HIDE_CURSOR}{label} ")?;
    out.flush()?;

    let painted = paint_until_stopped(out, label, active);

    // The cursor comes back even if painting failed halfway.
    write!(out, "{ERASE_LINE}{SHOW_CURSOR}")?;
    out.flush()?;

    painted
}

fn paint_until_stopped<W: Write>(out: &mut W, label: &str, active: &AtomicBool) -> io::Result<()> {
    for frame in FRAMES.iter().cycle() {
        if !active.load(Ordering::Acquire) {
            break;
        }
        write!(out, "\r{label} {MAGENTA}[{frame}]{RESET}")?;
        out.flush()?;
        // Woken early by `unpark` on stop.
        thread::park_timeout(TICK);
    }
    Ok(())
}
