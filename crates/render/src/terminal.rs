//! Renderer that redraws the bar in place on a terminal line.

use crate::text::TextRenderer;
use std::io::Write;
use std::sync::Mutex;
use storybar_core::{PlaybackState, SegmentFrame, SegmentRenderer};
use tracing::warn;

/// Writes every frame to `W`, returning the cursor to the start of the line.
pub struct TerminalRenderer<W: Write + Send> {
    text: TextRenderer,
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Wrap a writer.
    pub fn new(text: TextRenderer, out: W) -> Self {
        Self {
            text,
            out: Mutex::new(out),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn status(frame: &SegmentFrame<'_>) -> String {
        if frame.is_empty() {
            return format!("{}", frame.state);
        }
        let marker = match frame.state {
            PlaybackState::Paused => " ||",
            PlaybackState::Finished => " done",
            PlaybackState::Idle | PlaybackState::Running => "",
        };
        format!("{}/{}{}", frame.current_index + 1, frame.len(), marker)
    }
}

impl<W: Write + Send> SegmentRenderer for TerminalRenderer<W> {
    fn render(&self, frame: &SegmentFrame<'_>) {
        let line = self.text.render_line(frame);
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        // \x1b[K clears whatever a longer previous line left behind
        let written = write!(out, "\r{} {}\x1b[K", line, Self::status(frame)).and_then(|_| out.flush());
        if let Err(e) = written {
            warn!("failed to draw segment bar: {}", e);
        }
    }
}
