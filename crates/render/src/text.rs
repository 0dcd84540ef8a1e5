//! Single-line text layout of a segment bar.

use storybar_core::{CornerStyle, Rgba, SegmentFrame};

/// Style padding is in pixels; this many pixels make one terminal column.
const PIXELS_PER_COLUMN: f32 = 5.0;

const RESET: &str = "\x1b[0m";

/// Characters used for the filled and unfilled parts of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    /// Filled cell
    pub filled: char,
    /// Unfilled cell
    pub track: char,
    /// Rounded left cap
    pub open: char,
    /// Rounded right cap
    pub close: char,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            filled: '=',
            track: '-',
            open: '(',
            close: ')',
        }
    }
}

/// Lays a frame out into a fixed-width line.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    width: usize,
    glyphs: Glyphs,
    color: bool,
}

impl TextRenderer {
    /// Renderer targeting `width` columns, plain ASCII, no color.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            glyphs: Glyphs::default(),
            color: false,
        }
    }

    /// Use different glyphs.
    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Emit 24-bit ANSI colors from the frame style.
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Target width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Lay out `frame` as one line.
    pub fn render_line(&self, frame: &SegmentFrame<'_>) -> String {
        let count = frame.len();
        if count == 0 {
            return String::new();
        }

        let style = frame.style;
        let gap = ((style.padding_between_segments / PIXELS_PER_COLUMN).round() as usize).min(self.width);
        let caps: Vec<(bool, bool)> = (0..count)
            .map(|i| caps_for(style.corner_style, i, count))
            .collect();
        let cap_columns: usize = caps.iter().map(|&(l, r)| l as usize + r as usize).sum();

        let inner_total = self
            .width
            .saturating_sub(gap.saturating_mul(count - 1).saturating_add(cap_columns));
        let inner = (inner_total / count).max(1);

        let mut line = String::with_capacity(self.width * 2);
        for (index, &progress) in frame.progress.iter().enumerate() {
            if index > 0 {
                line.push_str(&" ".repeat(gap));
            }

            let filled = ((progress.clamp(0.0, 1.0) * inner as f64).round() as usize).min(inner);
            let (open, close) = caps[index];

            if open {
                self.paint(&mut line, style.progress_color, self.glyphs.open, 1);
            }
            self.paint(&mut line, style.progress_color, self.glyphs.filled, filled);
            self.paint(&mut line, style.track_color, self.glyphs.track, inner - filled);
            if close {
                let cap_color = if filled == inner {
                    style.progress_color
                } else {
                    style.track_color
                };
                self.paint(&mut line, cap_color, self.glyphs.close, 1);
            }
        }

        line
    }

    fn paint(&self, line: &mut String, color: Rgba, glyph: char, count: usize) {
        if count == 0 {
            return;
        }
        if self.color {
            let (r, g, b) = color.premultiplied();
            line.push_str(&format!("\x1b[38;2;{};{};{}m", r, g, b));
        }
        line.extend(std::iter::repeat(glyph).take(count));
        if self.color {
            line.push_str(RESET);
        }
    }
}

/// Which ends of segment `index` get a rounded cap.
fn caps_for(corner: CornerStyle, index: usize, count: usize) -> (bool, bool) {
    if corner.radius() <= 0.0 {
        return (false, false);
    }
    match corner {
        CornerStyle::None => (false, false),
        CornerStyle::RoundedSegments { .. } => (true, true),
        CornerStyle::RoundedBar { .. } => (index == 0, index + 1 == count),
    }
}
