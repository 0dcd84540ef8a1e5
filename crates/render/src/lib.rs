//! Text rendering for storybar.
//!
//! Turns engine frames into a single terminal line, honoring padding,
//! corner style and colors from the segment style.

#![warn(missing_docs)]

pub mod terminal;
pub mod text;

pub use terminal::TerminalRenderer;
pub use text::{Glyphs, TextRenderer};
