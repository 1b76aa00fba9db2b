use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::types::{Color, Point};

/// A single, stateless render instruction.
///
/// The engine emits a `Vec<RenderCommand>` for every frame. Renderers
/// consume the list in order; each command carries all the data it needs,
/// so a renderer keeps no state between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Wipe the overlay to transparent. Always the first command of a frame.
    Clear,

    /// Draw a comment (or a debug line). `position` is the top-left corner
    /// of the text box in viewport pixels.
    DrawText {
        position: Point,
        text: SharedStr,
        color: Color,
        outline: Color,
        font_size: f64,
    },
}

impl RenderCommand {
    pub fn text(&self) -> Option<&str> {
        match self {
            RenderCommand::DrawText { text, .. } => Some(text.as_str()),
            RenderCommand::Clear => None,
        }
    }
}
