use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::shared_str::SharedStr;

/// Placement class of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// Enters at the right edge and scrolls left.
    ScrollR2L,
    /// Enters at the left edge and scrolls right.
    ScrollL2R,
    /// Centered, pinned to the topmost free lane.
    TopFixed,
    /// Centered, pinned to the bottommost free lane.
    BottomFixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    LeftToRight,
    RightToLeft,
}

impl CommentKind {
    /// Map the numeric mode used by common comment dumps
    /// (1 = R2L, 6 = L2R, 5 = top, 4 = bottom). Other modes
    /// (positioned, scripted) have no placement class.
    pub fn from_mode(mode: u8) -> Option<Self> {
        match mode {
            1 => Some(Self::ScrollR2L),
            6 => Some(Self::ScrollL2R),
            5 => Some(Self::TopFixed),
            4 => Some(Self::BottomFixed),
            _ => None,
        }
    }

    pub fn scroll_direction(self) -> Option<ScrollDirection> {
        match self {
            Self::ScrollR2L => Some(ScrollDirection::RightToLeft),
            Self::ScrollL2R => Some(ScrollDirection::LeftToRight),
            Self::TopFixed | Self::BottomFixed => None,
        }
    }

    pub fn is_scroll(self) -> bool {
        self.scroll_direction().is_some()
    }
}

/// A kind given either by name (`"top_fixed"`) or by numeric mode (`5`).
#[derive(Deserialize)]
#[serde(untagged)]
enum KindOrMode {
    Kind(CommentKind),
    Mode(u8),
}

fn deserialize_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CommentKind, D::Error> {
    match KindOrMode::deserialize(deserializer)? {
        KindOrMode::Kind(kind) => Ok(kind),
        KindOrMode::Mode(mode) => CommentKind::from_mode(mode)
            .ok_or_else(|| D::Error::custom(format!("unsupported comment mode {mode}"))),
    }
}

fn default_size() -> f64 {
    25.0
}

fn default_color() -> u32 {
    0xFF_FF_FF
}

/// A single timed comment as supplied by a source. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Arrival time on the playback timeline, in milliseconds.
    pub time_ms: u64,
    #[serde(alias = "mode", deserialize_with = "deserialize_kind")]
    pub kind: CommentKind,
    pub text: SharedStr,
    /// Requested text size in density-independent units.
    #[serde(default = "default_size")]
    pub size: f64,
    /// Packed `0xRRGGBB`.
    #[serde(default = "default_color")]
    pub color: u32,
}

impl Comment {
    pub fn new(time_ms: u64, kind: CommentKind, text: impl Into<SharedStr>) -> Self {
        Self {
            time_ms,
            kind,
            text: text.into(),
            size: default_size(),
            color: default_color(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_mapping_covers_placement_classes() {
        assert_eq!(CommentKind::from_mode(1), Some(CommentKind::ScrollR2L));
        assert_eq!(CommentKind::from_mode(6), Some(CommentKind::ScrollL2R));
        assert_eq!(CommentKind::from_mode(5), Some(CommentKind::TopFixed));
        assert_eq!(CommentKind::from_mode(4), Some(CommentKind::BottomFixed));
        assert_eq!(CommentKind::from_mode(7), None);
        assert_eq!(CommentKind::from_mode(8), None);
    }

    #[test]
    fn fixed_kinds_have_no_direction() {
        assert!(!CommentKind::TopFixed.is_scroll());
        assert!(CommentKind::BottomFixed.scroll_direction().is_none());
        assert_eq!(
            CommentKind::ScrollL2R.scroll_direction(),
            Some(ScrollDirection::LeftToRight)
        );
    }

    #[test]
    fn json_defaults_fill_size_and_color() {
        let json = r#"{"time_ms": 1500, "kind": "top_fixed", "text": "hi"}"#;
        let comment: Comment = match serde_json::from_str(json) {
            Ok(c) => c,
            Err(e) => panic!("decode failed: {e}"),
        };
        assert_eq!(comment.time_ms, 1500);
        assert_eq!(comment.kind, CommentKind::TopFixed);
        assert!((comment.size - 25.0).abs() < f64::EPSILON);
        assert_eq!(comment.color, 0xFF_FF_FF);
    }

    #[test]
    fn numeric_mode_decodes_to_kind() {
        let json = r#"[
            {"time_ms": 0, "mode": 6, "text": "a"},
            {"time_ms": 0, "kind": 4, "text": "b"},
            {"time_ms": 0, "kind": "scroll_r2l", "text": "c"}
        ]"#;
        let comments: Vec<Comment> = serde_json::from_str(json).unwrap_or_default();
        let kinds: Vec<CommentKind> = comments.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CommentKind::ScrollL2R,
                CommentKind::BottomFixed,
                CommentKind::ScrollR2L
            ]
        );
    }
}
