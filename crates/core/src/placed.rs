use danmaku_protocol::{Comment, CommentKind, ScrollDirection};

use crate::metrics::TextExtent;
use crate::overlap::Kinematics;

/// Pool-managed wrapper around a [`Comment`] while it is on screen.
///
/// Pooled wrappers keep their last contents; [`PlacedComment::wrap`]
/// overwrites every field on reuse.
#[derive(Debug, Clone, Default)]
pub struct PlacedComment {
    comment: Option<Comment>,
    /// Left edge in viewport pixels.
    pub x: f64,
    pub lane: usize,
    /// Pixels per frame; zero for fixed comments.
    pub speed: f64,
    /// Playback time of admission, for fixed-comment expiry.
    pub show_time_ms: u64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
}

impl PlacedComment {
    pub(crate) fn wrap(&mut self, comment: &Comment, extent: TextExtent, font_size: f64) {
        self.comment = Some(comment.clone());
        self.x = 0.0;
        self.lane = 0;
        self.speed = 0.0;
        self.show_time_ms = 0;
        self.width = extent.width;
        self.height = extent.height;
        self.font_size = font_size;
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn kind(&self) -> Option<CommentKind> {
        self.comment.as_ref().map(|c| c.kind)
    }

    pub fn direction(&self) -> Option<ScrollDirection> {
        self.kind().and_then(CommentKind::scroll_direction)
    }

    pub fn is_scroll(&self) -> bool {
        self.direction().is_some()
    }

    /// Whether the trailing edge has crossed the exit boundary.
    pub fn has_exited(&self, viewport_width: f64) -> bool {
        match self.direction() {
            Some(ScrollDirection::RightToLeft) => self.x + self.width < 0.0,
            Some(ScrollDirection::LeftToRight) => self.x > viewport_width,
            None => false,
        }
    }

    /// Whether the whole text has come in past the entry edge.
    pub fn has_fully_entered(&self, viewport_width: f64) -> bool {
        match self.direction() {
            Some(ScrollDirection::RightToLeft) => self.x + self.width < viewport_width,
            Some(ScrollDirection::LeftToRight) => self.x > 0.0,
            None => true,
        }
    }

    /// Move one frame along the direction of travel.
    pub fn step(&mut self) {
        match self.direction() {
            Some(ScrollDirection::RightToLeft) => self.x -= self.speed,
            Some(ScrollDirection::LeftToRight) => self.x += self.speed,
            None => {}
        }
    }

    /// Position in the right-to-left frame the overlap predictor works in.
    pub fn kinematics(&self, viewport_width: f64) -> Kinematics {
        let x = match self.direction() {
            Some(ScrollDirection::LeftToRight) => viewport_width - self.x - self.width,
            _ => self.x,
        };
        Kinematics {
            x,
            width: self.width,
            speed: self.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(kind: CommentKind, x: f64, width: f64) -> PlacedComment {
        let mut p = PlacedComment::default();
        p.wrap(
            &Comment::new(0, kind, "x"),
            TextExtent {
                width,
                height: 20.0,
            },
            20.0,
        );
        p.x = x;
        p.speed = 4.0;
        p
    }

    #[test]
    fn r2l_exits_past_left_edge() {
        let mut p = placed(CommentKind::ScrollR2L, 1.0, 100.0);
        assert!(!p.has_exited(800.0));
        p.x = -100.5;
        assert!(p.has_exited(800.0));
    }

    #[test]
    fn l2r_moves_right_and_exits_past_right_edge() {
        let mut p = placed(CommentKind::ScrollL2R, -100.0, 100.0);
        assert!(!p.has_fully_entered(800.0));
        p.step();
        assert!((p.x + 96.0).abs() < 1e-9);
        p.x = 801.0;
        assert!(p.has_exited(800.0));
    }

    #[test]
    fn l2r_is_mirrored_for_prediction() {
        let p = placed(CommentKind::ScrollL2R, 300.0, 100.0);
        let k = p.kinematics(1000.0);
        assert!((k.x - 600.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_comments_never_move() {
        let mut p = placed(CommentKind::TopFixed, 350.0, 100.0);
        p.step();
        assert!((p.x - 350.0).abs() < 1e-9);
        assert!(!p.has_exited(800.0));
        assert!(!p.is_scroll());
    }
}
