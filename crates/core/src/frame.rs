use danmaku_protocol::{Color, Point, RenderCommand};

use crate::lane::LaneSet;
use crate::placed::PlacedComment;
use crate::pool::ObjectPool;

/// Receives each finished frame.
///
/// Painting (glyph rasterization, outlines) is the implementor's business;
/// the engine only says what goes where.
pub trait Renderer {
    fn present(&mut self, frame: &[RenderCommand]);
}

impl<F: FnMut(&[RenderCommand])> Renderer for F {
    fn present(&mut self, frame: &[RenderCommand]) {
        self(frame);
    }
}

/// Inputs the frame step needs besides the lanes themselves.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub viewport_width: f64,
    /// Playback time, for fixed-comment expiry.
    pub now_ms: u64,
    pub center_show_duration_ms: u64,
    /// False while paused: staged comments are committed but nothing moves
    /// or expires.
    pub advance: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub committed: usize,
    pub retired: usize,
}

/// One frame of lane upkeep:
///
/// 1. move each lane's staged comment into its active list,
/// 2. in a single pass per lane, step scroll comments and retire the ones
///    that exited, retire fixed comments whose display time elapsed,
/// 3. return retired wrappers to `pool`.
pub fn advance(
    lanes: &mut LaneSet,
    pool: &mut ObjectPool<PlacedComment>,
    ctx: &FrameContext,
) -> FrameReport {
    let mut report = FrameReport::default();
    for lane in lanes.iter_mut() {
        if lane.commit_pending() {
            report.committed += 1;
        }
        if !ctx.advance {
            continue;
        }

        let mut fixed_retired = false;
        let mut cursor = lane.active_mut().cursor_front();
        while let Some(placed) = cursor.next() {
            let done = if placed.is_scroll() {
                placed.step();
                placed.has_exited(ctx.viewport_width)
            } else {
                ctx.now_ms.saturating_sub(placed.show_time_ms) > ctx.center_show_duration_ms
            };
            if !done {
                continue;
            }
            // next() just yielded this comment, so remove() takes it.
            if let Some(retired) = cursor.remove() {
                fixed_retired |= !retired.is_scroll();
                tracing::trace!(lane = retired.lane, x = retired.x, "retired comment");
                pool.release(retired);
                report.retired += 1;
            }
        }
        if fixed_retired {
            lane.release_fixed();
        }
    }
    report
}

/// Draw commands for every committed comment, lane by lane, in admission
/// order. Text is centered vertically in its lane.
pub fn snapshot(lanes: &LaneSet) -> Vec<RenderCommand> {
    let line_height = lanes.line_height();
    let mut commands = Vec::with_capacity(lanes.live_count() + 1);
    commands.push(RenderCommand::Clear);
    for lane in lanes.iter() {
        for placed in lane.active().iter() {
            let Some(comment) = placed.comment() else {
                continue;
            };
            let color = Color::from_rgb24(comment.color);
            commands.push(RenderCommand::DrawText {
                position: Point::new(placed.x, lane.y + (line_height - placed.height) / 2.0),
                text: comment.text.clone(),
                color,
                outline: color.outline(),
                font_size: placed.font_size,
            });
        }
    }
    commands
}
