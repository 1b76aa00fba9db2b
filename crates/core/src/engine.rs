use std::sync::Arc;
use std::time::{Duration, Instant};

use danmaku_protocol::{Color, Comment, Point, RenderCommand, ScrollDirection, SharedStr, Viewport};
use serde::Serialize;

use crate::clock::{PlaybackClock, PlaybackState};
use crate::config::{ConfigError, EngineConfig};
use crate::frame::{self, FrameContext, Renderer};
use crate::ingest::IngestionCursor;
use crate::lane::LaneSet;
use crate::metrics::{GlyphMetrics, font_size_px};
use crate::placed::PlacedComment;
use crate::pool::ObjectPool;

const DEBUG_TEXT_SIZE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// `max_concurrent` comments were already staged or on screen.
    AtCapacity,
    /// Every lane was occupied, or the viewport has no lanes.
    NoLane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Lane(usize),
    Dropped(DropReason),
}

/// Outcome for one comment emitted by the ingestion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Admission {
    /// Index into the current source.
    pub source_index: usize,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub state: PlaybackState,
    pub current_time_ms: u64,
    /// Comments staged or on screen.
    pub live: usize,
    /// Wrappers waiting in the pool.
    pub pooled: usize,
    /// Wrappers constructed fresh since the last stop.
    pub allocated: usize,
    pub dropped: u64,
    pub lanes: usize,
    pub max_lanes: usize,
    pub line_height: f64,
    pub lane_margin: f64,
    pub fps: u32,
}

#[derive(Debug, Clone, Default)]
struct FpsMeter {
    window_start: Option<Instant>,
    frames: u32,
    fps: u32,
}

impl FpsMeter {
    fn record(&mut self, now: Instant) {
        self.frames += 1;
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed > Duration::from_secs(1) {
            self.fps = (f64::from(self.frames) / elapsed.as_secs_f64()).round() as u32;
            self.frames = 0;
            self.window_start = Some(now);
        }
    }
}

/// The lane scheduler: admits timed comments into lanes as playback time
/// reaches them, animates them frame by frame and recycles them once they
/// leave.
///
/// Two steps drive it, and every mutation goes through `&mut self`, so they
/// can never interleave:
///
/// * [`tick`](Self::tick) advances the clock and admits due comments,
/// * [`frame`](Self::frame) commits staged comments, moves and culls, and
///   returns the frame to draw.
///
/// [`Driver`](crate::driver::Driver) runs both on their periods from one loop.
#[derive(Debug)]
pub struct DanmakuEngine<M> {
    config: EngineConfig,
    metrics: M,
    clock: PlaybackClock,
    cursor: IngestionCursor,
    source: Arc<[Comment]>,
    viewport: Viewport,
    lanes: LaneSet,
    pool: ObjectPool<PlacedComment>,
    visible: bool,
    dropped: u64,
    fps: FpsMeter,
}

impl<M: GlyphMetrics> DanmakuEngine<M> {
    /// Build an idle engine. Fails if `config` does not validate.
    pub fn new(config: EngineConfig, metrics: M) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            metrics,
            clock: PlaybackClock::new(),
            cursor: IngestionCursor::new(),
            source: Arc::from(Vec::<Comment>::new()),
            viewport: Viewport::default(),
            lanes: LaneSet::default(),
            pool: ObjectPool::new(),
            visible: true,
            dropped: 0,
            fps: FpsMeter::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.clock.state()
    }

    pub fn is_prepared(&self) -> bool {
        self.clock.state() != PlaybackState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.clock.state() == PlaybackState::Paused
    }

    pub fn current_time_ms(&self) -> u64 {
        self.clock.current_time_ms()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn lanes(&self) -> &LaneSet {
        &self.lanes
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn source(&self) -> &[Comment] {
        &self.source
    }

    /// Replace the comment source (sorted ascending by `time_ms`) and
    /// prepare the engine if it is idle. Ingestion continues from the
    /// current playback time.
    pub fn set_source(&mut self, comments: impl Into<Arc<[Comment]>>) {
        self.source = comments.into();
        self.cursor.seek(&self.source, self.clock.current_time_ms());
        tracing::debug!(count = self.source.len(), "comment source set");
        self.prepare();
    }

    /// Idle → Prepared, laying out lanes for the current viewport.
    pub fn prepare(&mut self) -> bool {
        if !self.clock.prepare() {
            return false;
        }
        self.measure_lanes();
        true
    }

    /// Apply a new surface size. A prepared engine drops everything on
    /// screen and lays its lanes out again; playback carries on.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.is_prepared() {
            return;
        }
        let was_playing = self.clock.pause();
        self.discard_live();
        self.measure_lanes();
        if was_playing {
            self.clock.resume();
        }
    }

    pub fn start(&mut self) -> bool {
        self.clock.start()
    }

    pub fn pause(&mut self) -> bool {
        self.clock.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.clock.resume()
    }

    /// Jump playback to `time_ms`: everything on screen goes back to the
    /// pool and ingestion restarts at the first comment at or after the
    /// target. Play/pause state is kept. No-op while idle.
    pub fn seek_to(&mut self, time_ms: u64) -> bool {
        let Some(restore) = self.clock.begin_seek(Duration::from_millis(time_ms)) else {
            return false;
        };
        self.cursor.seek(&self.source, time_ms);
        self.discard_live();
        self.clock.end_seek(restore);
        tracing::debug!(time_ms, next = self.cursor.position(), "seeked");
        true
    }

    /// Back to Prepared at time zero with empty lanes and an empty pool.
    pub fn stop(&mut self) {
        if !self.clock.stop() {
            return;
        }
        self.lanes.clear();
        self.pool.clear();
        self.cursor.reset();
        self.dropped = 0;
    }

    /// Back to Idle; lanes are torn down until the next `prepare`.
    pub fn release(&mut self) {
        self.stop();
        self.clock.release();
        self.lanes = LaneSet::default();
        tracing::debug!("released");
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_shown(&self) -> bool {
        self.visible
    }

    /// Ingestion step: advance the clock to `now` and try to place every
    /// comment whose arrival time has been reached. Returns the outcome
    /// for each, in source order. Does nothing unless playing.
    pub fn tick(&mut self, now: Instant) -> Vec<Admission> {
        let Some(now_ms) = self.clock.tick(now) else {
            return Vec::new();
        };
        let source = Arc::clone(&self.source);
        let mut admissions = Vec::new();
        while let Some(idx) = self.cursor.next_due(&source, now_ms) {
            let placement = self.admit(&source[idx], now_ms);
            admissions.push(Admission {
                source_index: idx,
                placement,
            });
        }
        admissions
    }

    /// Frame step: commit staged comments, move and cull, then describe
    /// the frame. Positions only change while playing.
    pub fn frame(&mut self, now: Instant) -> Vec<RenderCommand> {
        let ctx = FrameContext {
            viewport_width: self.viewport.width,
            now_ms: self.clock.current_time_ms(),
            center_show_duration_ms: self.config.center_show_duration_ms,
            advance: self.clock.is_playing(),
        };
        let report = frame::advance(&mut self.lanes, &mut self.pool, &ctx);
        if report.retired > 0 {
            tracing::trace!(retired = report.retired, pooled = self.pool.len(), "culled");
        }
        self.fps.record(now);

        let mut commands = if self.visible {
            frame::snapshot(&self.lanes)
        } else {
            vec![RenderCommand::Clear]
        };
        if self.config.show_debug_info {
            commands.extend(self.debug_overlay());
        }
        commands
    }

    /// Run the frame step and hand the result to `renderer`.
    pub fn render<R: Renderer + ?Sized>(&mut self, now: Instant, renderer: &mut R) {
        let commands = self.frame(now);
        renderer.present(&commands);
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            state: self.clock.state(),
            current_time_ms: self.clock.current_time_ms(),
            live: self.lanes.live_count(),
            pooled: self.pool.len(),
            allocated: self.pool.allocated(),
            dropped: self.dropped,
            lanes: self.lanes.len(),
            max_lanes: self.config.max_lanes,
            line_height: self.lanes.line_height(),
            lane_margin: self.lanes.margin(),
            fps: self.fps.fps,
        }
    }

    fn admit(&mut self, comment: &Comment, now_ms: u64) -> Placement {
        let font_size = font_size_px(
            comment.size,
            self.config.max_text_size,
            self.viewport.dpr,
            self.config.scale_text_ratio,
        );
        let extent = self.metrics.measure(&comment.text, font_size);
        let mut placed = self.pool.acquire();
        placed.wrap(comment, extent, font_size);

        if self.lanes.live_count() >= self.config.max_concurrent {
            return self.reject(placed, DropReason::AtCapacity);
        }

        let width = self.viewport.width;
        match comment.kind.scroll_direction() {
            Some(direction) => {
                placed.speed = self.config.scroll_speed(width, extent.width);
                placed.x = match direction {
                    ScrollDirection::RightToLeft => width,
                    ScrollDirection::LeftToRight => -extent.width,
                };
            }
            None => {
                placed.x = (width - extent.width) / 2.0;
                placed.show_time_ms = now_ms;
            }
        }

        let Some(idx) = self
            .lanes
            .find_lane(&placed, width, self.config.avoid_overlap)
        else {
            return self.reject(placed, DropReason::NoLane);
        };
        match self.lanes.get_mut(idx) {
            Some(lane) => {
                tracing::trace!(lane = idx, time_ms = comment.time_ms, text = %comment.text, "admitted");
                lane.stage(placed);
                Placement::Lane(idx)
            }
            None => self.reject(placed, DropReason::NoLane),
        }
    }

    fn reject(&mut self, placed: PlacedComment, reason: DropReason) -> Placement {
        tracing::trace!(?reason, "dropped comment");
        self.pool.release(placed);
        self.dropped += 1;
        Placement::Dropped(reason)
    }

    fn discard_live(&mut self) {
        let drained = self.lanes.drain();
        self.pool.release_all(drained);
    }

    fn measure_lanes(&mut self) {
        let height = if self.viewport.is_empty() {
            0.0
        } else {
            self.viewport.height
        };
        let font_size = font_size_px(
            self.config.max_text_size,
            self.config.max_text_size,
            self.viewport.dpr,
            self.config.scale_text_ratio,
        );
        let line_height = self.metrics.line_height(font_size);
        self.lanes = LaneSet::measure(height, line_height, self.config.max_lanes);
    }

    fn debug_overlay(&self) -> Vec<RenderCommand> {
        let font_size = font_size_px(DEBUG_TEXT_SIZE, DEBUG_TEXT_SIZE, self.viewport.dpr, 1.0);
        let line = self.metrics.line_height(font_size);
        let stats = self.stats();
        let lines = [
            format!(
                "fps:{} count:{}/{}/{} time:{:.1}s",
                stats.fps,
                stats.live,
                stats.pooled,
                stats.allocated,
                stats.current_time_ms as f64 / 1_000.0
            ),
            format!(
                "lanes:{}/{} lane_height:{:.1} margin:{:.1} viewport:{}x{}",
                stats.lanes,
                stats.max_lanes,
                stats.line_height,
                stats.lane_margin,
                self.viewport.width,
                self.viewport.height
            ),
        ];
        let top = self.viewport.height - line * lines.len() as f64;
        lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| RenderCommand::DrawText {
                position: Point::new(0.0, top + line * i as f64),
                text: SharedStr::from(text),
                color: Color::WHITE,
                outline: Color::BLACK,
                font_size,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use danmaku_protocol::CommentKind;

    use super::*;
    use crate::metrics::ApproxMetrics;

    fn engine(config: EngineConfig) -> DanmakuEngine<ApproxMetrics> {
        let mut engine =
            DanmakuEngine::new(config, ApproxMetrics::default()).expect("valid config");
        engine.set_viewport(Viewport::new(1000.0, 400.0, 1.0));
        engine
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn set_source_prepares_and_measures() {
        let mut e = engine(EngineConfig::default());
        assert!(!e.is_prepared());
        assert_eq!(e.lane_count(), 0);
        e.set_source(vec![Comment::new(0, CommentKind::ScrollR2L, "a")]);
        assert!(e.is_prepared());
        // 21dp * 0.9 = 18.9px font, 22.68px lines: 17 fit in 400px.
        assert_eq!(e.lane_count(), 17);
    }

    #[test]
    fn new_rejects_an_unusable_config() {
        let config = EngineConfig {
            frame_period_ms: 1e30,
            ..EngineConfig::default()
        };
        assert!(matches!(
            DanmakuEngine::new(config, ApproxMetrics::default()),
            Err(ConfigError::OutOfRange { .. })
        ));
        let config = EngineConfig {
            max_text_size: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(
            DanmakuEngine::new(config, ApproxMetrics::default()),
            Err(ConfigError::NotPositive { field: "max_text_size", .. })
        ));
    }

    #[test]
    fn drawn_text_carries_clamped_size_and_color() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![
            Comment::new(0, CommentKind::TopFixed, "big")
                .with_size(40.0)
                .with_color(0xFF_00_00),
            Comment::new(0, CommentKind::BottomFixed, "small").with_size(10.0),
        ]);
        e.start();
        let t0 = Instant::now();
        e.tick(t0);
        let drawn: Vec<(f64, Color, Color)> = e
            .frame(t0)
            .iter()
            .filter_map(|cmd| match cmd {
                RenderCommand::DrawText {
                    color,
                    outline,
                    font_size,
                    ..
                } => Some((*font_size, *color, *outline)),
                RenderCommand::Clear => None,
            })
            .collect();
        assert_eq!(drawn.len(), 2);
        // 40dp is capped at 21dp, then scaled by 0.9.
        assert!((drawn[0].0 - 18.9).abs() < 1e-9);
        assert_eq!(drawn[0].1, Color::from_rgb24(0xFF_00_00));
        assert_eq!(drawn[0].2, Color::WHITE);
        assert!((drawn[1].0 - 9.0).abs() < 1e-9);
        assert_eq!(drawn[1].2, Color::BLACK);
    }

    #[test]
    fn tick_before_start_is_ignored() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![Comment::new(0, CommentKind::ScrollR2L, "a")]);
        assert!(e.tick(Instant::now()).is_empty());
        assert!(!e.pause());
    }

    #[test]
    fn scroll_comment_spawns_at_right_edge_with_width_scaled_speed() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![Comment::new(0, CommentKind::ScrollR2L, "abcd")]);
        e.start();
        let admissions = e.tick(Instant::now());
        assert_eq!(admissions.len(), 1);
        assert_eq!(admissions[0].placement, Placement::Lane(0));

        let staged = e.lanes().get(0).and_then(|l| l.pending());
        let (x, speed, width) = staged.map(|p| (p.x, p.speed, p.width)).unwrap_or_default();
        assert!((x - 1000.0).abs() < 1e-9);
        assert!((speed - e.config().scroll_speed(1000.0, width)).abs() < 1e-9);
    }

    #[test]
    fn fixed_comment_is_centered_and_expires_on_playback_time() {
        let config = EngineConfig {
            center_show_duration_ms: 300,
            ..EngineConfig::default()
        };
        let mut e = engine(config);
        e.set_source(vec![Comment::new(0, CommentKind::TopFixed, "abcd")]);
        e.start();
        let t0 = Instant::now();
        e.tick(t0);
        e.frame(t0);
        let placed = e.lanes().get(0).and_then(|l| l.active().front());
        let (x, width) = placed.map(|p| (p.x, p.width)).unwrap_or_default();
        assert!((x - (1000.0 - width) / 2.0).abs() < 1e-9);

        // Paused wall time does not count towards expiry.
        e.pause();
        e.frame(t0 + ms(10_000));
        assert_eq!(e.stats().live, 1);
        e.resume();
        e.tick(t0 + ms(10_000));
        e.tick(t0 + ms(10_301));
        e.frame(t0 + ms(10_301));
        assert_eq!(e.stats().live, 0);
        assert_eq!(e.stats().pooled, 1);
    }

    #[test]
    fn hidden_engine_keeps_scheduling_but_draws_nothing() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![Comment::new(0, CommentKind::BottomFixed, "x")]);
        e.start();
        e.hide();
        let t0 = Instant::now();
        e.tick(t0);
        assert_eq!(e.frame(t0), vec![RenderCommand::Clear]);
        assert_eq!(e.stats().live, 1);
        e.show();
        assert_eq!(e.frame(t0).len(), 2);
    }

    #[test]
    fn debug_overlay_adds_two_lines() {
        let config = EngineConfig {
            show_debug_info: true,
            ..EngineConfig::default()
        };
        let mut e = engine(config);
        e.set_source(Vec::<Comment>::new());
        let cmds = e.frame(Instant::now());
        let texts: Vec<&str> = cmds.iter().filter_map(RenderCommand::text).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("fps:"));
        assert!(texts[1].starts_with("lanes:17/20"));
    }

    #[test]
    fn resize_discards_live_and_remeasures() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![Comment::new(0, CommentKind::ScrollR2L, "a")]);
        e.start();
        e.tick(Instant::now());
        assert_eq!(e.stats().live, 1);

        e.set_viewport(Viewport::new(1000.0, 100.0, 1.0));
        assert_eq!(e.lane_count(), 4);
        assert_eq!(e.stats().live, 0);
        assert_eq!(e.stats().pooled, 1);
        assert_eq!(e.state(), PlaybackState::Playing);

        e.set_viewport(Viewport::new(0.0, 0.0, 1.0));
        assert_eq!(e.lane_count(), 0);
    }

    #[test]
    fn release_then_prepare_again() {
        let mut e = engine(EngineConfig::default());
        e.set_source(vec![Comment::new(0, CommentKind::ScrollR2L, "a")]);
        e.start();
        e.release();
        assert!(!e.is_prepared());
        assert_eq!(e.lane_count(), 0);
        assert!(!e.seek_to(10));
        assert!(e.prepare());
        assert_eq!(e.lane_count(), 17);
        assert!(e.start());
    }
}
