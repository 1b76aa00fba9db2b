use std::time::{Duration, Instant};

use crate::clock::PlaybackState;
use crate::config::EngineConfig;
use crate::engine::{Admission, DanmakuEngine};
use crate::frame::Renderer;
use crate::metrics::GlyphMetrics;

/// What one [`Driver::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Admission outcomes if the ingestion step ran.
    pub admissions: Vec<Admission>,
    pub ticked: bool,
    pub framed: bool,
    /// Earliest instant at which the next `step` has work to do.
    pub next_wake: Instant,
}

/// Runs the ingestion and frame steps of a [`DanmakuEngine`] on their own
/// periods from a single loop, so the two never overlap.
///
/// The ingestion deadline only runs while the engine is playing. The frame
/// deadline always runs; a paused engine still presents its frozen frame.
/// A deadline missed by more than a whole period is re-anchored to `now`
/// instead of firing a burst of catch-up steps.
#[derive(Debug, Clone)]
pub struct Driver {
    tick_period: Duration,
    frame_period: Duration,
    next_tick: Option<Instant>,
    next_frame: Option<Instant>,
}

impl Driver {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_periods(config.tick_period(), config.frame_period())
    }

    pub fn with_periods(tick_period: Duration, frame_period: Duration) -> Self {
        Self {
            tick_period,
            frame_period,
            next_tick: None,
            next_frame: None,
        }
    }

    pub fn step<M, R>(
        &mut self,
        engine: &mut DanmakuEngine<M>,
        now: Instant,
        renderer: &mut R,
    ) -> StepOutcome
    where
        M: GlyphMetrics,
        R: Renderer + ?Sized,
    {
        let mut admissions = Vec::new();
        let mut ticked = false;
        if engine.state() == PlaybackState::Playing {
            let due = *self.next_tick.get_or_insert(now);
            if now >= due {
                admissions = engine.tick(now);
                ticked = true;
                self.next_tick = Some(next_deadline(due, self.tick_period, now));
            }
        } else {
            self.next_tick = None;
        }

        let mut framed = false;
        let due = *self.next_frame.get_or_insert(now);
        if now >= due {
            engine.render(now, renderer);
            framed = true;
            self.next_frame = Some(next_deadline(due, self.frame_period, now));
        }

        let next_frame = self.next_frame.unwrap_or(now + self.frame_period);
        let next_wake = match self.next_tick {
            Some(tick) => tick.min(next_frame),
            None => next_frame,
        };
        StepOutcome {
            admissions,
            ticked,
            framed,
            next_wake,
        }
    }

    /// Forget both deadlines; the next `step` runs both steps immediately.
    pub fn reset(&mut self) {
        self.next_tick = None;
        self.next_frame = None;
    }
}

fn next_deadline(due: Instant, period: Duration, now: Instant) -> Instant {
    let next = due + period;
    if now.saturating_duration_since(next) > period {
        tracing::trace!(behind = ?now.saturating_duration_since(next), "deadline re-anchored");
        now + period
    } else {
        next
    }
}
