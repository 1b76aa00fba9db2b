use std::time::{Duration, Instant};

use serde::Serialize;

/// Lifecycle of the playback timeline.
///
/// ```text
///   Idle ──prepare──▶ Prepared ──start──▶ Playing ◀──resume── Paused
///    ▲                  ▲  ▲                 │  └────pause────▶ ▲
///    └──── release ─────┘  └───── stop ──────┘                  │
///                     Playing/Paused ──seek──▶ Seeking ──▶ (previous)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Prepared,
    Playing,
    Paused,
    Seeking,
}

/// Elapsed playback time, advanced by measured wall-clock deltas.
///
/// The reference instant is taken on the first tick after `start`/`resume`,
/// so time spent paused is never counted.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    state: PlaybackState,
    elapsed: Duration,
    last_tick: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            elapsed: Duration::ZERO,
            last_tick: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Idle → Prepared. Returns whether the transition happened.
    pub fn prepare(&mut self) -> bool {
        self.transition(&[PlaybackState::Idle], PlaybackState::Prepared)
    }

    /// Prepared → Playing.
    pub fn start(&mut self) -> bool {
        self.transition(&[PlaybackState::Prepared], PlaybackState::Playing)
    }

    /// Playing → Paused. No-op in any other state.
    pub fn pause(&mut self) -> bool {
        self.transition(&[PlaybackState::Playing], PlaybackState::Paused)
    }

    /// Paused → Playing.
    pub fn resume(&mut self) -> bool {
        self.transition(&[PlaybackState::Paused], PlaybackState::Playing)
    }

    /// Enter the transient seeking state, returning the state to restore.
    /// `None` when idle.
    pub fn begin_seek(&mut self, target: Duration) -> Option<PlaybackState> {
        if self.state == PlaybackState::Idle {
            return None;
        }
        let previous = match self.state {
            PlaybackState::Seeking => PlaybackState::Paused,
            other => other,
        };
        self.state = PlaybackState::Seeking;
        self.elapsed = target;
        self.last_tick = None;
        Some(previous)
    }

    pub fn end_seek(&mut self, restore: PlaybackState) {
        if self.state == PlaybackState::Seeking {
            self.state = restore;
        }
    }

    /// Any non-idle state → Prepared, with time rewound to zero.
    pub fn stop(&mut self) -> bool {
        if self.state == PlaybackState::Idle {
            return false;
        }
        self.state = PlaybackState::Prepared;
        self.elapsed = Duration::ZERO;
        self.last_tick = None;
        true
    }

    /// Any state → Idle.
    pub fn release(&mut self) {
        self.state = PlaybackState::Idle;
        self.elapsed = Duration::ZERO;
        self.last_tick = None;
    }

    /// Add the time since the previous tick. Returns the new elapsed time in
    /// milliseconds, or `None` when not playing.
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let delta = match self.last_tick {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };
        self.last_tick = Some(now);
        self.elapsed += delta;
        Some(self.current_time_ms())
    }

    fn transition(&mut self, from: &[PlaybackState], to: PlaybackState) -> bool {
        if !from.contains(&self.state) {
            return false;
        }
        tracing::debug!(from = ?self.state, ?to, "playback state");
        self.state = to;
        if matches!(to, PlaybackState::Playing | PlaybackState::Paused) {
            // Next tick re-anchors; paused time is not counted.
            self.last_tick = None;
        }
        true
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
