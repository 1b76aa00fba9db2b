//! Property-based invariant tests for lane scheduling.
//!
//! Across arbitrary sources and viewports:
//!
//! 1. Every wrapper is either live in a lane or waiting in the pool
//! 2. Live comments never exceed `max_concurrent`
//! 3. A lane holds at most one fixed comment, matching its occupancy flag
//! 4. Comments are emitted once each, in source order
//! 5. After a seek nothing earlier than the target is emitted
//! 6. Once the source is exhausted the screen drains completely

use std::time::{Duration, Instant};

use danmaku_core::{ApproxMetrics, DanmakuEngine, Driver, EngineConfig};
use danmaku_protocol::{Comment, CommentKind, RenderCommand, Viewport};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn kind_strategy() -> impl Strategy<Value = CommentKind> {
    prop_oneof![
        Just(CommentKind::ScrollR2L),
        Just(CommentKind::ScrollL2R),
        Just(CommentKind::TopFixed),
        Just(CommentKind::BottomFixed),
    ]
}

fn source_strategy() -> impl Strategy<Value = Vec<Comment>> {
    prop::collection::vec((0u64..3_000, kind_strategy(), 1usize..12), 0..60).prop_map(|raw| {
        let mut comments: Vec<Comment> = raw
            .into_iter()
            .map(|(t, kind, len)| Comment::new(t, kind, "w".repeat(len)))
            .collect();
        comments.sort_by_key(|c| c.time_ms);
        comments
    })
}

fn viewport_strategy() -> impl Strategy<Value = Viewport> {
    (100.0f64..1_500.0, 0.0f64..400.0).prop_map(|(w, h)| Viewport::new(w, h, 1.0))
}

fn config_strategy() -> impl Strategy<Value = EngineConfig> {
    (1usize..30, 1usize..10, any::<bool>()).prop_map(|(cap, lanes, avoid)| EngineConfig {
        max_concurrent: cap,
        max_lanes: lanes,
        avoid_overlap: avoid,
        scroll_show_duration_ms: 2_000,
        center_show_duration_ms: 1_000,
        ..EngineConfig::default()
    })
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn assert_lane_invariants(engine: &DanmakuEngine<ApproxMetrics>) -> Result<(), TestCaseError> {
    let stats = engine.stats();
    prop_assert_eq!(stats.live + stats.pooled, stats.allocated);
    prop_assert!(stats.live <= engine.config().max_concurrent);
    for lane in engine.lanes().iter() {
        let fixed = lane
            .active()
            .iter()
            .chain(lane.pending())
            .filter(|p| !p.is_scroll())
            .count();
        prop_assert!(fixed <= 1, "lane {} holds {} fixed comments", lane.index, fixed);
        prop_assert_eq!(fixed == 1, lane.has_fixed_occupant());
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1–4, 6. Continuous playback
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn playback_keeps_lane_invariants(
        comments in source_strategy(),
        viewport in viewport_strategy(),
        config in config_strategy(),
    ) {
        let total = comments.len();
        let mut engine = DanmakuEngine::new(config, ApproxMetrics::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        engine.set_viewport(viewport);
        engine.set_source(comments);
        let mut driver = Driver::new(engine.config());
        let mut sink = |_: &[RenderCommand]| {};
        engine.start();

        let t0 = Instant::now();
        let mut emitted = Vec::new();
        for step in 0..700 {
            let out = driver.step(&mut engine, t0 + ms(step * 10), &mut sink);
            emitted.extend(out.admissions.iter().map(|a| a.source_index));
            assert_lane_invariants(&engine)?;
        }

        prop_assert_eq!(emitted, (0..total).collect::<Vec<_>>());
        prop_assert_eq!(engine.stats().live, 0);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Seeking
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seek_never_emits_earlier_comments(
        comments in source_strategy(),
        seek_step in 1u64..200,
        target in 0u64..3_000,
    ) {
        let mut engine = DanmakuEngine::new(EngineConfig::default(), ApproxMetrics::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        engine.set_viewport(Viewport::new(800.0, 300.0, 1.0));
        engine.set_source(comments);
        let mut driver = Driver::new(engine.config());
        let mut sink = |_: &[RenderCommand]| {};
        engine.start();

        let t0 = Instant::now();
        let mut after_seek = Vec::new();
        for step in 0..400 {
            if step == seek_step {
                prop_assert!(engine.seek_to(target));
                prop_assert_eq!(engine.stats().live, 0);
            }
            let out = driver.step(&mut engine, t0 + ms(step * 10), &mut sink);
            if step >= seek_step {
                after_seek.extend(out.admissions.iter().map(|a| a.source_index));
            }
            assert_lane_invariants(&engine)?;
        }

        let source = engine.source();
        for idx in &after_seek {
            prop_assert!(source[*idx].time_ms >= target);
        }
        prop_assert!(after_seek.windows(2).all(|w| w[0] < w[1]));
    }
}
