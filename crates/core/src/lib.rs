//! Lane scheduling and lifecycle engine for danmaku: timed comments that
//! scroll across, or pin to the top or bottom of, a playing video.
//!
//! [`DanmakuEngine`] owns the timeline, the lanes and the wrapper pool.
//! [`Driver`] runs its ingestion and frame steps from one cooperative loop
//! and hands each finished frame, a list of
//! [`RenderCommand`](danmaku_protocol::RenderCommand)s, to a [`Renderer`].

pub mod active_list;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod frame;
pub mod ingest;
pub mod lane;
pub mod metrics;
pub mod overlap;
pub mod placed;
pub mod pool;
pub mod source;

pub use clock::{PlaybackClock, PlaybackState};
pub use config::{ConfigError, EngineConfig};
pub use driver::{Driver, StepOutcome};
pub use engine::{Admission, DanmakuEngine, DropReason, EngineStats, Placement};
pub use frame::Renderer;
pub use metrics::{ApproxMetrics, GlyphMetrics, TextExtent};
pub use source::{SourceError, parse_json};
