//! # Duration-Matching Segment Scheduler
//!
//! Pure planning layer: given clip durations and a target, decide which time
//! ranges to extract from which clips, how often to repeat them, and in what
//! order, so the assembled timeline lands inside a tight duration window.
//!
//! Two strategies cover the two ends of the pool-size spectrum:
//!
//! - [`DurationMatcher`] — a few whole clips, trimmed or looped with minimal
//!   fragmentation
//! - [`SegmentComposer`] — a large pool cut into many ~1-1.5s extracts with
//!   diversity and anti-repetition guarantees, backed by the free-range
//!   arithmetic in [`intervals`]
//!
//! No I/O happens here and no media bytes are touched; plans are declarative
//! and handed to the media layer for materialization. The only state is the
//! caller-injected random source, so independent calls are safe to run
//! concurrently.

pub mod composer;
pub mod intervals;
pub mod matcher;
pub mod types;

pub use composer::{ComposerParams, SegmentComposer};
pub use intervals::{free_ranges, TimeRange};
pub use matcher::DurationMatcher;
pub use types::{
    segment_plan_duration, trim_plan_duration, Clip, Segment, TargetSpec, TrimInstruction,
};

/// Tolerance for all duration comparisons in the scheduler.
///
/// Sums of many segment lengths accumulate floating-point drift; every
/// acceptance check in this module compares against this epsilon instead of
/// demanding exact equality.
pub const DURATION_EPSILON: f64 = 1e-6;
