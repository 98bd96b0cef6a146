use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// A source clip known to the scheduler only by identity and measured length.
///
/// Durations come from the upstream inspector and are never re-derived here.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Caller-chosen identifier (typically the file stem)
    pub id: String,

    /// Measured duration in seconds, finite and > 0
    pub duration: f64,
}

impl Clip {
    pub fn new<S: Into<String>>(id: S, duration: f64) -> Self {
        Self { id: id.into(), duration }
    }
}

/// Acceptable total duration for an assembled reel.
///
/// Either an explicit closed window or a point target with an absolute
/// margin; both reduce to an acceptable interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetSpec {
    /// Total must land in `[min, max]`
    Window { min: f64, max: f64 },

    /// Total must land in `[target - margin, target + margin]`
    Margin { target: f64, margin: f64 },
}

impl TargetSpec {
    /// The acceptable interval as `(low, high)`.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            TargetSpec::Window { min, max } => (min, max),
            TargetSpec::Margin { target, margin } => (target - margin, target + margin),
        }
    }

    /// Whether a total duration is acceptable.
    pub fn contains(&self, total: f64) -> bool {
        let (low, high) = self.bounds();
        total >= low && total <= high
    }

    /// The duration the loop-extension branch aims for: the window minimum,
    /// or the point target when a margin spec is used.
    pub fn loop_anchor(&self) -> f64 {
        match *self {
            TargetSpec::Window { min, .. } => min,
            TargetSpec::Margin { target, .. } => target,
        }
    }

    /// The duration the trim branch aims for: the window midpoint, or the
    /// point target when a margin spec is used.
    pub fn trim_anchor(&self) -> f64 {
        match *self {
            TargetSpec::Window { min, max } => (min + max) / 2.0,
            TargetSpec::Margin { target, .. } => target,
        }
    }

    /// Validate that the spec describes a non-empty interval of positive durations.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let (low, high) = self.bounds();
        if !(low.is_finite() && high.is_finite()) || low < 0.0 || high < low {
            return Err(ScheduleError::InvalidRange { start: low, end: high, limit: f64::INFINITY });
        }
        Ok(())
    }
}

/// Per-clip trim-and-loop instruction produced by [`DurationMatcher`].
///
/// The downstream materializer extracts `[start, end)` from the clip and
/// plays it `loop_count` times consecutively in place of the original.
///
/// [`DurationMatcher`]: super::DurationMatcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimInstruction {
    /// Extract start in seconds within the source clip
    pub start: f64,

    /// Extract end in seconds within the source clip
    pub end: f64,

    /// Number of consecutive plays of the extract, at least 1
    pub loop_count: u32,
}

impl TrimInstruction {
    /// The pass-through instruction: play the whole clip once.
    pub fn identity(duration: f64) -> Self {
        Self { start: 0.0, end: duration, loop_count: 1 }
    }

    /// Wall-clock seconds this instruction contributes to the assembled output.
    pub fn play_duration(&self) -> f64 {
        (self.end - self.start) * self.loop_count as f64
    }

    /// Defensive range check against the owning clip's duration.
    pub fn validate(&self, clip_duration: f64) -> Result<(), ScheduleError> {
        if self.start < 0.0 || self.start >= self.end || self.end > clip_duration {
            return Err(ScheduleError::InvalidRange {
                start: self.start,
                end: self.end,
                limit: clip_duration,
            });
        }
        Ok(())
    }
}

/// One short extract in a fast-cut timeline, produced by [`SegmentComposer`].
///
/// Emission order is the final timeline order; there is no later reordering.
///
/// [`SegmentComposer`]: super::SegmentComposer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Index of the source clip in the pool the composer was given
    pub clip: usize,

    /// Extract start in seconds within the source clip
    pub start: f64,

    /// Extract end in seconds within the source clip
    pub end: f64,

    /// Extracted source duration in seconds (`end - start`)
    pub duration: f64,

    /// Play this extract at double rate in the final composition
    ///
    /// Bookkeeping note: `duration` stays in source-clip time either way;
    /// playback rate is a downstream transform and is never folded into the
    /// scheduler's duration accounting.
    pub speed_up: bool,
}

impl Segment {
    /// Defensive range check against the owning clip's duration.
    pub fn validate(&self, clip_duration: f64) -> Result<(), ScheduleError> {
        if self.start < 0.0 || self.start >= self.end || self.end > clip_duration {
            return Err(ScheduleError::InvalidRange {
                start: self.start,
                end: self.end,
                limit: clip_duration,
            });
        }
        Ok(())
    }
}

/// Total assembled duration of a trim-and-loop plan.
pub fn trim_plan_duration(plan: &[TrimInstruction]) -> f64 {
    plan.iter().map(TrimInstruction::play_duration).sum()
}

/// Total assembled duration of a fast-cut plan.
pub fn segment_plan_duration(plan: &[Segment]) -> f64 {
    plan.iter().map(|s| s.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_spec_bounds() {
        let window = TargetSpec::Window { min: 21.0, max: 28.0 };
        assert_eq!(window.bounds(), (21.0, 28.0));
        assert_eq!(window.loop_anchor(), 21.0);
        assert_eq!(window.trim_anchor(), 24.5);
        assert!(window.contains(21.0));
        assert!(window.contains(28.0));
        assert!(!window.contains(20.99));

        let margin = TargetSpec::Margin { target: 30.0, margin: 1.5 };
        assert_eq!(margin.bounds(), (28.5, 31.5));
        assert_eq!(margin.loop_anchor(), 30.0);
        assert_eq!(margin.trim_anchor(), 30.0);
    }

    #[test]
    fn identity_instruction_plays_once() {
        let instr = TrimInstruction::identity(5.0);
        assert_eq!(instr.start, 0.0);
        assert_eq!(instr.end, 5.0);
        assert_eq!(instr.loop_count, 1);
        assert_eq!(instr.play_duration(), 5.0);
    }

    #[test]
    fn instruction_validation_rejects_bad_ranges() {
        assert!(TrimInstruction { start: 1.0, end: 1.0, loop_count: 1 }.validate(5.0).is_err());
        assert!(TrimInstruction { start: -0.1, end: 2.0, loop_count: 1 }.validate(5.0).is_err());
        assert!(TrimInstruction { start: 0.0, end: 5.1, loop_count: 1 }.validate(5.0).is_err());
        assert!(TrimInstruction { start: 0.5, end: 4.5, loop_count: 2 }.validate(5.0).is_ok());
    }

    #[test]
    fn plan_duration_sums_loops() {
        let plan = vec![
            TrimInstruction { start: 0.0, end: 4.0, loop_count: 2 },
            TrimInstruction { start: 1.0, end: 3.5, loop_count: 1 },
        ];
        assert!((trim_plan_duration(&plan) - 10.5).abs() < 1e-9);
    }
}
