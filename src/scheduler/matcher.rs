use tracing::debug;

use crate::error::ScheduleError;

use super::types::{trim_plan_duration, Clip, TargetSpec, TrimInstruction};
use super::DURATION_EPSILON;

/// Trim-and-loop planner for small pools of whole clips.
///
/// Given a handful of clips (typically 2-6) and an acceptable duration
/// interval, computes one [`TrimInstruction`] per clip, in input order, so
/// that the concatenated plays land inside the interval:
///
/// - already acceptable: identity instructions, nothing cut or repeated
/// - too short: a uniform base number of full loops for every clip, then
///   extra loops on the longest clips until the total closes, with at most
///   one clip absorbing a final partial play
/// - too long: a proportional symmetric trim of every clip, never looped
pub struct DurationMatcher {
    target: TargetSpec,
}

impl DurationMatcher {
    pub fn new(target: TargetSpec) -> Result<Self, ScheduleError> {
        target.validate()?;
        Ok(Self { target })
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    /// Compute the trim-and-loop plan for `clips`.
    pub fn compute_plan(&self, clips: &[Clip]) -> Result<Vec<TrimInstruction>, ScheduleError> {
        if clips.is_empty() {
            return Err(ScheduleError::InsufficientSource { needed: 1, available: 0 });
        }
        for clip in clips {
            if !(clip.duration.is_finite() && clip.duration > 0.0) {
                return Err(ScheduleError::InvalidRange {
                    start: 0.0,
                    end: clip.duration,
                    limit: clip.duration,
                });
            }
        }

        let total: f64 = clips.iter().map(|c| c.duration).sum();
        let (low, high) = self.target.bounds();
        debug!(total, low, high, "planning trim instructions for {} clips", clips.len());

        let plan = if self.target.contains(total) {
            debug!("total already within the acceptable interval");
            clips.iter().map(|c| TrimInstruction::identity(c.duration)).collect()
        } else if total < low {
            self.extend_with_loops(clips, total)
        } else {
            self.trim_proportionally(clips, total)
        };

        let achieved = trim_plan_duration(&plan);
        if !self.acceptable(achieved) {
            return Err(ScheduleError::DurationUnreachable { achieved, min: low, max: high });
        }
        for (clip, instruction) in clips.iter().zip(&plan) {
            instruction.validate(clip.duration)?;
        }

        Ok(plan)
    }

    /// Recompute a plan's assembled duration and check it against the target.
    ///
    /// Pure companion to [`compute_plan`](Self::compute_plan); usable on any
    /// plan regardless of how it was produced.
    pub fn validate_plan(&self, clips: &[Clip], plan: &[TrimInstruction]) -> bool {
        if clips.len() != plan.len() {
            return false;
        }
        if clips
            .iter()
            .zip(plan)
            .any(|(clip, instruction)| instruction.validate(clip.duration).is_err())
        {
            return false;
        }
        self.acceptable(trim_plan_duration(plan))
    }

    fn acceptable(&self, total: f64) -> bool {
        let (low, high) = self.target.bounds();
        total >= low - DURATION_EPSILON && total <= high + DURATION_EPSILON
    }

    /// Too-short branch: every clip plays a uniform base number of full
    /// loops, then the longest clips absorb extra plays until the total
    /// closes on the interval.
    fn extend_with_loops(&self, clips: &[Clip], total: f64) -> Vec<TrimInstruction> {
        let anchor = self.target.loop_anchor();
        let (_, high) = self.target.bounds();

        let base_loops = (anchor / total).floor().max(1.0) as u32;
        let mut current = total * base_loops as f64;
        debug!(base_loops, current, "base loops assigned, {:.2}s still needed", anchor - current);

        let mut plan: Vec<TrimInstruction> = clips
            .iter()
            .map(|c| TrimInstruction { start: 0.0, end: c.duration, loop_count: base_loops })
            .collect();

        // Longest first; equal durations keep their input order.
        let mut order: Vec<usize> = (0..clips.len()).collect();
        order.sort_by(|&a, &b| {
            clips[b]
                .duration
                .partial_cmp(&clips[a].duration)
                .expect("finite clip durations")
        });

        for idx in order {
            if self.acceptable(current) {
                break;
            }

            let duration = clips[idx].duration;
            if current + duration <= high + DURATION_EPSILON {
                // One more full play fits under the window maximum.
                plan[idx].loop_count += 1;
                current += duration;
                debug!(clip = idx, duration, "added full loop, running total {:.2}s", current);
            } else {
                // Close the remaining deficit with one partial play. The
                // instruction contract repeats a single extract, so the
                // shortfall is spread evenly across all of this clip's
                // repetitions instead of tacked on as an odd final play.
                let deficit = (anchor - current).min(duration);
                let loops = plan[idx].loop_count as f64;
                plan[idx].end = (loops * duration + deficit) / (loops + 1.0);
                plan[idx].loop_count += 1;
                current += deficit;
                debug!(
                    clip = idx,
                    deficit,
                    extract = plan[idx].end,
                    "added partial play, running total {:.2}s",
                    current
                );
            }
        }

        plan
    }

    /// Too-long branch: shave the excess off proportionally, taking equal
    /// amounts from the head and tail of every clip. Over-long inputs are
    /// only trimmed, never looped.
    fn trim_proportionally(&self, clips: &[Clip], total: f64) -> Vec<TrimInstruction> {
        let excess = total - self.target.trim_anchor();
        debug!(excess, "total too long, trimming proportionally");

        clips
            .iter()
            .map(|clip| {
                let trim = excess * (clip.duration / total);
                let per_side = trim / 2.0;
                TrimInstruction {
                    start: per_side,
                    end: clip.duration - per_side,
                    loop_count: 1,
                }
            })
            .collect()
    }
}
