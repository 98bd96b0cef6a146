use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::error::ScheduleError;

use super::intervals::{free_ranges, TimeRange};
use super::types::{segment_plan_duration, Clip, Segment};
use super::DURATION_EPSILON;

/// Tuning knobs for fast-cut composition.
#[derive(Debug, Clone, Copy)]
pub struct ComposerParams {
    /// Shortest randomized extract length in seconds
    pub segment_min: f64,

    /// Longest randomized extract length in seconds
    pub segment_max: f64,

    /// Exclusion buffer around placed extracts, per side, in seconds
    pub spacing_buffer: f64,

    /// Probability that a segment is flagged for double-rate playback
    pub speed_up_probability: f64,

    /// Hard cap on clip re-rolls and failed placements per plan
    pub max_attempts: u32,
}

impl Default for ComposerParams {
    fn default() -> Self {
        Self {
            segment_min: 1.0,
            segment_max: 1.5,
            spacing_buffer: 2.0,
            speed_up_probability: 0.3,
            max_attempts: 64,
        }
    }
}

/// Fast-cut planner for large clip pools.
///
/// Builds a timeline of many short extracts drawn from a shuffled subset of
/// the pool, summing exactly to the target duration. Placement respects a
/// spacing buffer around every prior extract of the same clip, so repeats of
/// near-identical material never land close together, and no clip ever
/// appears in two consecutive segments.
///
/// The random source is injected; a seeded rng reproduces the exact plan.
pub struct SegmentComposer {
    params: ComposerParams,
}

impl SegmentComposer {
    pub fn new() -> Self {
        Self { params: ComposerParams::default() }
    }

    pub fn with_params(params: ComposerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ComposerParams {
        &self.params
    }

    /// Compose a fast-cut plan over `pool` summing exactly to `target`
    /// seconds, sourcing at least `min_distinct` different clips.
    pub fn compute_plan<R: Rng>(
        &self,
        pool: &[Clip],
        target: f64,
        min_distinct: usize,
        rng: &mut R,
    ) -> Result<Vec<Segment>, ScheduleError> {
        // Alternation needs at least two clips even if the caller asked for less.
        let active_len = min_distinct.max(2);
        if pool.len() < active_len {
            return Err(ScheduleError::InsufficientSource {
                needed: active_len,
                available: pool.len(),
            });
        }

        let mut active: Vec<usize> = (0..pool.len()).collect();
        active.shuffle(rng);
        active.truncate(active_len);
        debug!(target, active = active_len, "composing fast-cut plan from {} candidates", pool.len());

        // Indices of active clips not yet sourced; every clip is drawn once
        // from here before any clip repeats, so the diversity floor is met
        // by construction.
        let mut unused = active.clone();

        let mut segments: Vec<Segment> = Vec::new();
        let mut accumulated = 0.0;
        let mut last_clip: Option<usize> = None;
        let mut attempts: u32 = 0;

        while target - accumulated > DURATION_EPSILON {
            let remaining = target - accumulated;
            let segment_duration = if remaining <= self.params.segment_min {
                remaining
            } else {
                let cap = self.params.segment_max.min(remaining);
                rng.gen_range(self.params.segment_min..=cap)
            };

            let clip_idx = if unused.is_empty() {
                let idx = *active.choose(rng).expect("active set is non-empty");
                if last_clip == Some(idx) {
                    attempts += 1;
                    if attempts >= self.params.max_attempts {
                        return Err(ScheduleError::AllocationExhausted { attempts });
                    }
                    continue;
                }
                idx
            } else {
                *unused.choose(rng).expect("unused set is non-empty")
            };

            match self.place_segment(&pool[clip_idx], clip_idx, segment_duration, &segments, rng) {
                Some(segment) => {
                    trace!(
                        clip = clip_idx,
                        start = segment.start,
                        duration = segment.duration,
                        speed_up = segment.speed_up,
                        "placed segment"
                    );
                    accumulated += segment.duration;
                    segments.push(segment);
                    last_clip = Some(clip_idx);
                    unused.retain(|&i| i != clip_idx);
                }
                None => {
                    attempts += 1;
                    if attempts >= self.params.max_attempts {
                        return Err(ScheduleError::AllocationExhausted { attempts });
                    }
                }
            }
        }

        // The forced-exact closer works from `remaining` at draw time; if a
        // stale value ever let the sum creep past the target, pull the last
        // segment back so the plan closes exactly.
        let overage = accumulated - target;
        if overage > 0.0 {
            if let Some(last) = segments.last_mut() {
                last.end -= overage;
                last.duration -= overage;
            }
        }

        let distinct = self.distinct_clips(&segments);
        if distinct < min_distinct {
            return Err(ScheduleError::InsufficientSource { needed: min_distinct, available: distinct });
        }

        debug!(
            segments = segments.len(),
            distinct,
            total = segment_plan_duration(&segments),
            "fast-cut plan complete"
        );
        Ok(segments)
    }

    /// Check a plan against the composer's postconditions: exact sum,
    /// diversity floor, per-clip spacing, valid ranges, no consecutive
    /// repeats. Pure; usable on any plan regardless of origin.
    pub fn validate_plan(
        &self,
        pool: &[Clip],
        plan: &[Segment],
        target: f64,
        min_distinct: usize,
    ) -> bool {
        if (segment_plan_duration(plan) - target).abs() > DURATION_EPSILON {
            return false;
        }
        if self.distinct_clips(plan) < min_distinct {
            return false;
        }
        for pair in plan.windows(2) {
            if pair[0].clip == pair[1].clip {
                return false;
            }
        }
        for (i, segment) in plan.iter().enumerate() {
            let Some(clip) = pool.get(segment.clip) else {
                return false;
            };
            if segment.validate(clip.duration).is_err() {
                return false;
            }
            for other in &plan[i + 1..] {
                if other.clip != segment.clip {
                    continue;
                }
                let gap = (other.start - segment.end).max(segment.start - other.end);
                if gap < self.params.spacing_buffer - DURATION_EPSILON {
                    return false;
                }
            }
        }
        true
    }

    /// Try to place one extract of `duration` seconds on `clip`, avoiding the
    /// buffered neighborhoods of everything already taken from it.
    fn place_segment<R: Rng>(
        &self,
        clip: &Clip,
        clip_idx: usize,
        duration: f64,
        placed: &[Segment],
        rng: &mut R,
    ) -> Option<Segment> {
        if clip.duration + DURATION_EPSILON < duration {
            return None;
        }

        let forbidden: Vec<TimeRange> = placed
            .iter()
            .filter(|s| s.clip == clip_idx)
            .map(|s| {
                TimeRange::new(
                    s.start - self.params.spacing_buffer,
                    s.end + self.params.spacing_buffer,
                )
            })
            .collect();

        let free = free_ranges(clip.duration, &forbidden);
        let candidates: Vec<&TimeRange> = free
            .iter()
            .filter(|r| r.len() + DURATION_EPSILON >= duration)
            .collect();

        // Intervals are weighted uniformly by count, not by length.
        let interval = candidates.choose(rng)?;

        let latest_start = interval.end - duration;
        let start = if latest_start > interval.start {
            rng.gen_range(interval.start..=latest_start)
        } else {
            interval.start
        };

        Some(Segment {
            clip: clip_idx,
            start,
            end: start + duration,
            duration,
            speed_up: rng.gen_bool(self.params.speed_up_probability),
        })
    }

    fn distinct_clips(&self, plan: &[Segment]) -> usize {
        let mut seen: Vec<usize> = plan.iter().map(|s| s.clip).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

impl Default for SegmentComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn pool(count: usize, duration: f64) -> Vec<Clip> {
        (0..count)
            .map(|i| Clip::new(format!("clip-{i:02}"), duration))
            .collect()
    }

    #[test]
    fn fast_cut_plan_covers_the_whole_pool_exactly() {
        let composer = SegmentComposer::new();
        let clips = pool(20, 10.0);
        let mut rng = SmallRng::seed_from_u64(7);

        let plan = composer.compute_plan(&clips, 30.0, 20, &mut rng).unwrap();

        assert!(
            (20..=30).contains(&plan.len()),
            "expected 20-30 segments, got {}",
            plan.len()
        );
        assert!((segment_plan_duration(&plan) - 30.0).abs() < DURATION_EPSILON);
        assert!(composer.validate_plan(&clips, &plan, 30.0, 20));
    }

    #[test]
    fn segment_lengths_stay_in_the_randomized_band() {
        let composer = SegmentComposer::new();
        let clips = pool(20, 10.0);
        let mut rng = SmallRng::seed_from_u64(11);

        let plan = composer.compute_plan(&clips, 30.0, 20, &mut rng).unwrap();

        // Every segment but the forced-exact closer sits in [1.0, 1.5].
        for segment in &plan[..plan.len() - 1] {
            assert!(
                segment.duration >= 1.0 - DURATION_EPSILON && segment.duration <= 1.5 + DURATION_EPSILON,
                "segment duration {} outside band",
                segment.duration
            );
        }
        assert!(plan.last().unwrap().duration > 0.0);
    }

    #[test]
    fn no_two_consecutive_segments_share_a_clip() {
        let composer = SegmentComposer::new();
        let clips = pool(8, 30.0);
        let mut rng = SmallRng::seed_from_u64(23);

        let plan = composer.compute_plan(&clips, 20.0, 8, &mut rng).unwrap();

        for pair in plan.windows(2) {
            assert_ne!(pair[0].clip, pair[1].clip);
        }
    }

    #[test]
    fn same_clip_extracts_keep_their_distance() {
        let composer = SegmentComposer::new();
        let clips = pool(4, 60.0);
        let mut rng = SmallRng::seed_from_u64(42);

        let plan = composer.compute_plan(&clips, 25.0, 4, &mut rng).unwrap();

        for (i, a) in plan.iter().enumerate() {
            for b in &plan[i + 1..] {
                if a.clip != b.clip {
                    continue;
                }
                let gap = (b.start - a.end).max(a.start - b.end);
                assert!(
                    gap >= 2.0 - DURATION_EPSILON,
                    "extracts on clip {} only {:.3}s apart",
                    a.clip,
                    gap
                );
            }
        }
    }

    #[test]
    fn seeded_rng_reproduces_the_exact_plan() {
        let composer = SegmentComposer::new();
        let clips = pool(20, 10.0);

        let mut rng_a = SmallRng::seed_from_u64(99);
        let mut rng_b = SmallRng::seed_from_u64(99);

        let plan_a = composer.compute_plan(&clips, 30.0, 20, &mut rng_a).unwrap();
        let plan_b = composer.compute_plan(&clips, 30.0, 20, &mut rng_b).unwrap();

        assert_eq!(plan_a, plan_b);
    }

    #[test]
    fn speed_up_never_changes_duration_accounting() {
        let composer = SegmentComposer::with_params(ComposerParams {
            speed_up_probability: 1.0,
            ..ComposerParams::default()
        });
        let clips = pool(10, 20.0);
        let mut rng = SmallRng::seed_from_u64(5);

        let plan = composer.compute_plan(&clips, 15.0, 10, &mut rng).unwrap();

        assert!(plan.iter().all(|s| s.speed_up));
        // Source-time bookkeeping is unchanged by playback rate.
        assert!((segment_plan_duration(&plan) - 15.0).abs() < DURATION_EPSILON);
        for segment in &plan {
            assert!((segment.duration - (segment.end - segment.start)).abs() < DURATION_EPSILON);
        }
    }

    #[test]
    fn small_pool_is_rejected_up_front() {
        let composer = SegmentComposer::new();
        let clips = pool(5, 10.0);
        let mut rng = SmallRng::seed_from_u64(1);

        assert_eq!(
            composer.compute_plan(&clips, 30.0, 10, &mut rng),
            Err(ScheduleError::InsufficientSource { needed: 10, available: 5 })
        );
    }

    #[test]
    fn saturated_pool_exhausts_the_retry_budget() {
        // Two 3s clips: one extract each saturates them (the 2s buffer
        // blankets the whole clip), far short of a 30s target.
        let composer = SegmentComposer::new();
        let clips = pool(2, 3.0);
        let mut rng = SmallRng::seed_from_u64(3);

        let result = composer.compute_plan(&clips, 30.0, 2, &mut rng);

        assert!(matches!(result, Err(ScheduleError::AllocationExhausted { .. })));
    }

    #[test]
    fn short_target_still_closes_exactly() {
        let composer = SegmentComposer::new();
        let clips = pool(3, 10.0);
        let mut rng = SmallRng::seed_from_u64(17);

        let plan = composer.compute_plan(&clips, 5.0, 3, &mut rng).unwrap();

        assert!((segment_plan_duration(&plan) - 5.0).abs() < DURATION_EPSILON);
        assert!(composer.validate_plan(&clips, &plan, 5.0, 3));
    }

    #[test]
    fn validate_plan_rejects_broken_invariants() {
        let composer = SegmentComposer::new();
        let clips = pool(20, 10.0);
        let mut rng = SmallRng::seed_from_u64(8);
        let plan = composer.compute_plan(&clips, 30.0, 20, &mut rng).unwrap();

        // Wrong sum
        assert!(!composer.validate_plan(&clips, &plan, 31.0, 20));
        // Diversity floor above what the plan carries
        assert!(!composer.validate_plan(&clips, &plan, 30.0, plan.len() + 1));

        // Consecutive repeat
        let mut broken = plan.clone();
        let first = broken[0].clip;
        broken[1].clip = first;
        assert!(!composer.validate_plan(&clips, &broken, 30.0, 2));
    }
}
