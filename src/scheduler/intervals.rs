//! Free-range allocation within a clip's timeline.
//!
//! Placed extracts carve buffered exclusion zones out of a clip; this module
//! answers "where is there still room?" as a plain interval-complement
//! computation, independent of any scheduling policy.

/// A half-open time range `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in seconds (zero for degenerate ranges).
    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Compute the free ranges left in `[0, domain_end]` once every range in
/// `forbidden` is excluded.
///
/// Forbidden ranges may arrive unsorted, overlapping, extending past the
/// domain, or degenerate (zero or negative length); they are clamped to the
/// domain and swept into a minimal disjoint cover first. The result is the
/// exact set complement, sorted ascending.
pub fn free_ranges(domain_end: f64, forbidden: &[TimeRange]) -> Vec<TimeRange> {
    if domain_end <= 0.0 {
        return Vec::new();
    }

    // Clamp to the domain and drop degenerates before merging.
    let mut blocked: Vec<TimeRange> = forbidden
        .iter()
        .map(|r| TimeRange::new(r.start.max(0.0), r.end.min(domain_end)))
        .filter(|r| !r.is_empty())
        .collect();

    if blocked.is_empty() {
        return vec![TimeRange::new(0.0, domain_end)];
    }

    blocked.sort_by(|a, b| a.start.partial_cmp(&b.start).expect("finite range bounds"));

    // Sweep left to right, merging overlapping or touching ranges.
    let mut merged: Vec<TimeRange> = Vec::with_capacity(blocked.len());
    for range in blocked {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    // The free ranges are the gaps between consecutive merged blocks.
    let mut free = Vec::with_capacity(merged.len() + 1);
    let mut cursor = 0.0;
    for block in &merged {
        if block.start > cursor {
            free.push(TimeRange::new(cursor, block.start));
        }
        cursor = cursor.max(block.end);
    }
    if cursor < domain_end {
        free.push(TimeRange::new(cursor, domain_end));
    }

    free
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(pairs: &[(f64, f64)]) -> Vec<TimeRange> {
        pairs.iter().map(|&(s, e)| TimeRange::new(s, e)).collect()
    }

    #[test]
    fn empty_forbidden_returns_whole_domain() {
        let free = free_ranges(10.0, &[]);
        assert_eq!(free, ranges(&[(0.0, 10.0)]));
    }

    #[test]
    fn single_block_in_the_middle() {
        let free = free_ranges(10.0, &ranges(&[(3.0, 5.0)]));
        assert_eq!(free, ranges(&[(0.0, 3.0), (5.0, 10.0)]));
    }

    #[test]
    fn blocks_at_both_edges() {
        let free = free_ranges(10.0, &ranges(&[(0.0, 2.0), (8.0, 10.0)]));
        assert_eq!(free, ranges(&[(2.0, 8.0)]));
    }

    #[test]
    fn unsorted_overlapping_input_is_merged() {
        let free = free_ranges(20.0, &ranges(&[(12.0, 15.0), (2.0, 6.0), (5.0, 9.0), (14.0, 16.0)]));
        assert_eq!(free, ranges(&[(0.0, 2.0), (9.0, 12.0), (16.0, 20.0)]));
    }

    #[test]
    fn adjacent_blocks_leave_no_gap() {
        let free = free_ranges(10.0, &ranges(&[(2.0, 5.0), (5.0, 7.0)]));
        assert_eq!(free, ranges(&[(0.0, 2.0), (7.0, 10.0)]));
    }

    #[test]
    fn zero_length_and_inverted_ranges_are_ignored() {
        let free = free_ranges(10.0, &ranges(&[(4.0, 4.0), (7.0, 6.0)]));
        assert_eq!(free, ranges(&[(0.0, 10.0)]));
    }

    #[test]
    fn ranges_beyond_the_domain_are_clamped() {
        let free = free_ranges(10.0, &ranges(&[(-3.0, 2.0), (8.0, 15.0)]));
        assert_eq!(free, ranges(&[(2.0, 8.0)]));
    }

    #[test]
    fn fully_blocked_domain_has_no_free_ranges() {
        let free = free_ranges(10.0, &ranges(&[(0.0, 6.0), (4.0, 10.0)]));
        assert!(free.is_empty());
    }

    #[test]
    fn degenerate_domain_is_empty() {
        assert!(free_ranges(0.0, &[]).is_empty());
        assert!(free_ranges(-1.0, &ranges(&[(0.0, 1.0)])).is_empty());
    }

    #[test]
    fn complement_is_exact() {
        // Free and merged-forbidden ranges must tile the domain exactly.
        let forbidden = ranges(&[(1.0, 3.0), (2.5, 4.0), (6.0, 6.0), (7.5, 9.0)]);
        let free = free_ranges(10.0, &forbidden);

        let free_total: f64 = free.iter().map(|r| r.len()).sum();
        // Merged cover: [1,4) and [7.5,9) -> 4.5s blocked of 10s.
        assert!((free_total - 5.5).abs() < 1e-9);

        for window in free.windows(2) {
            assert!(window[0].end < window[1].start, "free ranges must be disjoint and sorted");
        }
    }
}
