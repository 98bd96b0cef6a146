//! Random candidate selection.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Result, SourceError};

/// Randomly select between `min_count` and `max_count` clips from the
/// discovered files, using the injected random source.
///
/// The selection count itself is drawn uniformly, capped by how many files
/// exist. Order within the selection is random too; the scheduler decides
/// the final timeline order.
pub fn select_candidates<R: Rng>(
    files: &[PathBuf],
    min_count: usize,
    max_count: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(SourceError::SelectionFailed { reason: "no video files provided".to_string() }.into());
    }
    if min_count > max_count {
        return Err(SourceError::SelectionFailed {
            reason: format!("min_count ({min_count}) cannot be greater than max_count ({max_count})"),
        }
        .into());
    }
    if files.len() < min_count {
        return Err(SourceError::SelectionFailed {
            reason: format!("need at least {min_count} files, but only {} provided", files.len()),
        }
        .into());
    }

    let upper = max_count.min(files.len());
    let count = rng.gen_range(min_count..=upper);
    let selected: Vec<PathBuf> = files.choose_multiple(rng, count).cloned().collect();

    debug!(available = files.len(), selected = selected.len(), "selected candidate clips");
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;

    fn files(count: usize) -> Vec<PathBuf> {
        (0..count).map(|i| PathBuf::from(format!("clip_{i:02}.mp4"))).collect()
    }

    #[test]
    fn selection_count_respects_the_bounds() {
        let pool = files(10);
        let mut rng = SmallRng::seed_from_u64(1);

        for _ in 0..50 {
            let selected = select_candidates(&pool, 2, 6, &mut rng).unwrap();
            assert!((2..=6).contains(&selected.len()));
        }
    }

    #[test]
    fn selection_never_repeats_a_file() {
        let pool = files(6);
        let mut rng = SmallRng::seed_from_u64(2);

        for _ in 0..50 {
            let mut selected = select_candidates(&pool, 2, 6, &mut rng).unwrap();
            let before = selected.len();
            selected.sort();
            selected.dedup();
            assert_eq!(selected.len(), before);
        }
    }

    #[test]
    fn max_count_is_capped_by_pool_size() {
        let pool = files(3);
        let mut rng = SmallRng::seed_from_u64(3);

        let selected = select_candidates(&pool, 2, 6, &mut rng).unwrap();
        assert!(selected.len() <= 3);
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let pool = files(12);

        let mut rng_a = SmallRng::seed_from_u64(77);
        let mut rng_b = SmallRng::seed_from_u64(77);

        assert_eq!(
            select_candidates(&pool, 2, 6, &mut rng_a).unwrap(),
            select_candidates(&pool, 2, 6, &mut rng_b).unwrap()
        );
    }

    #[test]
    fn bad_inputs_are_rejected() {
        let mut rng = SmallRng::seed_from_u64(4);

        assert!(select_candidates(&[], 2, 6, &mut rng).is_err());
        assert!(select_candidates(&files(5), 6, 2, &mut rng).is_err());
        assert!(select_candidates(&files(1), 2, 6, &mut rng).is_err());
    }
}
