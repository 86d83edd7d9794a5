use log::{debug, trace};

/// Pointers between annotated and predicted events plus the timing error of
/// every pair that survived matching.
///
/// `a2b[i]` is the index into `predicted` matched to `annotated[i]`, `b2a[j]`
/// the index into `annotated` matched to `predicted[j]`. `None` marks an
/// unmatched event (a miss on the annotated side, an extra on the predicted side).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Correspondence {
    pub a2b: Vec<Option<usize>>,
    pub b2a: Vec<Option<usize>>,
    /// predicted - annotated, in samples, in predicted-event order
    pub time_diff: Vec<i64>,
}

impl Correspondence {
    /// Matched (annotated, predicted) index pairs in predicted-event order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        matched_pairs(&self.b2a)
    }

    pub fn matched_count(&self) -> usize {
        self.b2a.iter().filter(|p| p.is_some()).count()
    }
}

/// (annotated, predicted) index pairs read off the predicted-side pointers.
fn matched_pairs(b2a: &[Option<usize>]) -> Vec<(usize, usize)> {
    b2a.iter()
        .enumerate()
        .filter_map(|(j, &i)| i.map(|i| (i, j)))
        .collect()
}

/// Index of the candidate closest to `target`. The first minimum wins on ties.
fn nearest(target: usize, candidates: &[usize]) -> usize {
    let mut best = 0;
    let mut best_dist = usize::MAX;
    for (idx, &c) in candidates.iter().enumerate() {
        let dist = target.abs_diff(c);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

/// Where several sources point to the same target, keep only the source that
/// the target itself points back to.
fn resolve_many_to_one(forward: &mut [Option<usize>], backward: &[Option<usize>]) {
    let mut targets: Vec<usize> = forward.iter().flatten().copied().collect();
    targets.sort_unstable();
    targets.dedup();

    for target in targets {
        let sources: Vec<usize> = forward
            .iter()
            .enumerate()
            .filter(|(_, p)| **p == Some(target))
            .map(|(idx, _)| idx)
            .collect();
        if sources.len() < 2 {
            continue;
        }
        for source in sources {
            if backward[target] != Some(source) {
                trace!("dropping ambiguous pointer {} -> {}", source, target);
                forward[source] = None;
            }
        }
    }
}

/// Drop every forward pointer whose target does not point back at it.
fn drop_unreciprocated(forward: &mut [Option<usize>], backward: &[Option<usize>]) {
    for (source, pointer) in forward.iter_mut().enumerate() {
        if let Some(target) = *pointer {
            if backward[target] != Some(source) {
                *pointer = None;
            }
        }
    }
}

fn timing_differences(annotated: &[usize], predicted: &[usize], b2a: &[Option<usize>]) -> Vec<i64> {
    b2a.iter()
        .enumerate()
        .filter_map(|(j, &i)| i.map(|i| predicted[j] as i64 - annotated[i] as i64))
        .collect()
}

/// Compares the timings of annotated (true) and predicted gait events.
///
/// Every event is first paired with its nearest neighbour in the other set.
/// Ambiguous many-to-one pointers are resolved in favour of the pair the
/// shared target agrees with, unreciprocated pointers are dropped (forward,
/// backward, then forward again), and finally any pair further apart than
/// `threshold` samples is split.
pub fn compare_events(annotated: &[usize], predicted: &[usize], threshold: usize) -> Correspondence {
    match (annotated.is_empty(), predicted.is_empty()) {
        (true, true) => {
            debug!("No gait events annotated, no gait events detected");
            return Correspondence::default();
        }
        (false, true) => {
            debug!("{} gait events annotated, but none were detected", annotated.len());
            return Correspondence {
                a2b: vec![None; annotated.len()],
                ..Default::default()
            };
        }
        (true, false) => {
            debug!("No gait events annotated, but {} events were detected", predicted.len());
            return Correspondence {
                b2a: vec![None; predicted.len()],
                ..Default::default()
            };
        }
        (false, false) => {}
    }

    let mut a2b: Vec<Option<usize>> = annotated
        .iter()
        .map(|&a| Some(nearest(a, predicted)))
        .collect();
    let mut b2a: Vec<Option<usize>> = predicted
        .iter()
        .map(|&p| Some(nearest(p, annotated)))
        .collect();

    resolve_many_to_one(&mut a2b, &b2a);
    resolve_many_to_one(&mut b2a, &a2b);

    drop_unreciprocated(&mut a2b, &b2a);
    drop_unreciprocated(&mut b2a, &a2b);
    // second round on the annotated side only
    drop_unreciprocated(&mut a2b, &b2a);

    let provisional = timing_differences(annotated, predicted, &b2a);
    let pairs = matched_pairs(&b2a);
    for (&(i, j), diff) in pairs.iter().zip(provisional.iter()) {
        if diff.unsigned_abs() > threshold as u64 {
            trace!(
                "rejecting pair {} <-> {}: {} samples apart (threshold {})",
                annotated[i],
                predicted[j],
                diff,
                threshold
            );
            a2b[i] = None;
            b2a[j] = None;
        }
    }

    let time_diff = timing_differences(annotated, predicted, &b2a);
    debug!(
        "matched {} of {} annotated / {} predicted events",
        time_diff.len(),
        annotated.len(),
        predicted.len()
    );

    Correspondence { a2b, b2a, time_diff }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(c: &Correspondence, annotated: &[usize], predicted: &[usize], thr: usize) {
        for (i, p) in c.a2b.iter().enumerate() {
            if let Some(j) = p {
                assert_eq!(c.b2a[*j], Some(i));
                assert!(annotated[i].abs_diff(predicted[*j]) <= thr);
            }
        }
        for (j, p) in c.b2a.iter().enumerate() {
            if let Some(i) = p {
                assert_eq!(c.a2b[*i], Some(j));
            }
        }
        let missed = c.a2b.iter().filter(|p| p.is_none()).count();
        let extra = c.b2a.iter().filter(|p| p.is_none()).count();
        assert_eq!(missed + c.matched_count(), annotated.len());
        assert_eq!(extra + c.matched_count(), predicted.len());
        assert_eq!(c.time_diff.len(), c.matched_count());
    }

    #[test]
    fn test_both_empty() {
        let c = compare_events(&[], &[], 20);
        assert!(c.a2b.is_empty());
        assert!(c.b2a.is_empty());
        assert!(c.time_diff.is_empty());
    }

    #[test]
    fn test_nothing_detected() {
        let c = compare_events(&[10, 90], &[], 20);
        assert_eq!(c.a2b, vec![None, None]);
        assert!(c.b2a.is_empty());
        assert!(c.time_diff.is_empty());
    }

    #[test]
    fn test_nothing_annotated() {
        let c = compare_events(&[], &[3, 40, 120], 20);
        assert!(c.a2b.is_empty());
        assert_eq!(c.b2a, vec![None, None, None]);
        assert!(c.time_diff.is_empty());
    }

    #[test]
    fn test_one_match_one_miss_one_extra() {
        let annotated = [50, 150];
        let predicted = [52, 300];
        let c = compare_events(&annotated, &predicted, 20);
        assert_eq!(c.a2b, vec![Some(0), None]);
        assert_eq!(c.b2a, vec![Some(0), None]);
        assert_eq!(c.time_diff, vec![2]);
        assert_consistent(&c, &annotated, &predicted, 20);
    }

    #[test]
    fn test_ambiguous_candidate_goes_to_closest() {
        let annotated = [100, 105];
        let predicted = [102];
        let c = compare_events(&annotated, &predicted, 20);
        assert_eq!(c.a2b, vec![Some(0), None]);
        assert_eq!(c.b2a, vec![Some(0)]);
        assert_eq!(c.time_diff, vec![2]);
    }

    #[test]
    fn test_threshold_splits_pair() {
        let annotated = [10, 100];
        let predicted = [12, 130];
        let c = compare_events(&annotated, &predicted, 20);
        assert_eq!(c.a2b, vec![Some(0), None]);
        assert_eq!(c.b2a, vec![Some(0), None]);
        assert_eq!(c.time_diff, vec![2]);

        // exactly on the threshold still matches
        let c = compare_events(&[100], &[120], 20);
        assert_eq!(c.time_diff, vec![20]);
        let c = compare_events(&[100], &[121], 20);
        assert_eq!(c.a2b, vec![None]);
        assert_eq!(c.b2a, vec![None]);
        assert!(c.time_diff.is_empty());
    }

    #[test]
    fn test_negative_time_difference() {
        let c = compare_events(&[60, 140], &[55, 150], 20);
        assert_eq!(c.time_diff, vec![-5, 10]);
        assert_eq!(c.pairs(), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_chained_nearest_neighbours_resolve_to_reciprocal_pair() {
        // 9 -> 15 while 15 -> 20, and 20/23 both want 22
        let annotated = [9, 20, 23];
        let predicted = [15, 22];
        let c = compare_events(&annotated, &predicted, 50);
        assert_eq!(c.a2b, vec![None, None, Some(1)]);
        assert_eq!(c.b2a, vec![None, Some(2)]);
        assert_eq!(c.time_diff, vec![-1]);
        assert_consistent(&c, &annotated, &predicted, 50);
    }

    #[test]
    fn test_tie_prefers_first_candidate() {
        // 10 is equidistant from 5 and 15
        let c = compare_events(&[10], &[5, 15], 20);
        assert_eq!(c.a2b, vec![Some(0)]);
        assert_eq!(c.b2a, vec![Some(0), None]);
        assert_eq!(c.time_diff, vec![-5]);
    }

    #[test]
    fn test_dense_sequence_properties() {
        let annotated = [3, 41, 80, 118, 160, 197];
        let predicted = [0, 5, 38, 39, 90, 121, 150, 166, 199];
        let c = compare_events(&annotated, &predicted, 20);
        assert_consistent(&c, &annotated, &predicted, 20);
        assert_eq!(c, compare_events(&annotated, &predicted, 20));
    }

    #[test]
    fn test_pairs_follow_threshold_split() {
        let annotated = [10, 100, 200];
        let predicted = [12, 130, 195];
        let c = compare_events(&annotated, &predicted, 20);
        assert_eq!(c.pairs(), vec![(0, 0), (2, 2)]);
        assert_eq!(matched_pairs(&c.b2a), c.pairs());
        assert_eq!(c.time_diff, vec![2, -5]);
    }

    #[test]
    fn test_zero_threshold_only_keeps_exact_hits() {
        let annotated = [20, 60, 100];
        let predicted = [20, 61, 100];
        let c = compare_events(&annotated, &predicted, 0);
        assert_eq!(c.a2b, vec![Some(0), None, Some(2)]);
        assert_eq!(c.time_diff, vec![0, 0]);
    }
}
