use serde::Serialize;

/// Outcome of matching one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowResult {
    pub missed: usize,
    pub extra: usize,
    /// Same length as the annotated events; the matched predicted index, or
    /// `None` for a missed event.
    pub aligned_predicted: Vec<Option<usize>>,
}

/// Derives the number of missed and extra events for a window, along with the
/// predicted events lined up against the annotated ones.
pub fn gait_event_metrics(
    annotated: &[usize],
    predicted: &[usize],
    a2b: &[Option<usize>],
    b2a: &[Option<usize>],
) -> WindowResult {
    debug_assert_eq!(annotated.len(), a2b.len());
    debug_assert_eq!(predicted.len(), b2a.len());

    let missed = a2b.iter().filter(|p| p.is_none()).count();
    let extra = b2a.iter().filter(|p| p.is_none()).count();
    let aligned_predicted = a2b.iter().map(|p| p.map(|j| predicted[j])).collect();

    WindowResult {
        missed,
        extra,
        aligned_predicted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_matching::compare_events;

    #[test]
    fn test_counts_and_alignment() {
        let annotated = [50, 150];
        let predicted = [52, 300];
        let c = compare_events(&annotated, &predicted, 20);
        let result = gait_event_metrics(&annotated, &predicted, &c.a2b, &c.b2a);

        assert_eq!(result.missed, 1);
        assert_eq!(result.extra, 1);
        assert_eq!(result.aligned_predicted, vec![Some(52), None]);
    }

    #[test]
    fn test_alignment_follows_annotated_order() {
        let annotated = [20, 80, 140];
        let predicted = [5, 78, 139, 190];
        let c = compare_events(&annotated, &predicted, 10);
        let result = gait_event_metrics(&annotated, &predicted, &c.a2b, &c.b2a);

        assert_eq!(result.aligned_predicted, vec![None, Some(78), Some(139)]);
        assert_eq!(result.missed, 1);
        assert_eq!(result.extra, 2);
    }

    #[test]
    fn test_empty_sides() {
        let result = gait_event_metrics(&[10, 20], &[], &[None, None], &[]);
        assert_eq!(result.missed, 2);
        assert_eq!(result.extra, 0);
        assert_eq!(result.aligned_predicted, vec![None, None]);

        let result = gait_event_metrics(&[], &[7], &[], &[None]);
        assert_eq!(result.missed, 0);
        assert_eq!(result.extra, 1);
        assert!(result.aligned_predicted.is_empty());
    }
}
