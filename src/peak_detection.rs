use log::trace;
use serde::Serialize;

/// Thresholds applied when picking candidate events out of a probability curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakDetectionParams {
    pub min_height: f32,
    pub min_prominence: f32,
    /// Minimum horizontal distance between neighbouring peaks, in samples
    pub min_distance: f32,
}

impl Default for PeakDetectionParams {
    fn default() -> Self {
        Self {
            min_height: 0.05,
            min_prominence: 0.04,
            min_distance: 40.0,
        }
    }
}

/// Anything that turns a per-sample probability curve into candidate event
/// indices. Boundary samples are never expected to be reported.
pub trait PeakFinder {
    fn find_peaks(&self, curve: &[f32]) -> Vec<usize>;
}

impl<F> PeakFinder for F
where
    F: Fn(&[f32]) -> Vec<usize>,
{
    fn find_peaks(&self, curve: &[f32]) -> Vec<usize> {
        self(curve)
    }
}

/// Peak picking by height, distance and prominence, in that order, matching
/// scipy's `find_peaks`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProminencePeakFinder {
    pub params: PeakDetectionParams,
}

impl ProminencePeakFinder {
    pub fn new(params: PeakDetectionParams) -> Self {
        Self { params }
    }
}

impl PeakFinder for ProminencePeakFinder {
    fn find_peaks(&self, curve: &[f32]) -> Vec<usize> {
        let mut peaks = local_maxima(curve);
        let found = peaks.len();

        peaks.retain(|&p| curve[p] >= self.params.min_height);
        let peaks = select_by_distance(curve, &peaks, self.params.min_distance);
        let prominences = peak_prominences(curve, &peaks);
        let peaks: Vec<usize> = peaks
            .into_iter()
            .zip(prominences)
            .filter(|(_, prominence)| *prominence >= self.params.min_prominence)
            .map(|(p, _)| p)
            .collect();

        trace!("{} local maxima, {} peaks kept", found, peaks.len());
        peaks
    }
}

/// All local maxima, excluding the first and last sample. A flat peak is
/// reported at the middle of its plateau (rounded down).
pub fn local_maxima(curve: &[f32]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if curve.len() < 3 {
        return maxima;
    }
    let i_max = curve.len() - 1;
    let mut i = 1;

    while i < i_max {
        if curve[i - 1] < curve[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && curve[i_ahead] == curve[i] {
                i_ahead += 1;
            }
            if curve[i_ahead] < curve[i] {
                let left_edge = i;
                let right_edge = i_ahead - 1;
                maxima.push((left_edge + right_edge) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// Removes peaks closer than `distance` samples to a higher peak. Taller peaks
/// are handled first; among equally tall peaks the later one wins.
fn select_by_distance(curve: &[f32], peaks: &[usize], distance: f32) -> Vec<usize> {
    if peaks.len() < 2 || distance <= 1.0 {
        return peaks.to_vec();
    }
    let distance = distance.ceil() as usize;
    let mut keep = vec![true; peaks.len()];

    let mut by_priority: Vec<usize> = (0..peaks.len()).collect();
    by_priority.sort_by(|&a, &b| curve[peaks[a]].total_cmp(&curve[peaks[b]]));

    for &j in by_priority.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(&p, _)| p)
        .collect()
}

/// Vertical distance between each peak and the higher of the two lowest
/// points reachable on either side without climbing above the peak.
pub fn peak_prominences(curve: &[f32], peaks: &[usize]) -> Vec<f32> {
    peaks
        .iter()
        .map(|&peak| {
            let height = curve[peak];

            let mut left_min = height;
            for &value in curve[..=peak].iter().rev() {
                if value > height {
                    break;
                }
                left_min = left_min.min(value);
            }

            let mut right_min = height;
            for &value in &curve[peak..] {
                if value > height {
                    break;
                }
                right_min = right_min.min(value);
            }

            height - left_min.max(right_min)
        })
        .collect()
}
