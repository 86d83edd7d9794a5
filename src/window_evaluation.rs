use crate::event_matching::compare_events;
use crate::metrics::{gait_event_metrics, WindowResult};
use crate::peak_detection::{PeakDetectionParams, PeakFinder, ProminencePeakFinder};
use log::{debug, trace};
use ndarray::{Array3, Axis};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Predictor returned shape {actual:?}, expected {expected:?}")]
    PredictionShape {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error(transparent)]
    Predictor(#[from] anyhow::Error),
}

/// Policy knobs for turning model output into matched events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationSettings {
    pub peaks: PeakDetectionParams,
    /// Largest allowed |predicted - annotated| for a match, in samples
    pub match_threshold: usize,
    /// Label value that marks an initial contact in the target curve
    pub event_marker: f32,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            peaks: PeakDetectionParams::default(),
            match_threshold: 20,
            event_marker: 1.0,
        }
    }
}

/// Everything gathered over the windows of one micro-walking bout.
///
/// Timestamps are one-based and relative to the first sample of the bout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoutEvaluation {
    pub total_extra: usize,
    pub total_missed: usize,
    pub total_ground_truth: usize,
    /// One entry per ground-truth event; `None` where it was missed
    pub predicted_timestamps: Vec<Option<usize>>,
    pub ground_truth_timestamps: Vec<usize>,
    pub timing_differences: Vec<i64>,
}

/// Running totals for one bout. Owned by the caller of the evaluator and fed
/// one window at a time, in window order. The first window fixes the window
/// length for the rest of the bout.
#[derive(Debug, Default)]
pub struct TrialAccumulator {
    totals: BoutEvaluation,
    windows_seen: usize,
    window_len: Option<usize>,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows_seen(&self) -> usize {
        self.windows_seen
    }

    pub fn window_len(&self) -> Option<usize> {
        self.window_len
    }

    /// Fails if a window of `window_len` samples cannot follow the windows
    /// absorbed so far.
    pub fn check_window_len(&self, window_len: usize) -> Result<(), EvaluationError> {
        match self.window_len {
            Some(expected) if expected != window_len => Err(EvaluationError::InvalidInput(format!(
                "window {} has {} samples, bout windows have {}",
                self.windows_seen, window_len, expected
            ))),
            _ => Ok(()),
        }
    }

    /// Folds the next window into the bout timeline.
    pub fn absorb(
        &mut self,
        window_len: usize,
        ground_truth: &[usize],
        result: &WindowResult,
        time_diff: &[i64],
    ) -> Result<(), EvaluationError> {
        self.check_window_len(window_len)?;
        let offset = self.windows_seen * window_len + 1;

        self.totals.total_missed += result.missed;
        self.totals.total_extra += result.extra;
        self.totals.total_ground_truth += ground_truth.len();
        self.totals.timing_differences.extend_from_slice(time_diff);
        self.totals
            .ground_truth_timestamps
            .extend(ground_truth.iter().map(|&t| t + offset));
        self.totals
            .predicted_timestamps
            .extend(result.aligned_predicted.iter().map(|p| p.map(|p| p + offset)));
        self.window_len = Some(window_len);
        self.windows_seen += 1;
        Ok(())
    }

    pub fn finish(self) -> BoutEvaluation {
        self.totals
    }
}

/// Runs peak picking, matching and metrics over consecutive windows of a bout.
pub struct WindowEvaluator<P: PeakFinder = ProminencePeakFinder> {
    peak_finder: P,
    settings: EvaluationSettings,
}

impl WindowEvaluator<ProminencePeakFinder> {
    pub fn new(settings: EvaluationSettings) -> Self {
        Self {
            peak_finder: ProminencePeakFinder::new(settings.peaks),
            settings,
        }
    }
}

impl Default for WindowEvaluator<ProminencePeakFinder> {
    fn default() -> Self {
        Self::new(EvaluationSettings::default())
    }
}

impl<P: PeakFinder> WindowEvaluator<P> {
    pub fn with_peak_finder(peak_finder: P, settings: EvaluationSettings) -> Self {
        Self {
            peak_finder,
            settings,
        }
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Candidate events in a probability curve. The peak finder never reports
    /// the first or last sample, so those are added whenever they clear the
    /// height threshold.
    pub fn predicted_events(&self, curve: &[f32]) -> Vec<usize> {
        let mut events = Vec::new();
        let Some((&first, rest)) = curve.split_first() else {
            return events;
        };
        let min_height = self.settings.peaks.min_height;

        if first >= min_height {
            events.push(0);
        }
        events.extend(self.peak_finder.find_peaks(curve));
        if !rest.is_empty() && curve[curve.len() - 1] >= min_height {
            events.push(curve.len() - 1);
        }
        events
    }

    /// Sample indices carrying the event marker.
    pub fn target_events(&self, labels: &[f32]) -> Vec<usize> {
        labels
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == self.settings.event_marker)
            .map(|(i, _)| i)
            .collect()
    }

    /// Matches one window and folds it into `acc`.
    pub fn evaluate_window(
        &self,
        acc: &mut TrialAccumulator,
        curve: &[f32],
        labels: &[f32],
    ) -> Result<WindowResult, EvaluationError> {
        if curve.len() != labels.len() {
            return Err(EvaluationError::InvalidInput(format!(
                "window {} has {} probabilities but {} labels",
                acc.windows_seen(),
                curve.len(),
                labels.len()
            )));
        }
        acc.check_window_len(curve.len())?;

        let predicted = self.predicted_events(curve);
        let ground_truth = self.target_events(labels);
        let correspondence = compare_events(&ground_truth, &predicted, self.settings.match_threshold);
        let result = gait_event_metrics(
            &ground_truth,
            &predicted,
            &correspondence.a2b,
            &correspondence.b2a,
        );
        trace!(
            "window {}: {} targets, {} predicted, {} missed, {} extra",
            acc.windows_seen(),
            ground_truth.len(),
            predicted.len(),
            result.missed,
            result.extra
        );

        acc.absorb(curve.len(), &ground_truth, &result, &correspondence.time_diff)?;
        Ok(result)
    }

    /// Evaluates all windows of a bout, in order. Every window must have the
    /// same length as the first one.
    pub fn evaluate<C, L>(&self, windows: &[(C, L)]) -> Result<BoutEvaluation, EvaluationError>
    where
        C: AsRef<[f32]>,
        L: AsRef<[f32]>,
    {
        if let Some((first, _)) = windows.first() {
            let window_len = first.as_ref().len();
            if let Some(i) = windows.iter().position(|(c, l)| {
                c.as_ref().len() != window_len || l.as_ref().len() != window_len
            }) {
                return Err(EvaluationError::InvalidInput(format!(
                    "window {} does not have the bout window length {}",
                    i, window_len
                )));
            }
        }

        let mut acc = TrialAccumulator::new();
        for (curve, labels) in windows {
            self.evaluate_window(&mut acc, curve.as_ref(), labels.as_ref())?;
        }

        let bout = acc.finish();
        debug!(
            "bout of {} windows: {} ground truth events, {} missed, {} extra",
            windows.len(),
            bout.total_ground_truth,
            bout.total_missed,
            bout.total_extra
        );
        Ok(bout)
    }

    /// Same as [`evaluate`](Self::evaluate) for `(batch, timesteps, 1)` arrays.
    pub fn evaluate_arrays(
        &self,
        predictions: &Array3<f32>,
        targets: &Array3<f32>,
    ) -> Result<BoutEvaluation, EvaluationError> {
        if predictions.dim() != targets.dim() {
            return Err(EvaluationError::InvalidInput(format!(
                "predictions {:?} and targets {:?} differ in shape",
                predictions.dim(),
                targets.dim()
            )));
        }

        let windows: Vec<(Vec<f32>, Vec<f32>)> = predictions
            .axis_iter(Axis(0))
            .zip(targets.axis_iter(Axis(0)))
            .map(|(p, t)| (p.column(0).to_vec(), t.column(0).to_vec()))
            .collect();
        self.evaluate(&windows)
    }
}

/// Produces per-sample event probabilities in `[0, 1]` for a batch of windows.
pub trait Predictor {
    /// `x` is `(batch, timesteps, channels)`; the output must be
    /// `(batch, timesteps, 1)`.
    fn predict(&self, x: &Array3<f32>) -> anyhow::Result<Array3<f32>>;
}

/// Replays probabilities computed ahead of time.
pub struct PrecomputedPredictions {
    pub probabilities: Array3<f32>,
}

impl Predictor for PrecomputedPredictions {
    fn predict(&self, x: &Array3<f32>) -> anyhow::Result<Array3<f32>> {
        let (batch, timesteps, _) = x.dim();
        let (p_batch, p_timesteps, _) = self.probabilities.dim();
        if batch != p_batch || timesteps != p_timesteps {
            anyhow::bail!(
                "have probabilities for {} windows of {} samples, asked for {} of {}",
                p_batch,
                p_timesteps,
                batch,
                timesteps
            );
        }
        Ok(self.probabilities.clone())
    }
}

/// Runs `model` on the predictors of one bout and scores its output against
/// the target labels.
pub fn evaluate_model<M: Predictor + ?Sized>(
    model: &M,
    x: &Array3<f32>,
    t: &Array3<f32>,
    settings: EvaluationSettings,
) -> Result<BoutEvaluation, EvaluationError> {
    let preds = model.predict(x)?;
    let expected = (x.dim().0, x.dim().1, 1);
    if preds.dim() != expected {
        return Err(EvaluationError::PredictionShape {
            expected,
            actual: preds.dim(),
        });
    }
    WindowEvaluator::new(settings).evaluate_arrays(&preds, t)
}
