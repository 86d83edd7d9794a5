pub mod config;
pub mod data_loading;
pub mod dataset;
pub mod event_matching;
pub mod metrics;
pub mod output;
pub mod peak_detection;
pub mod window_evaluation;

pub use event_matching::{compare_events, Correspondence};
pub use metrics::{gait_event_metrics, WindowResult};
pub use window_evaluation::{
    evaluate_model, BoutEvaluation, EvaluationError, EvaluationSettings, TrialAccumulator,
    WindowEvaluator,
};

/// Probability and target label curves of one fixed-length window.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub probabilities: Vec<f32>,
    pub labels: Vec<f32>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consecutive windows of one micro-walking bout.
#[derive(Debug, Clone)]
pub struct Bout {
    pub name: String,
    pub windows: Vec<Window>,
}

impl Bout {
    pub fn curves(&self) -> Vec<(&[f32], &[f32])> {
        self.windows
            .iter()
            .map(|w| (w.probabilities.as_slice(), w.labels.as_slice()))
            .collect()
    }

    /// Total number of samples covered by the bout.
    pub fn len(&self) -> usize {
        self.windows.iter().map(Window::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
