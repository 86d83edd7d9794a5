use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, Axis, ShapeBuilder};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("annotated example has {actual} values, expected {expected}")]
    RowLength { expected: usize, actual: usize },

    #[error("Failed to reshape window: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Geometry of one model-input window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowShape {
    pub timesteps: usize,
    pub channels: usize,
}

impl Default for WindowShape {
    fn default() -> Self {
        Self {
            timesteps: 200,
            channels: 6,
        }
    }
}

impl WindowShape {
    pub fn predictor_len(&self) -> usize {
        self.timesteps * self.channels
    }

    /// Predictor values followed by one label per timestep.
    pub fn row_len(&self) -> usize {
        self.predictor_len() + self.timesteps
    }
}

/// Splits one annotated example into a `(timesteps, channels)` predictor
/// matrix and its label column. Channels are stored one after the other in
/// the row, so the reshape is column-major.
pub fn split_example(
    row: ArrayView1<f32>,
    shape: WindowShape,
) -> Result<(Array2<f32>, Array2<f32>), DatasetError> {
    if row.len() != shape.row_len() {
        return Err(DatasetError::RowLength {
            expected: shape.row_len(),
            actual: row.len(),
        });
    }

    let predictors = row.slice(s![..shape.predictor_len()]).to_vec();
    let labels = row.slice(s![shape.predictor_len()..]).to_vec();

    let x = Array2::from_shape_vec((shape.timesteps, shape.channels).f(), predictors)?;
    let y = Array2::from_shape_vec((shape.timesteps, 1).f(), labels)?;
    Ok((x, y))
}

/// Extracts predictors and targets from a set of annotated examples and
/// stacks them into `(batch, timesteps, channels)` and `(batch, timesteps, 1)`
/// arrays ready for inference.
pub fn build_dataset(
    rows: ArrayView2<f32>,
    shape: WindowShape,
) -> Result<(Array3<f32>, Array3<f32>), DatasetError> {
    let batch = rows.nrows();
    let mut x = Array3::<f32>::zeros((batch, shape.timesteps, shape.channels));
    let mut y = Array3::<f32>::zeros((batch, shape.timesteps, 1));

    for (i, row) in rows.axis_iter(Axis(0)).enumerate() {
        let (xi, yi) = split_example(row, shape)?;
        x.index_axis_mut(Axis(0), i).assign(&xi);
        y.index_axis_mut(Axis(0), i).assign(&yi);
    }

    Ok((x, y))
}
