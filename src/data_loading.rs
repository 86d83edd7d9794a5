use crate::dataset::WindowShape;
use crate::{Bout, Window};
use anyhow::{Context, Result};
use log::{debug, info};
use ndarray::Array2;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn parse_record(record: &csv::StringRecord) -> Result<Vec<f32>> {
    record
        .iter()
        .map(|field| field.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|e| anyhow::anyhow!("Failed to parse value: {}", e))
}

fn read_rows(path: &Path) -> Result<Vec<Vec<f32>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = parse_record(&record)
            .with_context(|| format!("{}: row {}", path.display(), line + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads one bout from a CSV file. Each row is one window: `window_len`
/// probabilities followed by `window_len` target labels.
pub fn load_bout_windows(path: &Path, window_len: usize) -> Result<Bout> {
    let rows = read_rows(path)?;
    let mut windows = Vec::with_capacity(rows.len());

    for (i, mut row) in rows.into_iter().enumerate() {
        if row.len() != 2 * window_len {
            anyhow::bail!(
                "{}: row {} has {} values, expected {} ({} probabilities + {} labels)",
                path.display(),
                i + 1,
                row.len(),
                2 * window_len,
                window_len,
                window_len
            );
        }
        let labels = row.split_off(window_len);
        windows.push(Window {
            probabilities: row,
            labels,
        });
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bout")
        .to_string();
    debug!("Loaded {} windows from {}", windows.len(), path.display());

    Ok(Bout { name, windows })
}

/// CSV files making up a trial: the file itself, or every `.csv` below a
/// directory, sorted by path.
pub fn discover_bout_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input) {
        let entry =
            entry.with_context(|| format!("Failed to walk directory: {}", input.display()))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|s| s.to_str()) == Some("csv")
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    info!("Found {} bout files in {}", files.len(), input.display());
    Ok(files)
}

/// Reads annotated examples (predictors then labels, one window per row) into
/// a `(rows, shape.row_len())` array.
pub fn load_annotated_examples(path: &Path, shape: WindowShape) -> Result<Array2<f32>> {
    let rows = read_rows(path)?;
    let row_len = shape.row_len();

    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != row_len) {
        anyhow::bail!(
            "{}: row {} has {} values, expected {}",
            path.display(),
            i + 1,
            row.len(),
            row_len
        );
    }

    let n_rows = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, row_len), flat)
        .with_context(|| format!("Failed to build example array from {}", path.display()))
}
