//! CSV ingest.
//!
//! The input is a "wide" table: a free-text preamble, a header row naming one
//! condition per column (e.g. `12 uM`), and catastrophe times down each column.
//! Columns have different lengths, so short columns end in empty cells.
//!
//! This module turns that into a [`Dataset`]:
//! - skip the preamble, keep the requested columns
//! - melt to `(condition, time)` pairs and drop empty cells
//! - reject unparseable / non-positive times row by row (logged, not fatal)
//! - one validated [`SampleSet`] per condition
//!
//! Nothing downstream sees CSV.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{ConditionSamples, Dataset, SampleSet};
use crate::error::AppError;

/// Preamble lines in the lab's export format.
pub const DEFAULT_SKIP_ROWS: usize = 9;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub path: PathBuf,
    pub skip_rows: usize,
    /// Columns to keep, by header label; empty keeps every column.
    pub columns: Vec<String>,
}

/// A cell that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line in the file.
    pub line: usize,
    pub column: String,
    pub message: String,
}

/// Open `opts.path` and parse it into a [`Dataset`].
pub fn load_dataset(opts: &IngestOptions) -> Result<Dataset, AppError> {
    let file = File::open(&opts.path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", opts.path.display()),
        )
    })?;
    let (dataset, row_errors) = parse_dataset(BufReader::new(file), opts.skip_rows, &opts.columns)?;

    for err in &row_errors {
        warn!(line = err.line, column = %err.column, "skipping cell: {}", err.message);
    }
    debug!(
        conditions = dataset.conditions.len(),
        skipped = row_errors.len(),
        path = %opts.path.display(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Parse an already-open source. Returns the dataset plus the skipped cells.
pub fn parse_dataset<R: Read>(
    mut source: BufReader<R>,
    skip_rows: usize,
    columns: &[String],
) -> Result<(Dataset, Vec<RowError>), AppError> {
    let mut discard = String::new();
    for _ in 0..skip_rows {
        discard.clear();
        let read = source
            .read_line(&mut discard)
            .map_err(|e| AppError::new(2, format!("Failed to read CSV preamble: {e}")))?;
        if read == 0 {
            return Err(AppError::new(
                2,
                format!("CSV ended inside the {skip_rows}-line preamble."),
            ));
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let selected = select_columns(&headers, columns)?;

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); selected.len()];
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // preamble + header line, then 1-based
        let line = skip_rows + idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    column: String::new(),
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        for (slot, (label, col)) in selected.iter().enumerate() {
            let Some(cell) = record.get(*col) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            match parse_time(cell) {
                Ok(t) => values[slot].push(t),
                Err(message) => row_errors.push(RowError {
                    line,
                    column: label.clone(),
                    message,
                }),
            }
        }
    }

    let mut conditions = Vec::with_capacity(selected.len());
    for ((label, _), times) in selected.into_iter().zip(values) {
        if times.is_empty() {
            warn!(column = %label, "column has no usable catastrophe times; dropping it");
            continue;
        }
        let samples = SampleSet::new(times).map_err(|e| AppError::new(2, format!("Column '{label}': {e}")))?;
        conditions.push(ConditionSamples {
            concentration_um: parse_concentration(&label),
            label,
            samples,
        });
    }

    if conditions.is_empty() {
        return Err(AppError::new(3, "No usable catastrophe times in the CSV."));
    }

    conditions.sort_by(|a, b| {
        // Labelled concentrations first, ascending.
        match (a.concentration_um, b.concentration_um) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.label.cmp(&b.label))
    });

    Ok((Dataset { conditions }, row_errors))
}

/// Leading integer of a label such as `"12 uM"` or `"7uM"`.
pub fn parse_concentration(label: &str) -> Option<u32> {
    let digits: String = label
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn parse_time(cell: &str) -> Result<f64, String> {
    let t: f64 = cell
        .parse()
        .map_err(|_| format!("'{cell}' is not a number"))?;
    if !(t.is_finite() && t > 0.0) {
        return Err(format!("{t} is not a positive catastrophe time"));
    }
    Ok(t)
}

/// `(label, index)` pairs for the requested columns, in request order.
fn select_columns(headers: &StringRecord, requested: &[String]) -> Result<Vec<(String, usize)>, AppError> {
    let labels: Vec<String> = headers.iter().map(normalize_header_name).collect();

    if requested.is_empty() {
        return Ok(labels
            .into_iter()
            .enumerate()
            .filter(|(_, l)| !l.is_empty())
            .map(|(i, l)| (l, i))
            .collect());
    }

    let by_name: HashMap<&str, usize> = labels.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();
    requested
        .iter()
        .map(|name| {
            let name = name.trim();
            by_name
                .get(name)
                .map(|&i| (name.to_string(), i))
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!(
                            "Column '{name}' not found; available: {}",
                            labels.join(", ")
                        ),
                    )
                })
        })
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}
