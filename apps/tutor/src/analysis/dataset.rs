//! Uploaded tabular data: CSV parsing, the text preview sent to the model, and
//! the first-column histogram drawn by the UI.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::llm_client::prompts::DATASET_ANALYSIS_PREFIX;
use crate::llm_client::{ask_or_describe, AiClient};

/// Rows included in the preview.
pub const PREVIEW_ROWS: usize = 5;
const NUMERIC_BINS: usize = 10;
const MAX_CATEGORIES: usize = 20;
const OTHER_CATEGORY: &str = "(other)";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file has no header row")]
    NoColumns,
}

/// A parsed CSV upload. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistogramKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub kind: HistogramKind,
    pub bins: Vec<HistogramBin>,
}

/// Parses CSV bytes with a mandatory header row. Ragged rows and invalid UTF-8
/// are errors.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() || columns.iter().all(|c| c.trim().is_empty()) {
        return Err(DatasetError::NoColumns);
    }

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok(Dataset { columns, rows })
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First `PREVIEW_ROWS` rows as a right-aligned text table with a row index.
    pub fn preview_text(&self) -> String {
        let shown = &self.rows[..self.rows.len().min(PREVIEW_ROWS)];

        let index_width = match shown.len() {
            0 => 0,
            n => (n - 1).to_string().len(),
        };
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                shown
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(shown.len() + 1);
        let mut header = " ".repeat(index_width);
        for (name, width) in self.columns.iter().zip(&widths) {
            header.push_str(&format!("  {name:>width$}"));
        }
        lines.push(header);

        for (idx, row) in shown.iter().enumerate() {
            let mut line = format!("{idx:>index_width$}");
            for (cell, width) in row.iter().zip(&widths) {
                line.push_str(&format!("  {cell:>width$}"));
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Distribution of the first column. Numeric when every non-empty cell
    /// parses as a finite number, categorical otherwise.
    pub fn first_column_histogram(&self) -> Histogram {
        let column = self.columns[0].clone();
        let values: Vec<&str> = self
            .rows
            .iter()
            .map(|row| row[0].trim())
            .filter(|v| !v.is_empty())
            .collect();

        let numbers: Option<Vec<f64>> = values
            .iter()
            .map(|v| v.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect();

        match numbers {
            Some(numbers) if !numbers.is_empty() => Histogram {
                column,
                kind: HistogramKind::Numeric,
                bins: numeric_bins(&numbers),
            },
            _ => Histogram {
                column,
                kind: HistogramKind::Categorical,
                bins: category_bins(&values),
            },
        }
    }
}

fn numeric_bins(numbers: &[f64]) -> Vec<HistogramBin> {
    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBin {
            label: format!("{min}"),
            count: numbers.len(),
        }];
    }

    let width = (max - min) / NUMERIC_BINS as f64;
    let mut counts = [0usize; NUMERIC_BINS];
    for n in numbers {
        let idx = (((n - min) / width).floor() as usize).min(NUMERIC_BINS - 1);
        counts[idx] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            let lo = min + width * i as f64;
            let hi = lo + width;
            let close = if i == NUMERIC_BINS - 1 { ']' } else { ')' };
            HistogramBin {
                label: format!("[{lo:.2}, {hi:.2}{close}"),
                count,
            }
        })
        .collect()
}

fn category_bins(values: &[&str]) -> Vec<HistogramBin> {
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &v in values {
        let count = counts.entry(v).or_insert(0);
        if *count == 0 {
            first_seen.push(v);
        }
        *count += 1;
    }

    // Stable sort keeps first-appearance order among equal counts.
    first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let mut bins: Vec<HistogramBin> = first_seen
        .iter()
        .take(MAX_CATEGORIES)
        .map(|v| HistogramBin {
            label: (*v).to_string(),
            count: counts[v],
        })
        .collect();

    let other: usize = first_seen.iter().skip(MAX_CATEGORIES).map(|v| counts[v]).sum();
    if other > 0 {
        bins.push(HistogramBin {
            label: OTHER_CATEGORY.to_string(),
            count: other,
        });
    }
    bins
}

pub fn build_dataset_prompt(dataset: &Dataset) -> String {
    format!("{DATASET_ANALYSIS_PREFIX}{}", dataset.preview_text())
}

/// Asks for insights on the dataset preview. Nothing is stored.
pub async fn analyze_dataset(dataset: &Dataset, ai: &dyn AiClient) -> String {
    ask_or_describe(ai, &build_dataset_prompt(dataset)).await
}
