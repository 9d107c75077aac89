//! Statistics file loader
//!
//! Supported formats, dispatched by extension:
//! * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet, header in row 1
//! * `.csv` – header row, UTF-8
//!
//! Both formats are first read into a [`RawSheet`] so the column contract is
//! checked in one place.

use super::{Measure, StatRow, StatTable, Summary, LABEL_COLUMNS};
use crate::error::{LoadError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::BTreeMap;
use std::path::Path;

/// One cell before any schema is applied.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

/// A header row plus body rows, straight from the file.
#[derive(Debug, Default)]
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<RawCell>>,
}

/// Load a statistics file, failing if it is missing or lacks any required column.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<StatTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    let table = build_table(path, raw)?;
    log::info!(
        "Loaded {} rows from {} (measures: {})",
        table.len(),
        path.display(),
        table
            .measures()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::EmptyWorkbook)?;
    let range = workbook.worksheet_range(&first)?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| header_text(&from_data(c))).collect(),
        None => Vec::new(),
    };
    let rows = rows.map(|r| r.iter().map(from_data).collect()).collect();

    Ok(RawSheet { headers, rows })
}

fn from_data(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
    }
}

fn read_csv(path: &Path) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|v| {
                    if v.trim().is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(v.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawSheet { headers, rows })
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

fn header_text(cell: &RawCell) -> String {
    label(cell).unwrap_or_default()
}

/// Categorical value: trimmed text, or the textual form of a number.
fn label(cell: &RawCell) -> Option<String> {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        RawCell::Number(n) if !n.is_finite() => None,
        RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
        RawCell::Number(n) => Some(n.to_string()),
    }
}

/// Statistic value. Text is accepted only if it parses as a finite number.
fn number(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Empty => return None,
        RawCell::Number(n) => *n,
        RawCell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

fn build_table(path: &Path, raw: RawSheet) -> Result<StatTable> {
    let find = |name: &str| raw.headers.iter().position(|h| h == name);

    let mut label_idx = [0usize; 6];
    for (slot, name) in label_idx.iter_mut().zip(LABEL_COLUMNS) {
        *slot = find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
    }

    let mut measure_idx: Vec<(Measure, [usize; 4])> = Vec::new();
    let mut first_gap: Option<&str> = None;
    for measure in Measure::ALL {
        let cols = measure.columns();
        let found: Vec<Option<usize>> = cols.iter().map(|c| find(*c)).collect();
        if let &[Some(a), Some(b), Some(c), Some(d)] = found.as_slice() {
            measure_idx.push((measure, [a, b, c, d]));
        } else if first_gap.is_none() && found.iter().any(Option::is_some) {
            // Partially present set: remember what is missing for the error
            first_gap = cols.iter().zip(&found).find(|(_, f)| f.is_none()).map(|(c, _)| *c);
        }
    }
    if measure_idx.is_empty() {
        let missing = first_gap.unwrap_or(Measure::Plain.columns()[0]);
        return Err(LoadError::MissingColumn(missing.to_string()));
    }

    let empty = RawCell::Empty;
    let mut rows = Vec::with_capacity(raw.rows.len());
    for cells in &raw.rows {
        if cells.iter().all(|c| *c == RawCell::Empty) {
            continue;
        }
        let cell = |i: usize| cells.get(i).unwrap_or(&empty);

        let mut stats = BTreeMap::new();
        for (measure, [mean, min, max, count]) in &measure_idx {
            stats.insert(
                *measure,
                Summary {
                    mean: number(cell(*mean)),
                    min: number(cell(*min)),
                    max: number(cell(*max)),
                    count: number(cell(*count)),
                },
            );
        }

        rows.push(StatRow {
            maker: label(cell(label_idx[0])),
            detailed_model: label(cell(label_idx[1])),
            grouped_model: label(cell(label_idx[2])),
            fuel: label(cell(label_idx[3])),
            mileage: label(cell(label_idx[4])),
            age: label(cell(label_idx[5])),
            stats,
        });
    }

    let measures = measure_idx.into_iter().map(|(m, _)| m).collect();
    Ok(StatTable::new(path, measures, rows))
}
