//! In-memory statistics table
//!
//! The source spreadsheets are already aggregated: each row carries the
//! mean/min/max/count of all transfers for one combination of manufacturer,
//! model, fuel, mileage bucket and age bucket. Nothing here ever sees an
//! individual sale.
//!
//! - [`loader`]: reads `.xlsx`/`.csv` files into a [`StatTable`]
//! - [`cache`]: keeps loaded tables alive across interactions

pub mod cache;
pub mod loader;

use crate::buckets::{self, AgeScale, MILEAGE_BUCKETS};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use cache::TableCache;
pub use loader::load_table;

/// Column names the loader depends on. These are a fixed contract with the
/// statistics files.
pub const COL_MAKER: &str = "제조사";
pub const COL_DETAILED_MODEL: &str = "모델명3";
pub const COL_GROUPED_MODEL: &str = "모델명2";
pub const COL_FUEL: &str = "연료";
pub const COL_MILEAGE: &str = "KM2";
pub const COL_AGE: &str = "MONTHS";

pub const LABEL_COLUMNS: [&str; 6] = [
    COL_MAKER,
    COL_DETAILED_MODEL,
    COL_GROUPED_MODEL,
    COL_FUEL,
    COL_MILEAGE,
    COL_AGE,
];

/// Which statistic column set a table row is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Measure {
    /// `mean`, `min`, `max`, `count`
    #[default]
    Plain,
    /// `mean_price`, `min_price`, `max_price`, `count_price`
    Price,
    /// `mean_rate`, `min_rate`, `max_rate`, `count_rate`
    Depreciation,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Plain, Measure::Price, Measure::Depreciation];

    /// Column names in mean, min, max, count order.
    pub fn columns(self) -> [&'static str; 4] {
        match self {
            Measure::Plain => ["mean", "min", "max", "count"],
            Measure::Price => ["mean_price", "min_price", "max_price", "count_price"],
            Measure::Depreciation => ["mean_rate", "min_rate", "max_rate", "count_rate"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Measure::Plain => "plain",
            Measure::Price => "price",
            Measure::Depreciation => "depreciation",
        }
    }

    /// Label shown in the measure picker.
    pub fn label(self) -> &'static str {
        match self {
            Measure::Plain => "기본 가격",
            Measure::Price => "가격",
            Measure::Depreciation => "감가율",
        }
    }

    /// Unit note shown above the table.
    pub fn unit(self) -> &'static str {
        match self {
            Measure::Plain | Measure::Price => "만 원 (₩)",
            Measure::Depreciation => "% (신차가 대비)",
        }
    }

    /// Format one statistic value for display.
    ///
    /// Prices are truncated toward zero and thousands-separated, rates keep
    /// one decimal.
    pub fn format_value(self, value: f64) -> String {
        match self {
            Measure::Plain | Measure::Price => group_thousands(value.trunc() as i64),
            Measure::Depreciation => format!("{:.1}%", value),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "" => Ok(Measure::Plain),
            "price" => Ok(Measure::Price),
            "depreciation" | "rate" => Ok(Measure::Depreciation),
            other => Err(format!(
                "unknown measure '{}' (expected plain, price or depreciation)",
                other
            )),
        }
    }
}

/// `1234567` → `"1,234,567"`
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Pre-aggregated statistics for one measure. Any value may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: Option<f64>,
}

impl Summary {
    pub fn new(mean: f64, min: f64, max: f64, count: f64) -> Self {
        Self {
            mean: Some(mean),
            min: Some(min),
            max: Some(max),
            count: Some(count),
        }
    }
}

/// One transaction-aggregate row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatRow {
    pub maker: Option<String>,
    /// Model picker column (`모델명3`).
    pub detailed_model: Option<String>,
    /// Pivot row label (`모델명2`).
    pub grouped_model: Option<String>,
    pub fuel: Option<String>,
    pub mileage: Option<String>,
    pub age: Option<String>,
    pub stats: BTreeMap<Measure, Summary>,
}

impl StatRow {
    pub fn summary(&self, measure: Measure) -> Summary {
        self.stats.get(&measure).copied().unwrap_or_default()
    }
}

/// A loaded statistics file.
#[derive(Debug, Clone)]
pub struct StatTable {
    source: PathBuf,
    measures: Vec<Measure>,
    rows: Vec<StatRow>,
}

impl StatTable {
    pub fn new(source: impl Into<PathBuf>, measures: Vec<Measure>, rows: Vec<StatRow>) -> Self {
        Self {
            source: source.into(),
            measures,
            rows,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Measures whose four columns all exist in the file.
    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn has_measure(&self, measure: Measure) -> bool {
        self.measures.contains(&measure)
    }

    /// The requested measure if available, else the first one the file has.
    pub fn resolve_measure(&self, requested: Option<Measure>) -> Measure {
        match requested {
            Some(m) if self.has_measure(m) => m,
            _ => self.measures.first().copied().unwrap_or_default(),
        }
    }

    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bucket labels present in the data but missing from the display
    /// orderings. Rows carrying them never reach the grid.
    pub fn unknown_buckets(&self, scale: AgeScale) -> BTreeSet<String> {
        let mut unknown = BTreeSet::new();
        for row in &self.rows {
            if let Some(km) = &row.mileage {
                if buckets::position(&MILEAGE_BUCKETS, km).is_none() {
                    unknown.insert(km.clone());
                }
            }
            if let Some(age) = &row.age {
                if buckets::position(scale.buckets(), age).is_none() {
                    unknown.insert(age.clone());
                }
            }
        }
        unknown
    }

    /// Log a warning for every label [`unknown_buckets`](Self::unknown_buckets) finds.
    pub fn warn_unknown_buckets(&self, scale: AgeScale) {
        let unknown = self.unknown_buckets(scale);
        if !unknown.is_empty() {
            log::warn!(
                "{}: bucket labels not in the {} ordering will not be displayed: {}",
                self.source.display(),
                scale,
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
    }
}
