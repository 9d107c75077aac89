//! Dashboard view assembly and HTML output
//!
//! [`build_view`] runs the whole per-interaction pipeline against a loaded
//! table: sanitize the selection, compute picker options, filter, pivot.
//! [`html`] turns the resulting [`DashboardView`] into markup, either as the
//! interactive page served by [`crate::serve`] or as a static file.
//!
//! # Usage
//!
//! ```ignore
//! use pricegrid::{load_table, report, AgeScale, Selection};
//!
//! let table = load_table("국토부_pricerange_국산_연료추가.xlsx")?;
//! let selection = Selection::new("현대", "아반떼", "가솔린");
//! let view = report::build_view(&table, selection, None, AgeScale::Coarse);
//! report::generate("avante.html", &view)?;
//! ```

pub mod html;

use crate::buckets::AgeScale;
use crate::pivot::{pivot, PivotConfig, PivotOutcome};
use crate::selection::{filter_rows, Choices, Selection};
use crate::table::{Measure, StatTable};
use std::io;
use std::path::Path;

/// Everything one rendering of the dashboard needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Data-quality tier labels, in picker order. Empty hides the picker.
    pub datasets: Vec<String>,
    /// Index of the active tier in `datasets`.
    pub dataset: usize,
    /// Measures the active file offers.
    pub measures: Vec<Measure>,
    pub measure: Measure,
    pub age_scale: AgeScale,
    pub selection: Selection,
    pub choices: Choices,
    pub outcome: PivotOutcome,
    /// Render pickers as a form (served page) or as plain text (static file).
    pub interactive: bool,
    /// Generation timestamp shown in the footer of static files.
    pub generated: Option<String>,
}

impl DashboardView {
    pub fn with_datasets(mut self, datasets: Vec<String>, active: usize) -> Self {
        self.dataset = active.min(datasets.len().saturating_sub(1));
        self.datasets = datasets;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated = Some(timestamp.into());
        self
    }

    pub fn has_data(&self) -> bool {
        matches!(self.outcome, PivotOutcome::Grid(_))
    }
}

/// Run selection → filter → pivot for one interaction.
///
/// Stale choices (e.g. after switching to a file without that model) are
/// dropped before filtering. An unavailable measure falls back to the first
/// one the file has.
pub fn build_view(
    table: &StatTable,
    selection: Selection,
    measure: Option<Measure>,
    age_scale: AgeScale,
) -> DashboardView {
    let measure = table.resolve_measure(measure);
    let selection = selection.sanitize(table);
    let choices = selection.choices(table);

    let outcome = if selection.is_complete() {
        let rows = filter_rows(table, &selection);
        pivot(&rows, &PivotConfig { measure, age_scale })
    } else {
        PivotOutcome::NoData
    };

    DashboardView {
        datasets: Vec::new(),
        dataset: 0,
        measures: table.measures().to_vec(),
        measure,
        age_scale,
        selection,
        choices,
        outcome,
        interactive: false,
        generated: None,
    }
}

/// Write a standalone dashboard page to `path`.
pub fn generate<P: AsRef<Path>>(path: P, view: &DashboardView) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    html::write(&mut file, view)
}
