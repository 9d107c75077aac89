//! Pivot/format engine
//!
//! Turns the filtered statistic rows into a display grid:
//!
//! ```text
//!  제조사 | 모델   | 주행거리   | ~1년                     | ~2년 | ...
//!  현대   | 아반떼 | ~3만km     | <b>1,000</b><br>(...)... | -    |
//!         |        | ~6만km     | -                        | -    |
//! ```
//!
//! Rows are the cross product of observed manufacturers, observed grouped
//! models and every mileage bucket; columns are exactly the active age
//! ordering. Cells with several source rows average each statistic
//! independently. The input is already aggregated, so this is a mean of
//! means (and of mins, maxes and counts), kept as-is because no raw
//! transactions exist to recompute from.

use crate::buckets::{self, AgeScale, MILEAGE_BUCKETS};
use crate::table::{group_thousands, Measure, StatRow, Summary};
use std::collections::{BTreeMap, BTreeSet};

/// Shown for any cell missing one of mean, min, max or count.
pub const PLACEHOLDER: &str = "-";

pub const HEADER_MAKER: &str = "제조사";
pub const HEADER_MODEL: &str = "모델";
pub const HEADER_MILEAGE: &str = "주행거리";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PivotConfig {
    pub measure: Measure,
    pub age_scale: AgeScale,
}

/// One output row. `maker`/`model` are empty when they repeat the row above.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub maker: String,
    pub model: String,
    pub mileage: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotGrid {
    pub measure: Measure,
    /// Age bucket labels, one per cell column.
    pub columns: Vec<String>,
    pub rows: Vec<GridRow>,
    /// Sum of the measure's `count` over every filtered row.
    pub total_count: f64,
}

impl PivotGrid {
    /// Full header: the three label columns followed by the age buckets.
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![HEADER_MAKER, HEADER_MODEL, HEADER_MILEAGE];
        header.extend(self.columns.iter().map(String::as_str));
        header
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PivotOutcome {
    /// Nothing matched the selection.
    NoData,
    Grid(PivotGrid),
}

impl PivotOutcome {
    pub fn grid(&self) -> Option<&PivotGrid> {
        match self {
            PivotOutcome::Grid(grid) => Some(grid),
            PivotOutcome::NoData => None,
        }
    }
}

/// Running average that ignores missing values.
#[derive(Debug, Clone, Copy, Default)]
struct Average {
    sum: f64,
    n: u32,
}

impl Average {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.n += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.n > 0).then(|| self.sum / self.n as f64)
    }
}

#[derive(Debug, Default)]
struct CellStats {
    mean: Average,
    min: Average,
    max: Average,
    count: Average,
}

impl CellStats {
    fn add(&mut self, s: &Summary) {
        self.mean.add(s.mean);
        self.min.add(s.min);
        self.max.add(s.max);
        self.count.add(s.count);
    }

    fn summary(&self) -> Summary {
        Summary {
            mean: self.mean.value(),
            min: self.min.value(),
            max: self.max.value(),
            count: self.count.value(),
        }
    }
}

/// Pivot the filtered rows. Empty input is `NoData`, never an empty grid.
pub fn pivot(rows: &[&StatRow], config: &PivotConfig) -> PivotOutcome {
    let ages = config.age_scale.buckets();
    let measure = config.measure;

    let mut makers = BTreeSet::new();
    let mut models = BTreeSet::new();
    let mut cells: BTreeMap<(&str, &str, usize, usize), CellStats> = BTreeMap::new();
    let mut total_count = 0.0;

    for row in rows {
        let summary = row.summary(measure);
        total_count += summary.count.unwrap_or(0.0);

        let (Some(maker), Some(model)) = (row.maker.as_deref(), row.grouped_model.as_deref()) else {
            continue;
        };
        makers.insert(maker);
        models.insert(model);

        let km = row.mileage.as_deref().and_then(|l| buckets::position(&MILEAGE_BUCKETS, l));
        let age = row.age.as_deref().and_then(|l| buckets::position(ages, l));
        if let (Some(km), Some(age)) = (km, age) {
            cells
                .entry((maker, model, km, age))
                .or_default()
                .add(&summary);
        }
    }

    if makers.is_empty() {
        return PivotOutcome::NoData;
    }

    let mut grid_rows = Vec::with_capacity(makers.len() * models.len() * MILEAGE_BUCKETS.len());
    for &maker in &makers {
        for &model in &models {
            for (km, mileage) in MILEAGE_BUCKETS.iter().enumerate() {
                let row_cells = (0..ages.len())
                    .map(|age| match cells.get(&(maker, model, km, age)) {
                        Some(stats) => format_cell(measure, &stats.summary()),
                        None => PLACEHOLDER.to_string(),
                    })
                    .collect();
                grid_rows.push(GridRow {
                    maker: maker.to_string(),
                    model: model.to_string(),
                    mileage: mileage.to_string(),
                    cells: row_cells,
                });
            }
        }
    }
    blank_repeated_labels(&mut grid_rows);

    PivotOutcome::Grid(PivotGrid {
        measure,
        columns: ages.iter().map(|a| a.to_string()).collect(),
        rows: grid_rows,
        total_count,
    })
}

/// `<b>mean</b><br>(min ~ max)<br>[count건]`, or the placeholder when any of
/// the four values is missing.
pub fn format_cell(measure: Measure, stats: &Summary) -> String {
    match (stats.mean, stats.min, stats.max, stats.count) {
        (Some(mean), Some(min), Some(max), Some(count)) => format!(
            "<b>{}</b><br>({} ~ {})<br>[{}건]",
            measure.format_value(mean),
            measure.format_value(min),
            measure.format_value(max),
            group_thousands(count.trunc() as i64)
        ),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Blank a maker/model label equal to the previous row's label in the same
/// column. Comparison is against the previous row's original label.
fn blank_repeated_labels(rows: &mut [GridRow]) {
    let mut prev_maker: Option<String> = None;
    let mut prev_model: Option<String> = None;

    for row in rows.iter_mut() {
        let maker = row.maker.clone();
        let model = row.model.clone();
        if prev_maker.as_ref() == Some(&maker) {
            row.maker.clear();
        }
        if prev_model.as_ref() == Some(&model) {
            row.model.clear();
        }
        prev_maker = Some(maker);
        prev_model = Some(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_row(
        maker: &str,
        model: &str,
        km: &str,
        age: &str,
        summary: Summary,
    ) -> StatRow {
        StatRow {
            maker: Some(maker.to_string()),
            detailed_model: Some(model.to_string()),
            grouped_model: Some(model.to_string()),
            fuel: Some("Gasoline".to_string()),
            mileage: Some(km.to_string()),
            age: Some(age.to_string()),
            stats: BTreeMap::from([(Measure::Plain, summary)]),
        }
    }

    fn grid_of(rows: &[StatRow], config: &PivotConfig) -> PivotGrid {
        let refs: Vec<&StatRow> = rows.iter().collect();
        match pivot(&refs, config) {
            PivotOutcome::Grid(grid) => grid,
            PivotOutcome::NoData => panic!("expected a grid"),
        }
    }

    // ==========================================================================
    // SINGLE ROW SCENARIO
    // ==========================================================================
    //
    // One aggregate row for Hyundai Avante: exactly one filled cell, every
    // other mileage bucket still present but blank.
    // ==========================================================================

    #[test]
    fn test_single_row_scenario() {
        let rows = vec![stat_row(
            "Hyundai",
            "Avante",
            "~3만km",
            "~1년",
            Summary::new(1000.0, 900.0, 1100.0, 5.0),
        )];
        let grid = grid_of(&rows, &PivotConfig::default());

        assert_eq!(grid.rows.len(), 5);
        assert_eq!(grid.columns.len(), 11);

        let first = &grid.rows[0];
        assert_eq!(first.maker, "Hyundai");
        assert_eq!(first.model, "Avante");
        assert_eq!(first.mileage, "~3만km");
        assert_eq!(first.cells[0], "<b>1,000</b><br>(900 ~ 1,100)<br>[5건]");
        assert!(first.cells[1..].iter().all(|c| c == PLACEHOLDER));

        for (row, km) in grid.rows.iter().zip(MILEAGE_BUCKETS).skip(1) {
            assert_eq!(row.mileage, km);
            assert_eq!(row.maker, "", "repeated maker should be blanked");
            assert_eq!(row.model, "", "repeated model should be blanked");
            assert!(row.cells.iter().all(|c| c == PLACEHOLDER));
        }
        assert_eq!(grid.total_count, 5.0);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert_eq!(pivot(&[], &PivotConfig::default()), PivotOutcome::NoData);
    }

    #[test]
    fn test_rows_without_labels_are_no_data() {
        let mut row = stat_row("Hyundai", "Avante", "~3만km", "~1년", Summary::default());
        row.maker = None;
        assert_eq!(pivot(&[&row], &PivotConfig::default()), PivotOutcome::NoData);
    }

    // ==========================================================================
    // SHAPE TESTS
    // ==========================================================================
    //
    // Row set is observed makers × observed models × all mileage buckets.
    // Column set is exactly the active age ordering.
    // ==========================================================================

    #[test]
    fn test_shape_is_full_cross_product() {
        let s = Summary::new(1.0, 1.0, 1.0, 1.0);
        let rows = vec![
            stat_row("Kia", "K5", "~6만km", "~2년", s),
            stat_row("Kia", "K3", "12만km초과", "20년 초과", s),
        ];
        let grid = grid_of(&rows, &PivotConfig::default());

        assert_eq!(grid.rows.len(), 2 * MILEAGE_BUCKETS.len());
        let mileages: Vec<&str> = grid.rows.iter().map(|r| r.mileage.as_str()).collect();
        assert_eq!(&mileages[..5], &MILEAGE_BUCKETS[..]);
        assert_eq!(&mileages[5..], &MILEAGE_BUCKETS[..]);

        // K3 sorts before K5
        assert_eq!(grid.rows[0].model, "K3");
        assert_eq!(grid.rows[5].model, "K5");
        assert!(grid.rows.iter().all(|r| r.cells.len() == grid.columns.len()));
    }

    #[test]
    fn test_fine_scale_columns() {
        let rows = vec![stat_row("Kia", "K5", "~3만km", "~8년", Summary::new(1.0, 1.0, 1.0, 1.0))];
        let config = PivotConfig {
            age_scale: AgeScale::Fine,
            ..Default::default()
        };
        let grid = grid_of(&rows, &config);

        assert_eq!(grid.columns.len(), 21);
        assert_eq!(grid.header().len(), 24);
        assert_ne!(grid.rows[0].cells[7], PLACEHOLDER);
    }

    #[test]
    fn test_unknown_buckets_are_dropped_silently() {
        let s = Summary::new(500.0, 400.0, 600.0, 2.0);
        let rows = vec![
            stat_row("Kia", "K5", "~15만km", "~1년", s),
            stat_row("Kia", "K5", "~3만km", "~8년", s),
        ];
        let grid = grid_of(&rows, &PivotConfig::default());

        assert_eq!(grid.rows.len(), 5);
        assert!(grid.rows.iter().all(|r| r.cells.iter().all(|c| c == PLACEHOLDER)));
    }

    #[test]
    fn test_header() {
        let rows = vec![stat_row("Kia", "K5", "~3만km", "~1년", Summary::default())];
        let grid = grid_of(&rows, &PivotConfig::default());
        let header = grid.header();

        assert_eq!(&header[..4], &["제조사", "모델", "주행거리", "~1년"]);
        assert_eq!(header.last(), Some(&"20년 초과"));
    }

    // ==========================================================================
    // AGGREGATION TESTS
    // ==========================================================================

    #[test]
    fn test_duplicate_cells_average_each_statistic() {
        let rows = vec![
            stat_row("Kia", "K5", "~3만km", "~1년", Summary::new(1000.0, 900.0, 1100.0, 5.0)),
            stat_row("Kia", "K5", "~3만km", "~1년", Summary::new(1200.0, 1000.0, 1500.0, 3.0)),
        ];
        let grid = grid_of(&rows, &PivotConfig::default());

        assert_eq!(grid.rows[0].cells[0], "<b>1,100</b><br>(950 ~ 1,300)<br>[4건]");
        assert_eq!(grid.total_count, 8.0);
    }

    #[test]
    fn test_missing_values_skipped_when_averaging() {
        let partial = Summary {
            mean: None,
            ..Summary::new(0.0, 800.0, 1000.0, 2.0)
        };
        let rows = vec![
            stat_row("Kia", "K5", "~3만km", "~1년", partial),
            stat_row("Kia", "K5", "~3만km", "~1년", Summary::new(900.0, 800.0, 1000.0, 2.0)),
        ];
        let grid = grid_of(&rows, &PivotConfig::default());

        assert_eq!(grid.rows[0].cells[0], "<b>900</b><br>(800 ~ 1,000)<br>[2건]");
    }

    // ==========================================================================
    // CELL FORMAT TESTS
    // ==========================================================================

    #[test]
    fn test_format_cell_complete() {
        let cell = format_cell(Measure::Plain, &Summary::new(2345.6, 1999.0, 3100.0, 1234.0));
        assert_eq!(cell, "<b>2,345</b><br>(1,999 ~ 3,100)<br>[1,234건]");
    }

    #[test]
    fn test_format_cell_rate() {
        let cell = format_cell(Measure::Depreciation, &Summary::new(31.04, 20.0, 45.5, 7.0));
        assert_eq!(cell, "<b>31.0%</b><br>(20.0% ~ 45.5%)<br>[7건]");
    }

    #[test]
    fn test_format_cell_any_missing_is_placeholder() {
        let full = Summary::new(1000.0, 900.0, 1100.0, 5.0);
        let variants = [
            Summary { mean: None, ..full },
            Summary { min: None, ..full },
            Summary { max: None, ..full },
            Summary { count: None, ..full },
        ];
        for s in variants {
            let cell = format_cell(Measure::Plain, &s);
            assert_eq!(cell, PLACEHOLDER);
            assert!(!cell.contains("1,000") && !cell.contains("900"));
        }
    }

    #[test]
    fn test_filled_cells_keep_min_mean_max_order() {
        let rows = vec![
            stat_row("Kia", "K5", "~3만km", "~1년", Summary::new(1500.0, 1200.0, 1800.0, 9.0)),
            stat_row("Kia", "K5", "~6만km", "~3년", Summary::new(1300.0, 1000.0, 1450.0, 4.0)),
        ];
        let grid = grid_of(&rows, &PivotConfig::default());

        for cell in grid.rows.iter().flat_map(|r| &r.cells).filter(|c| *c != PLACEHOLDER) {
            let nums: Vec<i64> = cell
                .split(|ch: char| !ch.is_ascii_digit() && ch != ',')
                .map(|t| t.replace(',', ""))
                .filter(|t| !t.is_empty())
                .map(|t| t.parse().unwrap())
                .collect();
            // mean, min, max, count
            assert_eq!(nums.len(), 4, "cell {}", cell);
            assert!(nums[1] <= nums[0] && nums[0] <= nums[2], "cell {}", cell);
        }
    }

    // ==========================================================================
    // LABEL BLANKING TESTS
    // ==========================================================================

    fn labels(pairs: &[(&str, &str)]) -> Vec<GridRow> {
        pairs
            .iter()
            .map(|(maker, model)| GridRow {
                maker: maker.to_string(),
                model: model.to_string(),
                mileage: String::new(),
                cells: vec![],
            })
            .collect()
    }

    #[test]
    fn test_blank_iff_equal_to_previous_row() {
        let original = [
            ("Kia", "K3"),
            ("Kia", "K3"),
            ("Kia", "K5"),
            ("Kia", "K5"),
            ("Hyundai", "K5"),
            ("Hyundai", "Avante"),
        ];
        let mut rows = labels(&original);
        blank_repeated_labels(&mut rows);

        for (i, row) in rows.iter().enumerate() {
            let maker_repeats = i > 0 && original[i].0 == original[i - 1].0;
            let model_repeats = i > 0 && original[i].1 == original[i - 1].1;
            assert_eq!(row.maker.is_empty(), maker_repeats, "maker at row {}", i);
            assert_eq!(row.model.is_empty(), model_repeats, "model at row {}", i);
        }
    }

    #[test]
    fn test_first_row_never_blanked() {
        let mut rows = labels(&[("Kia", "K5")]);
        blank_repeated_labels(&mut rows);
        assert_eq!(rows[0].maker, "Kia");
        assert_eq!(rows[0].model, "K5");
    }

    // ==========================================================================
    // DETERMINISM
    // ==========================================================================

    #[test]
    fn test_pivot_is_deterministic() {
        let s = Summary::new(1000.0, 900.0, 1100.0, 5.0);
        let rows = vec![
            stat_row("Kia", "K5", "~9만km", "~4년", s),
            stat_row("Hyundai", "Avante", "~3만km", "~1년", s),
            stat_row("Kia", "K3", "~6만km", "7~10년", s),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let a = grid_of(&rows, &PivotConfig::default());
        let b = grid_of(&rows, &PivotConfig::default());
        let c = grid_of(&reversed, &PivotConfig::default());
        assert_eq!(a, b);
        assert_eq!(a, c, "input order must not change the grid");
    }
}
