//! pricegrid - Used-car price distribution dashboard
//!
//! pricegrid loads a spreadsheet of pre-aggregated used-car transfer
//! statistics (MOLIT transfer data) and pivots it into a table of average
//! price or depreciation rate, min/max range and transfer count across
//! vehicle-age and mileage buckets.
//!
//! # Pipeline
//!
//! 1. **Load**: read `.xlsx`/`.csv` into a [`StatTable`] (cached per path).
//! 2. **Select**: cascading manufacturer → model → fuel [`Selection`].
//! 3. **Pivot**: group the filtered rows into a fixed-shape [`PivotGrid`].
//! 4. **Render**: emit the grid as HTML, served or written to a file.
//!
//! # Quick Start
//!
//! ```no_run
//! use pricegrid::{load_table, pivot, filter_rows, PivotConfig, PivotOutcome, Selection};
//!
//! let table = load_table("국토부_pricerange_국산_연료추가.xlsx").unwrap();
//! let selection = Selection::new("현대", "아반떼", "가솔린");
//! let rows = filter_rows(&table, &selection);
//!
//! match pivot(&rows, &PivotConfig::default()) {
//!     PivotOutcome::Grid(grid) => println!("{} rows", grid.rows.len()),
//!     PivotOutcome::NoData => println!("선택한 조건에 해당하는 데이터가 없습니다."),
//! }
//! ```
//!
//! # Cell Format
//!
//! | Data in the cell | Rendered as |
//! |------------------|-------------|
//! | mean, min, max and count present | `<b>1,000</b><br>(900 ~ 1,100)<br>[5건]` |
//! | any of the four missing | `-` |
//!
//! # Modules
//!
//! - [`buckets`]: fixed mileage and age orderings
//! - [`table`]: data model, loader and cache
//! - [`selection`]: cascading pickers and row filter
//! - [`pivot`]: pivot/format engine
//! - [`report`]: HTML rendering
//! - [`serve`]: interactive dashboard server

pub mod buckets;
pub mod error;
pub mod pivot;
pub mod report;
pub mod selection;
pub mod serve;
pub mod table;

pub use buckets::AgeScale;
pub use error::LoadError;
pub use pivot::{pivot, PivotConfig, PivotGrid, PivotOutcome};
pub use selection::{filter_rows, Selection};
pub use table::{load_table, Measure, StatRow, StatTable, Summary, TableCache};
