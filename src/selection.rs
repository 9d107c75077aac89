//! Cascading manufacturer → model → fuel selection
//!
//! Each picker's options are the distinct, non-missing values among rows that
//! match every choice above it, sorted lexicographically. Changing a parent
//! choice invalidates the choices below it.

use crate::table::{StatRow, StatTable};
use std::collections::BTreeSet;

/// The in-progress drill-down. `Selection::default()` is the empty state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub maker: Option<String>,
    pub model: Option<String>,
    pub fuel: Option<String>,
}

/// Option lists for all three pickers under a given selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choices {
    pub makers: Vec<String>,
    pub models: Vec<String>,
    pub fuels: Vec<String>,
}

impl Selection {
    pub fn new(maker: &str, model: &str, fuel: &str) -> Self {
        Self {
            maker: Some(maker.to_string()),
            model: Some(model.to_string()),
            fuel: Some(fuel.to_string()),
        }
    }

    /// Choose a manufacturer. A different manufacturer clears model and fuel.
    pub fn with_maker(self, maker: impl Into<String>) -> Self {
        let maker = maker.into();
        if self.maker.as_deref() == Some(maker.as_str()) {
            return self;
        }
        Self {
            maker: Some(maker),
            model: None,
            fuel: None,
        }
    }

    /// Choose a model. A different model clears fuel.
    pub fn with_model(self, model: impl Into<String>) -> Self {
        let model = model.into();
        if self.model.as_deref() == Some(model.as_str()) {
            return self;
        }
        Self {
            model: Some(model),
            fuel: None,
            ..self
        }
    }

    pub fn with_fuel(self, fuel: impl Into<String>) -> Self {
        Self {
            fuel: Some(fuel.into()),
            ..self
        }
    }

    /// True when all three levels are chosen.
    pub fn is_complete(&self) -> bool {
        self.maker.is_some() && self.model.is_some() && self.fuel.is_some()
    }

    /// Drop every choice that is not in its option list, and everything
    /// below it.
    pub fn sanitize(self, table: &StatTable) -> Self {
        let Some(maker) = self.maker.filter(|m| maker_options(table).contains(m)) else {
            return Self::default();
        };
        let Some(model) = self.model.filter(|m| model_options(table, &maker).contains(m)) else {
            return Self {
                maker: Some(maker),
                ..Self::default()
            };
        };
        let fuel = self
            .fuel
            .filter(|f| fuel_options(table, &maker, &model).contains(f));
        Self {
            maker: Some(maker),
            model: Some(model),
            fuel,
        }
    }

    /// Option lists for each picker. Levels below an unset choice are empty.
    pub fn choices(&self, table: &StatTable) -> Choices {
        let makers = maker_options(table);
        let models = match &self.maker {
            Some(maker) => model_options(table, maker),
            None => Vec::new(),
        };
        let fuels = match (&self.maker, &self.model) {
            (Some(maker), Some(model)) => fuel_options(table, maker, model),
            _ => Vec::new(),
        };
        Choices {
            makers,
            models,
            fuels,
        }
    }
}

fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = Option<&'a String>>,
{
    values
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn matches(value: &Option<String>, wanted: &str) -> bool {
    value.as_deref() == Some(wanted)
}

/// Every manufacturer in the table.
pub fn maker_options(table: &StatTable) -> Vec<String> {
    distinct(table.rows().iter().map(|r| r.maker.as_ref()))
}

/// Models offered for `maker`.
pub fn model_options(table: &StatTable, maker: &str) -> Vec<String> {
    distinct(
        table
            .rows()
            .iter()
            .filter(|r| matches(&r.maker, maker))
            .map(|r| r.detailed_model.as_ref()),
    )
}

/// Fuels offered for `maker` + `model`.
pub fn fuel_options(table: &StatTable, maker: &str, model: &str) -> Vec<String> {
    distinct(
        table
            .rows()
            .iter()
            .filter(|r| matches(&r.maker, maker) && matches(&r.detailed_model, model))
            .map(|r| r.fuel.as_ref()),
    )
}

/// Rows matching all three choices. An incomplete selection matches nothing.
pub fn filter_rows<'a>(table: &'a StatTable, selection: &Selection) -> Vec<&'a StatRow> {
    let (Some(maker), Some(model), Some(fuel)) =
        (&selection.maker, &selection.model, &selection.fuel)
    else {
        return Vec::new();
    };

    table
        .rows()
        .iter()
        .filter(|r| {
            matches(&r.maker, maker) && matches(&r.detailed_model, model) && matches(&r.fuel, fuel)
        })
        .collect()
}
