use std::collections::BTreeSet;

use polars::prelude::DataFrame;

/// Outcome of asking the schema whether a step's input columns exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available(Vec<String>),
    Unavailable { missing: Vec<String> },
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

/// Set of column names known to exist on the table being transformed.
///
/// Probed once from the raw extract and extended as derived columns are
/// attached, so every stage asks the same descriptor instead of poking at the
/// frame directly.
#[derive(Debug, Clone, Default)]
pub struct SchemaCapabilities {
    present: BTreeSet<String>,
}

impl SchemaCapabilities {
    pub fn probe(df: &DataFrame) -> Self {
        let present = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        Self { present }
    }

    pub fn has(&self, column: &str) -> bool {
        self.present.contains(column)
    }

    pub fn require(&self, columns: &[&str]) -> Capability {
        let missing: Vec<String> = columns
            .iter()
            .filter(|column| !self.has(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Capability::Available(columns.iter().map(|column| column.to_string()).collect())
        } else {
            Capability::Unavailable { missing }
        }
    }

    pub(crate) fn record(&mut self, column: &str) {
        self.present.insert(column.to_string());
    }
}
