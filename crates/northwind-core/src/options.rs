use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::columns::DEFAULT_DATE_COLUMNS;
use crate::error::TransformError;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse options: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Explicit configuration for a transform run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Date-named columns parsed by type coercion, when present.
    pub date_column_candidates: Vec<String>,
    pub amount_buckets: AmountBuckets,
    pub top_products_limit: usize,
    /// Sentinel written into missing categorical cells.
    pub unknown_label: String,
    /// Label for line totals that fall outside every bucket.
    pub unbucketed_label: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            date_column_candidates: DEFAULT_DATE_COLUMNS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            amount_buckets: AmountBuckets::default(),
            top_products_limit: 20,
            unknown_label: "Unknown".to_string(),
            unbucketed_label: "Unbucketed".to_string(),
        }
    }
}

impl TransformOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, OptionsError> {
        let content = fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        self.amount_buckets.validate()?;
        if self.top_products_limit == 0 {
            return Err(TransformError::InvalidOptions(
                "top_products_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered half-open `(lo, hi]` intervals over `LineTotal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountBuckets {
    pub edges: Vec<f64>,
    pub labels: Vec<String>,
}

impl Default for AmountBuckets {
    fn default() -> Self {
        Self {
            edges: vec![0.0, 100.0, 500.0, 1000.0, f64::INFINITY],
            labels: ["Small", "Medium", "Large", "Very Large"]
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }
}

impl AmountBuckets {
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.edges.len() < 2 {
            return Err(TransformError::InvalidOptions(
                "amount_buckets needs at least two edges".to_string(),
            ));
        }
        if self.labels.len() != self.edges.len() - 1 {
            return Err(TransformError::InvalidOptions(format!(
                "amount_buckets has {} edges but {} labels; expected {} labels",
                self.edges.len(),
                self.labels.len(),
                self.edges.len() - 1
            )));
        }
        if self.edges.iter().any(|edge| edge.is_nan())
            || self.edges.windows(2).any(|pair| pair[0] >= pair[1])
        {
            return Err(TransformError::InvalidOptions(
                "amount_buckets edges must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Label of the interval containing `value`, or `None` when no interval does.
    pub fn classify(&self, value: f64) -> Option<&str> {
        self.edges
            .windows(2)
            .zip(&self.labels)
            .find(|(bounds, _)| value > bounds[0] && value <= bounds[1])
            .map(|(_, label)| label.as_str())
    }
}
