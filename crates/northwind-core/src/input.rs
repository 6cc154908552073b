use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

/// Extract file stems tried in order; the complete view wins over the basic one.
pub const DEFAULT_EXTRACT_STEMS: [&str; 2] = ["sales_analysis_complete", "sales_analysis"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no raw sales extract found; tried: {tried:?}")]
    NotFound { tried: Vec<PathBuf> },
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Polars {
        path: String,
        #[source]
        source: PolarsError,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedExtract {
    pub path: PathBuf,
    pub dataframe: DataFrame,
}

/// Directory of extract files produced by the upstream extraction stage.
#[derive(Debug, Clone)]
pub struct RawSalesSource {
    dir: PathBuf,
    stems: Vec<String>,
}

impl RawSalesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stems: DEFAULT_EXTRACT_STEMS.iter().map(|stem| stem.to_string()).collect(),
        }
    }

    pub fn with_stems(mut self, stems: Vec<String>) -> Self {
        self.stems = stems;
        self
    }

    fn candidates(&self) -> Vec<PathBuf> {
        self.stems
            .iter()
            .flat_map(|stem| {
                [
                    self.dir.join(format!("{stem}.csv")),
                    self.dir.join(format!("{stem}.parquet")),
                ]
            })
            .collect()
    }

    /// Reads the first candidate that exists.
    pub fn load(&self) -> Result<LoadedExtract, InputError> {
        let candidates = self.candidates();
        for path in &candidates {
            if !path.is_file() {
                debug!(path = %path.display(), "extract candidate not present");
                continue;
            }
            let dataframe = read_table(path)?;
            info!(
                path = %path.display(),
                rows = dataframe.height(),
                columns = dataframe.width(),
                "raw sales extract loaded"
            );
            return Ok(LoadedExtract {
                path: path.clone(),
                dataframe,
            });
        }
        Err(InputError::NotFound { tried: candidates })
    }
}

/// Reads a CSV (header row, inferred schema) or Parquet file by extension.
pub fn read_table(path: &Path) -> Result<DataFrame, InputError> {
    let polars_error = |source: PolarsError| InputError::Polars {
        path: path.display().to_string(),
        source,
    };

    let is_parquet = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        let file = File::open(path).map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;
        return ParquetReader::new(file).finish().map_err(polars_error);
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(polars_error)
}
