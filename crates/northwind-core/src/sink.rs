use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter};
use polars::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize table {table}: {source}")]
    Polars {
        table: String,
        #[source]
        source: PolarsError,
    },
    #[error("unknown output format '{0}' (expected csv or parquet)")]
    UnknownFormat(String),
}

/// Downstream consumer of named result tables.
pub trait OutputSink {
    fn write_table(&mut self, name: &str, table: &DataFrame) -> Result<(), SinkError>;
}

/// Keeps published tables in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub tables: BTreeMap<String, DataFrame>,
}

impl OutputSink for MemorySink {
    fn write_table(&mut self, name: &str, table: &DataFrame) -> Result<(), SinkError> {
        self.tables.insert(name.to_string(), table.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SinkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(SinkError::UnknownFormat(other.to_string())),
        }
    }
}

/// Writes each table to `<dir>/<name>.<ext>`. Files are staged under a
/// temporary name and renamed into place once fully written.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| SinkError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            format,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, self.format.extension()))
    }
}

impl DirectorySink {
    fn stage(&self, staging: &Path, name: &str, table: &DataFrame) -> Result<(), SinkError> {
        let mut file = File::create(staging).map_err(|source| SinkError::Io {
            path: staging.display().to_string(),
            source,
        })?;
        let polars_error = |source: PolarsError| SinkError::Polars {
            table: name.to_string(),
            source,
        };

        let mut frame = table.clone();
        match self.format {
            OutputFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut frame)
                    .map_err(polars_error)?;
            }
            OutputFormat::Parquet => {
                ParquetWriter::new(&mut file)
                    .with_compression(ParquetCompression::Zstd(None))
                    .finish(&mut frame)
                    .map(|_| ())
                    .map_err(polars_error)?;
            }
        }
        Ok(())
    }
}

impl OutputSink for DirectorySink {
    fn write_table(&mut self, name: &str, table: &DataFrame) -> Result<(), SinkError> {
        let target = self.path_for(name);
        let staging = self
            .dir
            .join(format!(".{}.{}.tmp", name, self.format.extension()));

        let result = self.stage(&staging, name, table).and_then(|()| {
            fs::rename(&staging, &target).map_err(|source| SinkError::Io {
                path: target.display().to_string(),
                source,
            })
        });
        if let Err(err) = result {
            if staging.exists() {
                if let Err(cleanup) = fs::remove_file(&staging) {
                    warn!(path = %staging.display(), error = %cleanup, "failed to remove staging file");
                }
            }
            return Err(err);
        }

        info!(table = name, rows = table.height(), path = %target.display(), "table written");
        self.written.push(target);
        Ok(())
    }
}
