pub mod aggregation;
pub mod coercion;
pub mod columns;
pub mod derived;
pub mod error;
pub mod imputation;
pub mod input;
pub mod options;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod summary;
pub mod temporal;
mod values;

pub use aggregation::{AggregateKind, Kpis};
pub use error::TransformError;
pub use input::{InputError, LoadedExtract, RawSalesSource};
pub use options::{AmountBuckets, OptionsError, TransformOptions};
pub use pipeline::{transform, TransformOutput, SALES_CLEAN};
pub use sink::{DirectorySink, MemorySink, OutputFormat, OutputSink, SinkError};
pub use summary::TransformSummary;
