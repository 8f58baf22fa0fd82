pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod interactive;
pub mod naming;
pub mod pipeline;
pub mod place;
pub mod records;

pub use config::Config;
pub use error::{PcsdlError, Result};
pub use pipeline::{process_row, ArtifactOutcome, RowOutcome, RunOptions, SkipSets};
