use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Required dataset '{name}' not found at {path}")]
    MissingDataset { name: &'static str, path: PathBuf },

    #[error("Failed to read dataset '{name}': {source}")]
    Malformed {
        name: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Dataset '{name}', record {record}: {message}")]
    InvalidRecord {
        name: &'static str,
        record: usize,
        message: String,
    },
}
