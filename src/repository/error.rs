use crate::stations::error::StationIndexError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Failed to list data directory '{0}'")]
    DataDirRead(PathBuf, #[source] std::io::Error),

    #[error("No rainfall file found for department {department} in '{data_dir}'")]
    NoDepartmentData {
        department: String,
        data_dir: PathBuf,
    },

    #[error("Failed to read CSV file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Failed processing rainfall data from '{path}'")]
    DataFrameProcessing {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Required column '{column}' missing in '{path}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution,

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWrite(PathBuf, #[source] PolarsError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("No dataset resource published for department {0}")]
    NoDatasetResource(String),

    #[error("Data download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    #[error("Failed to parse JSON data")]
    JsonParse(#[from] serde_json::Error),

    #[error("Observation cache '{path}' of department {department} is missing, import it again")]
    MissingObservationCache { department: String, path: PathBuf },

    #[error("Unknown station '{0}'")]
    UnknownStation(String),

    #[error(transparent)]
    StationIndex(#[from] StationIndexError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
