use std::io;

use thiserror::Error;

use crate::types::SourceId;

/// Error type for source decoding, IO, and configuration failures.
///
/// Row-level parse problems never surface here; they are counted and the
/// offending row is dropped.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },
    #[error("data source '{source_id}' returned inconsistent state: {details}")]
    SourceInconsistent {
        source_id: SourceId,
        details: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("csv decode failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("json decode failure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}
