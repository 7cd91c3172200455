//! Job-level error taxonomy. Fatal errors end the job; per-segment failures
//! are recorded as [`SegmentFailure`] warnings and the job continues.

use crate::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("could not determine source duration: {reason}")]
    Probe { reason: String },

    #[error("{0}")]
    Planning(String),

    #[error("unsupported input type: {0}")]
    UnsupportedInput(String),

    #[error("transcoding engine unavailable: {0}")]
    EngineUnavailable(#[source] EngineError),

    #[error("duplicate archive entry: {0}")]
    DuplicateName(String),

    #[error("no segments were produced")]
    EmptyArchive,

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Aborted")]
    Aborted,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl SplitError {
    pub fn probe(reason: impl Into<String>) -> Self {
        Self::Probe {
            reason: reason.into(),
        }
    }

    pub fn planning(reason: impl Into<String>) -> Self {
        Self::Planning(reason.into())
    }
}

impl serde::Serialize for SplitError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Record of one segment that failed to cut or read. Non-fatal: the segment
/// is absent from the archive and the job continues.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFailure {
    pub index: usize,
    pub name: String,
    pub reason: String,
}
