//! Transcoding engine contract and its FFmpeg-backed implementation.
//!
//! The pipeline consumes the engine through a narrow file-plus-exec surface:
//! stage bytes under a virtual name, run one command against them, read the
//! result back, delete it. Names are engine-virtual (no path separators);
//! where they land on disk is an engine detail.

pub mod discovery;
mod ffmpeg;

pub use ffmpeg::FfmpegEngine;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine not loaded")]
    NotLoaded,

    #[error("{0}")]
    NotFound(String),

    #[error("invalid engine file name: {0}")]
    BadName(String),

    #[error("FFmpeg failed (code {code}): {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("probe timed out after {0}s")]
    Timeout(u64),

    #[error("unusable probe output: {0}")]
    Probe(String),

    #[error("Aborted")]
    Aborted,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::Failed {
            code,
            stderr: stderr.into(),
        }
    }
}

/// One stateful engine instance. Commands must not run concurrently: the
/// engine is a single shared resource and callers sequence all operations.
pub trait TranscodeEngine {
    /// Resolve and initialize engine resources. Must succeed before any
    /// other operation; everything else fails with [`EngineError::NotLoaded`]
    /// until it does.
    fn load(&mut self) -> Result<(), EngineError>;

    /// Stage `bytes` under a virtual file name.
    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    /// Run one FFmpeg command. File arguments refer to virtual names.
    fn exec(&self, args: &[String]) -> Result<(), EngineError>;

    /// Read a staged or produced file back.
    fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError>;

    /// Remove a staged or produced file.
    fn delete_file(&self, name: &str) -> Result<(), EngineError>;

    /// Total duration of a staged media file, in seconds. Bounded wait:
    /// implementations enforce their probe timeout and fail rather than hang.
    fn probe_duration(&self, name: &str) -> Result<f64, EngineError>;
}
