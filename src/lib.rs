pub mod archive;
pub mod engine;
pub mod error;
pub mod invoker;
pub mod naming;
pub mod pipeline;
pub mod planner;
pub mod probe;

pub use engine::{EngineError, FfmpegEngine, TranscodeEngine};
pub use error::{SegmentFailure, SplitError};
pub use pipeline::{JobProgress, JobStatus, SplitOutcome, SplitRequest, Splitter};
pub use planner::PlanEntry;
