//! Job orchestration: probe, plan, cut each segment in order, assemble the
//! archive, and report progress.
//!
//! One [`Splitter`] owns one engine, and `run` takes `&mut self`, so two
//! jobs can never execute against the same engine at once. Stages run
//! strictly sequentially; the cancel flag is checked between segments,
//! never mid-segment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::archive::ArchiveBuilder;
use crate::engine::{EngineError, TranscodeEngine};
use crate::error::{SegmentFailure, SplitError};
use crate::invoker::{self, SegmentResult};
use crate::naming;
use crate::planner;

/// Share of the progress bar reserved for probe + plan, segment work, and
/// archive finalization. Staging the input reports `STAGED_PERCENT`.
const STAGED_PERCENT: u8 = 5;
const PLANNED_PERCENT: u8 = 10;
const PROCESSING_SPAN: f64 = 85.0;
const FINALIZING_PERCENT: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Probing,
    Planning,
    Processing,
    Finalizing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

/// State of one in-flight job. Mutated only by the orchestrator; status
/// transitions are monotonic except `Failed`, which is terminal from any
/// non-terminal state. `processed_segments` counts every plan entry the
/// job has finished with, including ones that failed.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    pub status: JobStatus,
    pub processed_segments: usize,
    pub total_segments: usize,
    pub progress_percent: u8,
    pub last_error: Option<String>,
}

impl JobState {
    fn idle() -> Self {
        Self {
            status: JobStatus::Idle,
            processed_segments: 0,
            total_segments: 0,
            progress_percent: 0,
            last_error: None,
        }
    }
}

/// Snapshot handed to the progress callback. Percent is an integer 0..=100
/// and never decreases within one run.
#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub status: JobStatus,
    pub percent: u8,
    pub processed_segments: usize,
    pub total_segments: usize,
}

/// Input for one job: the source bytes plus the name they arrived under.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub file_name: String,
    pub data: Vec<u8>,
    pub segment_secs: u32,
}

/// Successful job result. `warnings` lists segments that failed and are
/// therefore absent from the archive.
#[derive(Debug)]
pub struct SplitOutcome {
    pub archive: Vec<u8>,
    pub segment_count: usize,
    pub warnings: Vec<SegmentFailure>,
}

pub struct Splitter<E> {
    engine: E,
    cancel: Arc<AtomicBool>,
    state: JobState,
}

impl<E: TranscodeEngine> Splitter<E> {
    /// Take exclusive ownership of the engine for this splitter's lifetime.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cancel: Arc::new(AtomicBool::new(false)),
            state: JobState::idle(),
        }
    }

    /// Flag checked between segments. Setting it makes the running job stop
    /// before the next segment and fail with `Aborted`; an in-flight
    /// segment is never interrupted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Run one job to completion. Blocks until the archive is produced or
    /// the job fails; progress arrives through `on_progress`.
    pub fn run(
        &mut self,
        request: &SplitRequest,
        mut on_progress: impl FnMut(JobProgress),
    ) -> Result<SplitOutcome, SplitError> {
        self.state = JobState::idle();
        self.cancel.store(false, Ordering::Relaxed);

        let result = self.run_inner(request, &mut on_progress);
        if let Err(e) = &result {
            log::error!(target: "vidsplit::pipeline", "Job failed: {}", e);
            self.state.status = JobStatus::Failed;
            self.state.last_error = Some(e.to_string());
            on_progress(self.snapshot());
        }
        result
    }

    fn run_inner(
        &mut self,
        request: &SplitRequest,
        on_progress: &mut dyn FnMut(JobProgress),
    ) -> Result<SplitOutcome, SplitError> {
        planner::validate_segment_secs(request.segment_secs)?;
        if !naming::is_supported_video(&request.file_name) {
            return Err(SplitError::UnsupportedInput(request.file_name.clone()));
        }
        if request.data.is_empty() {
            return Err(SplitError::probe("input is empty"));
        }

        let stem = naming::sanitize_stem(&request.file_name);
        let input_name = naming::staged_input_name(&stem);
        log::info!(
            target: "vidsplit::pipeline",
            "Starting job: {} ({} bytes, {}s segments)",
            input_name,
            request.data.len(),
            request.segment_secs
        );

        self.transition(JobStatus::Probing, on_progress);
        self.engine
            .write_file(&input_name, &request.data)
            .map_err(SplitError::EngineUnavailable)?;

        // The staged source outlives every segment cut; remove it on all
        // exits from here on.
        let result = self.process_staged(&stem, &input_name, request, on_progress);
        if let Err(e) = self.engine.delete_file(&input_name) {
            log::debug!(
                target: "vidsplit::pipeline",
                "Could not delete staged input {}: {}",
                input_name,
                e
            );
        }
        result
    }

    fn process_staged(
        &mut self,
        stem: &str,
        input_name: &str,
        request: &SplitRequest,
        on_progress: &mut dyn FnMut(JobProgress),
    ) -> Result<SplitOutcome, SplitError> {
        self.report(STAGED_PERCENT, on_progress);

        let total_duration = self
            .engine
            .probe_duration(input_name)
            .map_err(probe_error)?;

        self.transition(JobStatus::Planning, on_progress);
        let plan = planner::plan(total_duration, request.segment_secs)?;
        self.state.total_segments = plan.len();
        self.report(PLANNED_PERCENT, on_progress);
        log::info!(
            target: "vidsplit::pipeline",
            "Planned {} segments over {:.2}s",
            plan.len(),
            total_duration
        );

        self.transition(JobStatus::Processing, on_progress);
        let mut archive = ArchiveBuilder::new();
        let mut warnings = Vec::new();
        let total = plan.len();
        for entry in &plan {
            if self.cancel.load(Ordering::Relaxed) {
                log::info!(
                    target: "vidsplit::pipeline",
                    "Cancelled before segment {}",
                    entry.index
                );
                return Err(SplitError::Aborted);
            }

            let output_name = naming::segment_name(stem, entry.index);
            match invoker::cut(&self.engine, input_name, entry, &output_name) {
                SegmentResult::Produced { name, bytes, .. } => {
                    archive.add(&name, &bytes)?;
                }
                SegmentResult::Failed(failure) => {
                    warnings.push(failure);
                }
            }
            self.state.processed_segments = entry.index;
            let percent = f64::from(PLANNED_PERCENT)
                + (entry.index as f64 / total as f64) * PROCESSING_SPAN;
            self.report(percent.round() as u8, on_progress);
        }

        self.transition(JobStatus::Finalizing, on_progress);
        self.report(FINALIZING_PERCENT, on_progress);
        let segment_count = archive.len();
        let bytes = archive.finalize()?;

        self.state.status = JobStatus::Done;
        self.report(100, on_progress);
        log::info!(
            target: "vidsplit::pipeline",
            "Job done: {} segments archived, {} failed",
            segment_count,
            warnings.len()
        );
        Ok(SplitOutcome {
            archive: bytes,
            segment_count,
            warnings,
        })
    }

    fn transition(&mut self, status: JobStatus, on_progress: &mut dyn FnMut(JobProgress)) {
        self.state.status = status;
        on_progress(self.snapshot());
    }

    /// Monotonic: a lower value than already reported is clamped up.
    fn report(&mut self, percent: u8, on_progress: &mut dyn FnMut(JobProgress)) {
        self.state.progress_percent = self.state.progress_percent.max(percent.min(100));
        on_progress(self.snapshot());
    }

    fn snapshot(&self) -> JobProgress {
        JobProgress {
            status: self.state.status,
            percent: self.state.progress_percent,
            processed_segments: self.state.processed_segments,
            total_segments: self.state.total_segments,
        }
    }
}

/// Probe failures where the engine itself is unusable are fatal engine
/// errors; everything else is a probe failure on this source.
fn probe_error(e: EngineError) -> SplitError {
    match e {
        EngineError::NotLoaded | EngineError::NotFound(_) => SplitError::EngineUnavailable(e),
        other => SplitError::probe(other.to_string()),
    }
}
