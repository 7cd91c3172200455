//! Per-segment engine invocation: stream-copy one plan entry out of the
//! staged source and read the bytes back.
//!
//! Failures here are segment-local. A bad seek or corrupt range produces a
//! failed [`SegmentResult`] for that entry only; siblings still run. The
//! engine-side output file is deleted after the read on both paths.

use crate::engine::TranscodeEngine;
use crate::error::SegmentFailure;
use crate::planner::PlanEntry;

/// Outcome of cutting one plan entry.
#[derive(Debug)]
pub enum SegmentResult {
    Produced {
        index: usize,
        name: String,
        bytes: Vec<u8>,
    },
    Failed(SegmentFailure),
}

/// Seconds formatted for an FFmpeg argument: integral values without a
/// fractional part, others with millisecond precision.
fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.3}", value)
    }
}

/// Stream-copy extraction args for one entry. `-ss` after `-i` is an
/// output-side seek, so cut points snap to the container sync point at or
/// before the requested start. No re-encoding.
pub fn build_cut_args(input_name: &str, entry: &PlanEntry, output_name: &str) -> Vec<String> {
    vec![
        "-nostdin".to_string(),
        "-i".to_string(),
        input_name.to_string(),
        "-ss".to_string(),
        format_seconds(entry.start),
        "-t".to_string(),
        format_seconds(entry.length),
        "-c".to_string(),
        "copy".to_string(),
        output_name.to_string(),
    ]
}

/// Cut one segment. Never propagates an engine error: the result carries
/// either the segment bytes or the per-entry failure.
pub fn cut<E: TranscodeEngine + ?Sized>(
    engine: &E,
    input_name: &str,
    entry: &PlanEntry,
    output_name: &str,
) -> SegmentResult {
    log::debug!(
        target: "vidsplit::invoker",
        "Cutting segment {} ({}s + {}s) -> {}",
        entry.index,
        entry.start,
        entry.length,
        output_name
    );

    let args = build_cut_args(input_name, entry, output_name);
    let produced = engine
        .exec(&args)
        .and_then(|_| engine.read_file(output_name));

    // The output may not exist when exec failed; a delete error then is
    // expected and only logged.
    if let Err(e) = engine.delete_file(output_name) {
        log::debug!(
            target: "vidsplit::invoker",
            "Could not delete segment output {}: {}",
            output_name,
            e
        );
    }

    match produced {
        Ok(bytes) => SegmentResult::Produced {
            index: entry.index,
            name: output_name.to_string(),
            bytes,
        },
        Err(e) => {
            log::warn!(
                target: "vidsplit::invoker",
                "Segment {} failed: {}",
                entry.index,
                e
            );
            SegmentResult::Failed(SegmentFailure {
                index: entry.index,
                name: output_name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
