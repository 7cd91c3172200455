//! Segment boundary planning. Pure: identical inputs always yield the same
//! plan, and no engine work happens here.

use crate::error::SplitError;

/// Policy bounds for the requested segment length, in whole seconds.
pub const MIN_SEGMENT_SECS: u32 = 5;
pub const MAX_SEGMENT_SECS: u32 = 600;

/// One planned segment. `start + length` may overrun the source duration on
/// the last entry; the engine clips the actual output.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    /// 1-based ordinal, also used in the output file name.
    pub index: usize,
    /// Seconds from the start of the source.
    pub start: f64,
    /// Requested segment duration in seconds.
    pub length: f64,
}

/// Reject segment lengths outside the policy bounds. Called before any
/// engine work so bad input never spawns a process.
pub fn validate_segment_secs(segment_secs: u32) -> Result<(), SplitError> {
    if !(MIN_SEGMENT_SECS..=MAX_SEGMENT_SECS).contains(&segment_secs) {
        return Err(SplitError::planning(format!(
            "segment length must be between {} and {} seconds, got {}",
            MIN_SEGMENT_SECS, MAX_SEGMENT_SECS, segment_secs
        )));
    }
    Ok(())
}

/// Compute the ordered segment plan: `ceil(total / len)` contiguous,
/// gapless entries with a fixed stride.
pub fn plan(total_duration: f64, segment_secs: u32) -> Result<Vec<PlanEntry>, SplitError> {
    validate_segment_secs(segment_secs)?;
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(SplitError::planning(format!(
            "source duration must be positive, got {}",
            total_duration
        )));
    }

    let length = f64::from(segment_secs);
    let count = (total_duration / length).ceil() as usize;
    Ok((1..=count)
        .map(|index| PlanEntry {
            index,
            start: (index - 1) as f64 * length,
            length,
        })
        .collect())
}
