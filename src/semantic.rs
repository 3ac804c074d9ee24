//! # Semantic Validation
//!
//! Checks the split measure grid against the time signature. Violations are
//! reported with 1-based measure numbers, matching what a musician counts.

use crate::ast::{Measure, TimeSignature};
use crate::error::RhythmError;

/// Validate measure lengths against the time signature.
///
/// Every measure except the last must total exactly `ticks_per_measure`;
/// the last may be shorter (an unfinished rhythm under edit) but never
/// longer. Returns the first violation found.
pub fn validate(measures: &[Measure], time_signature: &TimeSignature) -> Result<(), RhythmError> {
    let expected = time_signature.ticks_per_measure();
    for (index, measure) in measures.iter().enumerate() {
        let last = index + 1 == measures.len();
        let actual = measure.total_duration;
        if actual > expected || (!last && actual < expected) {
            return Err(RhythmError::MeasureLength {
                measure: index + 1,
                actual,
                expected,
            });
        }
    }
    Ok(())
}
