//! # Error Types
//!
//! All error types for the rhythm parser.
//!
//! Measure-length violations are recoverable: `parse_rhythm` never fails on
//! them, it surfaces their display string in `ParsedRhythm::error` alongside
//! the full best-effort result. The `Result`-returning entry points
//! (`TimeSignature::from_str`, `meta::split_header`) use these variants
//! directly.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RhythmError {
    /// The time signature string could not be parsed, or its denominator is
    /// not a power of two up to sixteen.
    ///
    /// # Example
    /// ```
    /// # use darbuka::RhythmError;
    /// let err = RhythmError::InvalidTimeSignature("4/5".to_string());
    /// assert_eq!(err.to_string(), "Invalid time signature: 4/5");
    /// ```
    #[error("Invalid time signature: {0}")]
    InvalidTimeSignature(String),

    /// The YAML front matter of a notation file is malformed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A measure's tick total does not match the time signature.
    ///
    /// # Example
    /// ```
    /// # use darbuka::RhythmError;
    /// let err = RhythmError::MeasureLength { measure: 1, actual: 18, expected: 16 };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Measure 1 has 18 sixteenth-note ticks, expected 16"
    /// );
    /// ```
    #[error("Measure {measure} has {actual} sixteenth-note ticks, expected {expected}")]
    MeasureLength {
        measure: usize,
        actual: u32,
        expected: u32,
    },
}
