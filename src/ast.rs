//! # Rhythm Data Model
//!
//! This module defines all type structures for parsed darbuka rhythms.
//!
//! ## Type Hierarchy
//! ```text
//! ParsedRhythm
//!   ├── Vec<Measure>
//!   │     ├── Vec<Note>
//!   │     │     ├── sound: Sound (dum | tak | ka | slap | rest | simile)
//!   │     │     ├── duration: Duration (display category)
//!   │     │     ├── duration_in_sixteenths: u32 (ground truth)
//!   │     │     ├── is_dotted: bool
//!   │     │     ├── is_tied_from / is_tied_to: bool
//!   │     │     ├── tied_duration: Option<u32>
//!   │     │     ├── is_measure_filler: bool
//!   │     │     └── is_barline: bool
//!   │     └── total_duration: u32
//!   ├── time_signature: TimeSignature
//!   ├── is_valid: bool
//!   ├── error: Option<String>
//!   ├── repeats: Vec<RepeatMarker>
//!   ├── measure_source_mapping: HashMap<measure, source measure>
//!   └── measure_mapping: Vec<MeasureDefinition>
//! ```
//!
//! ## Key Concepts
//!
//! ### Ticks
//! One tick is one sixteenth note, the smallest time quantum. A note's
//! `duration_in_sixteenths` is authoritative; `duration` + `is_dotted` are a
//! display-friendly view derived from it and may round down (a 13-tick note
//! shows as a sixteenth but still occupies 13 ticks).
//!
//! ### Ghost measures
//! Repeat expansion duplicates measures. Every duplicated ("ghost") measure
//! carries the same `MeasureDefinition` as its source measure, so an editor
//! can redirect edits on any copy back to the one place in the source text
//! that produced it.
//!
//! ### Ties
//! A note split across a measure boundary becomes linked fragments:
//! `is_tied_to` on the fragment before the boundary, `is_tied_from` on the
//! one after, with `tied_duration` holding the original undivided tick count
//! on every fragment.
//!
//! ## Related Modules
//! - `lexer` - Creates raw Notes from notation text
//! - `parser` - Groups Notes into Measures
//! - `expand` - Produces RepeatMarkers and MeasureDefinitions
//! - `semantic` - Validates Measures against the TimeSignature

use serde::Serialize;
use std::collections::HashMap;

use crate::error::RhythmError;

/// Ticks in one whole note (and in one `%` simile symbol).
pub const WHOLE_NOTE_TICKS: u32 = 16;

/// Time signature (e.g., 4/4, 3/4, 6/8) with an optional explicit
/// beat-grouping override for renderers.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
    /// Explicit beat grouping in ticks (e.g., `[6, 6, 4]` for 2+2+2+4
    /// eighths in 8/8). `None` derives a conventional grouping.
    pub beat_grouping: Option<Vec<u32>>,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
            beat_grouping: None,
        }
    }
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
            beat_grouping: None,
        }
    }

    /// Parse a time signature string like "4/4" or "7/8".
    ///
    /// The denominator must be a power of two no larger than sixteen so the
    /// measure capacity is a whole number of ticks.
    pub fn from_str(s: &str) -> Result<Self, RhythmError> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 2 {
            return Err(RhythmError::InvalidTimeSignature(s.to_string()));
        }
        let numerator: u8 = parts[0]
            .parse()
            .map_err(|_| RhythmError::InvalidTimeSignature(s.to_string()))?;
        let denominator: u8 = parts[1]
            .parse()
            .map_err(|_| RhythmError::InvalidTimeSignature(s.to_string()))?;
        if numerator == 0 || !matches!(denominator, 1 | 2 | 4 | 8 | 16) {
            return Err(RhythmError::InvalidTimeSignature(s.to_string()));
        }
        Ok(Self::new(numerator, denominator))
    }

    /// Capacity of one measure in sixteenth-note ticks.
    pub fn ticks_per_measure(&self) -> u32 {
        self.numerator as u32 * WHOLE_NOTE_TICKS / self.denominator as u32
    }

    /// Beat grouping in ticks for renderers: the explicit override when set,
    /// dotted-quarter groups for compound x/8 signatures, otherwise one
    /// group per numerator count.
    pub fn grouping(&self) -> Vec<u32> {
        if let Some(grouping) = &self.beat_grouping {
            return grouping.clone();
        }
        if self.denominator == 8 && self.numerator % 3 == 0 {
            return vec![6; self.numerator as usize / 3];
        }
        let beat = WHOLE_NOTE_TICKS / self.denominator as u32;
        vec![beat; self.numerator as usize]
    }
}

/// Percussion sounds plus the two non-playable markers that flow through
/// the pipeline (rest and simile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    Dum,
    Tak,
    Ka,
    Slap,
    Rest,
    Simile,
}

impl Sound {
    /// Stable lowercase label, used for canonical measure keys.
    pub fn label(&self) -> &'static str {
        match self {
            Sound::Dum => "dum",
            Sound::Tak => "tak",
            Sound::Ka => "ka",
            Sound::Slap => "slap",
            Sound::Rest => "rest",
            Sound::Simile => "simile",
        }
    }
}

/// Display duration category, derived from a tick count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Duration {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl Duration {
    /// Quantize a tick count into a display category plus dotted flag.
    ///
    /// Tick counts that match no standard (possibly dotted) value fall back
    /// to a plain sixteenth; `duration_in_sixteenths` stays authoritative.
    pub fn from_sixteenths(ticks: u32) -> (Duration, bool) {
        match ticks {
            24 => (Duration::Whole, true),
            16 => (Duration::Whole, false),
            12 => (Duration::Half, true),
            8 => (Duration::Half, false),
            6 => (Duration::Quarter, true),
            4 => (Duration::Quarter, false),
            3 => (Duration::Eighth, true),
            2 => (Duration::Eighth, false),
            _ => (Duration::Sixteenth, false),
        }
    }
}

/// One playable or rest event, or one of the structural markers consumed
/// before measures are returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub sound: Sound,
    pub duration: Duration,
    pub duration_in_sixteenths: u32,
    pub is_dotted: bool,
    /// This fragment continues a note from the previous measure.
    pub is_tied_from: bool,
    /// This fragment continues into the next measure.
    pub is_tied_to: bool,
    /// Original undivided tick count, preserved across tie splits.
    pub tied_duration: Option<u32>,
    /// Consumes the remaining measure space; resolved away by the simile
    /// pass before the result is returned.
    pub is_measure_filler: bool,
    /// Forces a measure boundary; never appears in output measures.
    pub is_barline: bool,
}

impl Note {
    /// A playable event (or rest) of the given tick count.
    pub fn event(sound: Sound, ticks: u32) -> Self {
        let (duration, is_dotted) = Duration::from_sixteenths(ticks);
        Self {
            sound,
            duration,
            duration_in_sixteenths: ticks,
            is_dotted,
            is_tied_from: false,
            is_tied_to: false,
            tied_duration: None,
            is_measure_filler: false,
            is_barline: false,
        }
    }

    pub fn rest(ticks: u32) -> Self {
        Self::event(Sound::Rest, ticks)
    }

    /// The `%` symbol: a simile-sound filler spanning a whole measure.
    pub fn simile() -> Self {
        let mut note = Self::event(Sound::Simile, WHOLE_NOTE_TICKS);
        note.is_measure_filler = true;
        note
    }

    /// A zero-duration measure boundary marker.
    pub fn barline() -> Self {
        let mut note = Self::event(Sound::Rest, 0);
        note.is_barline = true;
        note
    }

    /// Resize this note, rederiving its display category.
    pub(crate) fn retime(&mut self, ticks: u32) {
        let (duration, is_dotted) = Duration::from_sixteenths(ticks);
        self.duration_in_sixteenths = ticks;
        self.duration = duration;
        self.is_dotted = is_dotted;
    }
}

/// An ordered run of notes filling (at most) one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub notes: Vec<Note>,
    /// Sum of the notes' tick counts.
    pub total_duration: u32,
}

impl Measure {
    pub fn new(notes: Vec<Note>) -> Self {
        let total_duration = notes.iter().map(|n| n.duration_in_sixteenths).sum();
        Self {
            notes,
            total_duration,
        }
    }
}

/// A repeat structure detected or expanded during parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RepeatMarker {
    /// A bracketed region replayed `repeat_count` additional times beyond
    /// its first playing. Indices refer to the first playing.
    #[serde(rename_all = "camelCase")]
    Section {
        start_measure: usize,
        end_measure: usize,
        repeat_count: u32,
    },
    /// One or more measures that are verbatim copies of `source_measure`,
    /// from simile symbols or detected textual duplication.
    #[serde(rename_all = "camelCase")]
    Measure {
        source_measure: usize,
        repeat_measures: Vec<usize>,
    },
}

/// For one final expanded measure: which original logical measure it copies
/// and the byte offset in the raw input where that content begins.
///
/// Ghost measures carry the same pair as their source measure, which is the
/// invariant that enables linked editing of repeated phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDefinition {
    pub source_measure_index: usize,
    pub source_string_index: usize,
}

/// The complete parse result. Produced fresh by every parse call and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRhythm {
    pub measures: Vec<Measure>,
    pub time_signature: TimeSignature,
    pub is_valid: bool,
    pub error: Option<String>,
    pub repeats: Vec<RepeatMarker>,
    /// Final measure index -> source measure index, for every ghost measure.
    /// Derived from `repeats`.
    pub measure_source_mapping: HashMap<usize, usize>,
    /// One entry per final measure; always the same length as `measures`.
    pub measure_mapping: Vec<MeasureDefinition>,
}

impl ParsedRhythm {
    /// An empty result: valid for empty input, invalid with a message for
    /// the defensive boundary around the pipeline.
    pub(crate) fn empty(time_signature: TimeSignature, error: Option<String>) -> Self {
        Self {
            measures: Vec::new(),
            time_signature,
            is_valid: error.is_none(),
            error,
            repeats: Vec::new(),
            measure_source_mapping: HashMap::new(),
            measure_mapping: Vec::new(),
        }
    }
}

/// Derive the ghost-measure redirect table from repeat markers.
///
/// `Measure` markers list their copies directly; `Section` markers imply
/// copies arithmetically, one span per extra playing laid out immediately
/// after the first playing.
pub fn derive_source_mapping(
    repeats: &[RepeatMarker],
    measure_count: usize,
) -> HashMap<usize, usize> {
    let mut mapping = HashMap::new();
    for marker in repeats {
        match marker {
            RepeatMarker::Measure {
                source_measure,
                repeat_measures,
            } => {
                for &ghost in repeat_measures {
                    if ghost < measure_count {
                        mapping.insert(ghost, *source_measure);
                    }
                }
            }
            RepeatMarker::Section {
                start_measure,
                end_measure,
                repeat_count,
            } => {
                let span = end_measure - start_measure + 1;
                for playing in 0..*repeat_count as usize {
                    for offset in 0..span {
                        let ghost = end_measure + 1 + playing * span + offset;
                        if ghost < measure_count {
                            mapping.insert(ghost, start_measure + offset);
                        }
                    }
                }
            }
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_measure() {
        assert_eq!(TimeSignature::new(4, 4).ticks_per_measure(), 16);
        assert_eq!(TimeSignature::new(3, 4).ticks_per_measure(), 12);
        assert_eq!(TimeSignature::new(6, 8).ticks_per_measure(), 12);
        assert_eq!(TimeSignature::new(7, 8).ticks_per_measure(), 14);
        assert_eq!(TimeSignature::new(2, 2).ticks_per_measure(), 16);
    }

    #[test]
    fn test_time_signature_from_str() {
        assert_eq!(
            TimeSignature::from_str("4/4").unwrap(),
            TimeSignature::new(4, 4)
        );
        assert_eq!(
            TimeSignature::from_str(" 9/8 ").unwrap(),
            TimeSignature::new(9, 8)
        );
        assert!(TimeSignature::from_str("4").is_err());
        assert!(TimeSignature::from_str("4/5").is_err());
        assert!(TimeSignature::from_str("0/4").is_err());
        assert!(TimeSignature::from_str("a/4").is_err());
    }

    #[test]
    fn test_grouping_simple_and_compound() {
        assert_eq!(TimeSignature::new(4, 4).grouping(), vec![4, 4, 4, 4]);
        assert_eq!(TimeSignature::new(6, 8).grouping(), vec![6, 6]);
        assert_eq!(TimeSignature::new(9, 8).grouping(), vec![6, 6, 6]);
        assert_eq!(TimeSignature::new(7, 8).grouping(), vec![2; 7]);
    }

    #[test]
    fn test_grouping_override_wins() {
        let mut ts = TimeSignature::new(8, 8);
        ts.beat_grouping = Some(vec![6, 6, 4]);
        assert_eq!(ts.grouping(), vec![6, 6, 4]);
    }

    #[test]
    fn test_duration_quantization() {
        assert_eq!(Duration::from_sixteenths(24), (Duration::Whole, true));
        assert_eq!(Duration::from_sixteenths(16), (Duration::Whole, false));
        assert_eq!(Duration::from_sixteenths(12), (Duration::Half, true));
        assert_eq!(Duration::from_sixteenths(8), (Duration::Half, false));
        assert_eq!(Duration::from_sixteenths(6), (Duration::Quarter, true));
        assert_eq!(Duration::from_sixteenths(4), (Duration::Quarter, false));
        assert_eq!(Duration::from_sixteenths(3), (Duration::Eighth, true));
        assert_eq!(Duration::from_sixteenths(2), (Duration::Eighth, false));
        assert_eq!(Duration::from_sixteenths(1), (Duration::Sixteenth, false));
        // Irregular counts fall back to sixteenth display.
        assert_eq!(Duration::from_sixteenths(13), (Duration::Sixteenth, false));
    }

    #[test]
    fn test_derive_source_mapping_measure_marker() {
        let repeats = vec![RepeatMarker::Measure {
            source_measure: 0,
            repeat_measures: vec![1, 2],
        }];
        let mapping = derive_source_mapping(&repeats, 3);
        assert_eq!(mapping.get(&1), Some(&0));
        assert_eq!(mapping.get(&2), Some(&0));
        assert_eq!(mapping.get(&0), None);
    }

    #[test]
    fn test_derive_source_mapping_section_marker() {
        // Two-measure section played three times total: measures 0-1 real,
        // 2-5 ghosts.
        let repeats = vec![RepeatMarker::Section {
            start_measure: 0,
            end_measure: 1,
            repeat_count: 2,
        }];
        let mapping = derive_source_mapping(&repeats, 6);
        assert_eq!(mapping.get(&2), Some(&0));
        assert_eq!(mapping.get(&3), Some(&1));
        assert_eq!(mapping.get(&4), Some(&0));
        assert_eq!(mapping.get(&5), Some(&1));
        assert!(!mapping.contains_key(&0));
        assert!(!mapping.contains_key(&1));
    }

    #[test]
    fn test_derive_source_mapping_ignores_out_of_range() {
        let repeats = vec![RepeatMarker::Measure {
            source_measure: 0,
            repeat_measures: vec![9],
        }];
        assert!(derive_source_mapping(&repeats, 3).is_empty());
    }
}
