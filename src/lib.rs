//! # darbuka
//!
//! A parser for compact darbuka rhythm notation.
//!
//! Notation characters: `D` dum, `T` tak, `K` ka, `S` slap, `_` rest, with
//! `-` extending the previous sound by one sixteenth-note tick (`_` extends
//! rests). `|` is a barline, `%` repeats the previous measure, `content|xN`
//! repeats a chunk and `|: content :|` brackets a repeated section.
//!
//! The result is a flat, validated measure grid with repeat markers and a
//! per-measure mapping back to the source text, intended for a renderer, a
//! playback scheduler, and a linked-measure editor.
//!
//! ## Usage
//! ```
//! use darbuka::{parse_rhythm, TimeSignature};
//!
//! let rhythm = parse_rhythm("D---T-K-S---T-K-", &TimeSignature::default());
//! assert!(rhythm.is_valid);
//! assert_eq!(rhythm.measures.len(), 1);
//! assert_eq!(rhythm.measures[0].total_duration, 16);
//! ```
//!
//! Parsing never fails: malformed measure lengths surface as
//! `is_valid == false` plus a diagnostic in `error`, with the best-effort
//! grid still returned in full.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod meta;
pub mod semantic;

mod expand;
mod parser;
mod simile;
mod ticks;

pub use ast::{
    derive_source_mapping, Duration, Measure, MeasureDefinition, Note, ParsedRhythm, RepeatMarker,
    Sound, TimeSignature,
};
pub use error::RhythmError;
pub use meta::{split_header, Header};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::debug;

/// Parse notation text into a measure grid.
///
/// The three error tiers:
/// - measure-length violations are recoverable: the full result comes back
///   with `is_valid == false` and a diagnostic string,
/// - a panic anywhere in the pipeline (an implementation defect, never a
///   content problem) is caught and converted into an empty invalid result
///   carrying the panic message,
/// - empty or whitespace-only input is a valid empty rhythm.
pub fn parse_rhythm(source: &str, time_signature: &TimeSignature) -> ParsedRhythm {
    if source.trim().is_empty() {
        return ParsedRhythm::empty(time_signature.clone(), None);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(source, time_signature))) {
        Ok(result) => result,
        Err(payload) => ParsedRhythm::empty(time_signature.clone(), Some(panic_message(payload))),
    }
}

fn run_pipeline(source: &str, time_signature: &TimeSignature) -> ParsedRhythm {
    let ticks_per_measure = time_signature.ticks_per_measure();

    let chunks = expand::expand_chunk_repeats(source, ticks_per_measure);
    let expansion = expand::expand_section_repeats(chunks, ticks_per_measure);
    debug!(
        "expanded {} source bytes to {} bytes, {} mapped measures, {} repeat markers",
        source.len(),
        expansion.text.len(),
        expansion.mapping.len(),
        expansion.repeats.len()
    );

    let notes = lexer::tokenize(&expansion.text);
    let mut measures = parser::split_measures(notes, ticks_per_measure);

    let mut repeats = expansion.repeats;
    repeats.extend(simile::resolve_similes(&mut measures));
    simile::detect_implicit_repeats(&measures, &mut repeats);

    let error = semantic::validate(&measures, time_signature).err();
    if let Some(err) = &error {
        debug!("validation failed: {err}");
    }

    let measure_mapping = reconcile_mapping(expansion.mapping, measures.len());
    let measure_source_mapping = derive_source_mapping(&repeats, measures.len());

    ParsedRhythm {
        measures,
        time_signature: time_signature.clone(),
        is_valid: error.is_none(),
        error: error.map(|e| e.to_string()),
        repeats,
        measure_source_mapping,
        measure_mapping,
    }
}

/// Force the mapping to one entry per final measure.
///
/// The expanders count measures on raw text; tie splits and over-full
/// measures can make the splitter's count differ. Extra entries are
/// dropped, missing ones repeat the last known definition.
fn reconcile_mapping(mut mapping: Vec<MeasureDefinition>, count: usize) -> Vec<MeasureDefinition> {
    mapping.truncate(count);
    while mapping.len() < count {
        let filler = mapping.last().copied().unwrap_or(MeasureDefinition {
            source_measure_index: 0,
            source_string_index: 0,
        });
        mapping.push(filler);
    }
    mapping
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal parser error".to_string()
    }
}
