//! # Measure Splitter
//!
//! Groups raw notes into measures and resolves ties.
//!
//! A measure closes at a barline, at a filler symbol, or when a note is
//! split across its boundary. It does NOT close just because its tick total
//! reaches capacity: barline-less over-length input accumulates into one
//! over-full measure, which is exactly what the validator reports. The
//! repeat expanders always emit explicit barlines between playings, so
//! expanded text still closes where it should.
//!
//! A note longer than the space left in a partially filled measure is split
//! into tied fragments. Each fragment keeps `tied_duration` equal to the
//! original undivided tick count, so a fragment split again (a note longer
//! than a whole measure) still points back at the original.

use std::collections::VecDeque;

use crate::ast::{Measure, Note};

/// Group raw notes (as produced by the tokenizer) into measures of
/// `ticks_per_measure` capacity.
///
/// Barline and filler markers are consumed here; a filler occupies one
/// whole measure of its own, closing any measure open before it. The final
/// measure may be under-full and is left unpadded.
pub(crate) fn split_measures(notes: Vec<Note>, ticks_per_measure: u32) -> Vec<Measure> {
    let mut queue: VecDeque<Note> = notes.into();
    let mut measures = Vec::new();
    let mut current: Vec<Note> = Vec::new();
    let mut acc = 0u32;

    let close = |current: &mut Vec<Note>, acc: &mut u32, measures: &mut Vec<Measure>| {
        if *acc < ticks_per_measure {
            current.push(Note::rest(ticks_per_measure - *acc));
        }
        measures.push(Measure::new(std::mem::take(current)));
        *acc = 0;
    };

    while let Some(mut note) = queue.pop_front() {
        if note.is_barline {
            if !current.is_empty() {
                close(&mut current, &mut acc, &mut measures);
            }
            continue;
        }
        if note.is_measure_filler {
            if !current.is_empty() {
                close(&mut current, &mut acc, &mut measures);
            }
            note.retime(ticks_per_measure);
            measures.push(Measure::new(vec![note]));
            continue;
        }

        let duration = note.duration_in_sixteenths;
        let remaining = ticks_per_measure.saturating_sub(acc);
        if remaining > 0 && duration > remaining {
            // Straddles the boundary: fill the measure with a tied head and
            // requeue the tail against the next, empty measure.
            let original = note.tied_duration.unwrap_or(duration);
            let mut tail = note.clone();
            note.retime(remaining);
            note.is_tied_to = true;
            note.tied_duration = Some(original);
            current.push(note);
            measures.push(Measure::new(std::mem::take(&mut current)));
            acc = 0;
            tail.retime(duration - remaining);
            tail.is_tied_from = true;
            tail.is_tied_to = false;
            tail.tied_duration = Some(original);
            queue.push_front(tail);
            continue;
        }

        acc += duration;
        current.push(note);
    }

    if !current.is_empty() {
        measures.push(Measure::new(current));
    }
    measures
}
