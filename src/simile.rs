//! # Simile & Implicit-Repeat Resolver
//!
//! Two passes over the split measures:
//!
//! 1. Every measure holding a `%` filler is replaced by a copy of the
//!    measure before it, recorded as a `Measure` repeat marker. A filler in
//!    the very first measure has nothing to copy and degrades to a plain
//!    rest measure instead (documented fallback, not an error).
//! 2. Runs of consecutive, textually identical measures not already covered
//!    by a repeat marker are grouped into additional `Measure` markers, so
//!    an editor can offer linked editing for rhythms written out longhand.
//!
//! Identity in pass two compares a canonical `sound:ticks` key per note.
//! Dotted status and tie flags are excluded from the key.

use std::collections::HashSet;

use crate::ast::{Measure, RepeatMarker, Sound};

/// Replace filler measures with copies of their predecessors.
pub(crate) fn resolve_similes(measures: &mut [Measure]) -> Vec<RepeatMarker> {
    let mut repeats = Vec::new();
    for i in 0..measures.len() {
        if !measures[i].notes.iter().any(|n| n.is_measure_filler) {
            continue;
        }
        if i == 0 {
            for note in &mut measures[0].notes {
                if note.is_measure_filler {
                    note.sound = Sound::Rest;
                    note.is_measure_filler = false;
                }
            }
            continue;
        }
        let copy = measures[i - 1].notes.clone();
        measures[i] = Measure::new(copy);
        repeats.push(RepeatMarker::Measure {
            source_measure: i - 1,
            repeat_measures: vec![i],
        });
    }
    repeats
}

/// Canonical identity key for one measure.
fn canonical_key(measure: &Measure) -> String {
    measure
        .notes
        .iter()
        .map(|n| format!("{}:{}", n.sound.label(), n.duration_in_sixteenths))
        .collect::<Vec<_>>()
        .join(",")
}

/// Measure indices already accounted for by a repeat marker, including
/// every playing a `Section` marker implies.
fn covered_indices(repeats: &[RepeatMarker], measure_count: usize) -> HashSet<usize> {
    let mut covered = HashSet::new();
    for marker in repeats {
        match marker {
            RepeatMarker::Measure {
                source_measure,
                repeat_measures,
            } => {
                covered.insert(*source_measure);
                covered.extend(repeat_measures.iter().copied());
            }
            RepeatMarker::Section {
                start_measure,
                end_measure,
                repeat_count,
            } => {
                let span = end_measure - start_measure + 1;
                let ghosts = *repeat_count as usize * span;
                for index in *start_measure..(end_measure + 1 + ghosts).min(measure_count) {
                    covered.insert(index);
                }
            }
        }
    }
    covered
}

/// Group maximal runs (length two or more) of identical uncovered measures
/// into `Measure` markers, appended to `repeats`.
pub(crate) fn detect_implicit_repeats(measures: &[Measure], repeats: &mut Vec<RepeatMarker>) {
    let covered = covered_indices(repeats, measures.len());
    let keys: Vec<String> = measures.iter().map(canonical_key).collect();
    let mut i = 0;
    while i < measures.len() {
        if covered.contains(&i) {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < measures.len() && !covered.contains(&j) && keys[j] == keys[i] {
            j += 1;
        }
        if j - i >= 2 {
            repeats.push(RepeatMarker::Measure {
                source_measure: i,
                repeat_measures: (i + 1..j).collect(),
            });
        }
        i = j;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::split_measures;

    fn split(text: &str) -> Vec<Measure> {
        split_measures(tokenize(text), 16)
    }

    #[test]
    fn test_simile_copies_previous_measure() {
        let mut measures = split("D-T-K-T-\n%");
        let repeats = resolve_similes(&mut measures);
        assert_eq!(measures[1], measures[0]);
        assert_eq!(
            repeats,
            vec![RepeatMarker::Measure {
                source_measure: 0,
                repeat_measures: vec![1],
            }]
        );
    }

    #[test]
    fn test_consecutive_similes_chain() {
        let mut measures = split("D-T-K-T-|%|%");
        let repeats = resolve_similes(&mut measures);
        assert_eq!(measures[1], measures[0]);
        assert_eq!(measures[2], measures[0]);
        assert_eq!(repeats.len(), 2);
    }

    #[test]
    fn test_leading_simile_degrades_to_rest() {
        let mut measures = split("%");
        let repeats = resolve_similes(&mut measures);
        assert!(repeats.is_empty());
        assert_eq!(measures.len(), 1);
        assert_eq!(measures[0].notes[0].sound, Sound::Rest);
        assert!(!measures[0].notes[0].is_measure_filler);
        assert_eq!(measures[0].total_duration, 16);
    }

    #[test]
    fn test_identical_measures_grouped() {
        let measures = split("D---|D---|T---");
        let mut repeats = Vec::new();
        detect_implicit_repeats(&measures, &mut repeats);
        assert_eq!(
            repeats,
            vec![RepeatMarker::Measure {
                source_measure: 0,
                repeat_measures: vec![1],
            }]
        );
    }

    #[test]
    fn test_run_of_three_is_one_marker() {
        let measures = split("S-K-|S-K-|S-K-|");
        let mut repeats = Vec::new();
        detect_implicit_repeats(&measures, &mut repeats);
        assert_eq!(
            repeats,
            vec![RepeatMarker::Measure {
                source_measure: 0,
                repeat_measures: vec![1, 2],
            }]
        );
    }

    #[test]
    fn test_unpadded_trailing_measure_breaks_the_run() {
        // Without a closing barline the last measure stays 4 ticks, so its
        // canonical key lacks the padding rest and only the first two group.
        let measures = split("S-K-|S-K-|S-K-");
        let mut repeats = Vec::new();
        detect_implicit_repeats(&measures, &mut repeats);
        assert_eq!(
            repeats,
            vec![RepeatMarker::Measure {
                source_measure: 0,
                repeat_measures: vec![1],
            }]
        );
    }

    #[test]
    fn test_covered_measures_not_regrouped() {
        let measures = split("D---|D---");
        let mut repeats = vec![RepeatMarker::Section {
            start_measure: 0,
            end_measure: 0,
            repeat_count: 1,
        }];
        detect_implicit_repeats(&measures, &mut repeats);
        // Both measures are playings of the section; nothing to add.
        assert_eq!(repeats.len(), 1);
    }

    #[test]
    fn test_distinct_measures_untouched() {
        let measures = split("D---|T---|K---");
        let mut repeats = Vec::new();
        detect_implicit_repeats(&measures, &mut repeats);
        assert!(repeats.is_empty());
    }
}
