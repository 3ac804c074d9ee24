//! # Repeat Expansion
//!
//! Two sequential passes rewrite repeat syntax into flat notation text
//! before any notes are built:
//!
//! 1. **Single-chunk repeats**: `content|xN`, where `content` contains no
//!    `|` or `:`. The content is padded to whole measures; if it spans more
//!    than one measure, only its final measure loops (the rest is a
//!    one-time prefix) and the construct plays `N` measures of that unit in
//!    total.
//! 2. **Section repeats**: `|: content :|` with an optional `xN` suffix,
//!    playing `N + 1` times total (twice when the suffix is absent).
//!
//! Each pass produces an [`Expansion`]: the rewritten text, one
//! [`MeasureDefinition`] per measure of that text, and the repeat markers
//! discovered so far. Ghost measures copy their source's definition
//! verbatim, which is what lets an editor redirect edits on any copy to the
//! single place in the raw input that produced it.
//!
//! Emitted segments are joined with explicit barlines so every padded
//! playing closes its measure downstream.

use crate::ast::{MeasureDefinition, RepeatMarker};
use crate::ticks::{count_measures, scan};

/// Ghost expansion is bounded; larger counts are clamped.
const MAX_REPEAT_COUNT: u32 = 1024;

/// Immutable result of one expansion pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expansion {
    pub text: String,
    /// One entry per measure of `text`, in order.
    pub mapping: Vec<MeasureDefinition>,
    pub repeats: Vec<RepeatMarker>,
}

#[derive(Debug)]
struct ChunkRepeat {
    content_start: usize,
    content_end: usize,
    count: u32,
    match_end: usize,
}

#[derive(Debug)]
struct SectionRepeat {
    open_start: usize,
    content_start: usize,
    content_end: usize,
    count: u32,
    match_end: usize,
}

/// First occurrence of `content|xN` at or after `from`. The content runs
/// backwards from the `|x` to the previous `|`, `:`, or `from`, and must be
/// non-empty.
fn find_chunk_repeat(source: &str, from: usize) -> Option<ChunkRepeat> {
    let bytes = source.as_bytes();
    let mut i = from;
    while i + 2 < bytes.len() {
        if bytes[i] == b'|' && bytes[i + 1] == b'x' && bytes[i + 2].is_ascii_digit() {
            let mut digits_end = i + 3;
            while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
                digits_end += 1;
            }
            let mut content_start = i;
            while content_start > from
                && bytes[content_start - 1] != b'|'
                && bytes[content_start - 1] != b':'
            {
                content_start -= 1;
            }
            if content_start < i {
                let count = source[i + 2..digits_end]
                    .parse::<u32>()
                    .unwrap_or(MAX_REPEAT_COUNT)
                    .min(MAX_REPEAT_COUNT);
                return Some(ChunkRepeat {
                    content_start,
                    content_end: i,
                    count,
                    match_end: digits_end,
                });
            }
        }
        i += 1;
    }
    None
}

/// First `|: content :|` at or after `from`, with its optional `xN` suffix.
fn find_section_repeat(source: &str, from: usize) -> Option<SectionRepeat> {
    let open_start = source[from..].find("|:")? + from;
    let content_start = open_start + 2;
    let content_end = source[content_start..].find(":|")? + content_start;
    let bytes = source.as_bytes();
    let mut match_end = content_end + 2;
    let mut count = 1u32;
    if match_end + 1 < bytes.len()
        && bytes[match_end] == b'x'
        && bytes[match_end + 1].is_ascii_digit()
    {
        let mut digits_end = match_end + 2;
        while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
            digits_end += 1;
        }
        count = source[match_end + 1..digits_end]
            .parse::<u32>()
            .unwrap_or(MAX_REPEAT_COUNT)
            .min(MAX_REPEAT_COUNT);
        match_end = digits_end;
    }
    Some(SectionRepeat {
        open_start,
        content_start,
        content_end,
        count,
        match_end,
    })
}

/// Emit unmatched text as-is, assigning fresh sequential mapping entries to
/// its measures.
fn pass_through(
    segment: &str,
    base: usize,
    ticks_per_measure: u32,
    text: &mut String,
    mapping: &mut Vec<MeasureDefinition>,
    next_source_measure: &mut usize,
) {
    if segment.is_empty() {
        return;
    }
    for offset in scan(segment, ticks_per_measure).offsets {
        mapping.push(MeasureDefinition {
            source_measure_index: *next_source_measure,
            source_string_index: base + offset,
        });
        *next_source_measure += 1;
    }
    text.push_str(segment);
}

/// Expand every `content|xN` construct (pass one).
pub(crate) fn expand_chunk_repeats(source: &str, ticks_per_measure: u32) -> Expansion {
    let mut text = String::new();
    let mut mapping: Vec<MeasureDefinition> = Vec::new();
    let mut repeats: Vec<RepeatMarker> = Vec::new();
    let mut next_source_measure = 0usize;
    let mut cursor = 0usize;

    while let Some(found) = find_chunk_repeat(source, cursor) {
        pass_through(
            &source[cursor..found.content_start],
            cursor,
            ticks_per_measure,
            &mut text,
            &mut mapping,
            &mut next_source_measure,
        );
        cursor = found.match_end;

        let content = &source[found.content_start..found.content_end];
        let content_scan = scan(content, ticks_per_measure);
        let unit_start = match content_scan.offsets.last() {
            Some(&offset) => offset,
            // Nothing playable before the marker.
            None => {
                text.push_str(content);
                continue;
            }
        };

        // All but the final measure is a one-time prefix.
        for &offset in &content_scan.offsets[..content_scan.offsets.len() - 1] {
            mapping.push(MeasureDefinition {
                source_measure_index: next_source_measure,
                source_string_index: found.content_start + offset,
            });
            next_source_measure += 1;
        }
        if content_scan.offsets.len() > 1 {
            text.push_str(&content[..unit_start]);
            text.push('|');
        }

        let definition = MeasureDefinition {
            source_measure_index: next_source_measure,
            source_string_index: found.content_start + unit_start,
        };
        next_source_measure += 1;

        let mut unit = content[unit_start..].to_string();
        if content_scan.trailing_ticks > 0 {
            for _ in 0..ticks_per_measure - content_scan.trailing_ticks {
                unit.push('_');
            }
        }

        let first_playing = mapping.len();
        let mut ghosts = Vec::new();
        for playing in 0..found.count.max(1) {
            if playing > 0 {
                ghosts.push(mapping.len());
            }
            text.push_str(&unit);
            text.push('|');
            mapping.push(definition);
        }
        if !ghosts.is_empty() {
            repeats.push(RepeatMarker::Measure {
                source_measure: first_playing,
                repeat_measures: ghosts,
            });
        }
    }

    pass_through(
        &source[cursor..],
        cursor,
        ticks_per_measure,
        &mut text,
        &mut mapping,
        &mut next_source_measure,
    );
    Expansion {
        text,
        mapping,
        repeats,
    }
}

/// Expand every `|: content :| [xN]` construct (pass two), consuming
/// the chunk pass's output and mapping.
pub(crate) fn expand_section_repeats(input: Expansion, ticks_per_measure: u32) -> Expansion {
    if !input.text.contains("|:") {
        return input;
    }
    let source = input.text;
    let mut text = String::new();
    let mut mapping: Vec<MeasureDefinition> = Vec::new();
    let mut sections: Vec<RepeatMarker> = Vec::new();
    // (first old measure index after a region, measures inserted there)
    let mut insertions: Vec<(usize, usize)> = Vec::new();
    let mut consumed = 0usize;
    let mut cursor = 0usize;

    while let Some(found) = find_section_repeat(&source, cursor) {
        let before = &source[cursor..found.open_start];
        text.push_str(before);
        let take = count_measures(before, ticks_per_measure).min(input.mapping.len() - consumed);
        mapping.extend_from_slice(&input.mapping[consumed..consumed + take]);
        consumed += take;
        cursor = found.match_end;

        let content = &source[found.content_start..found.content_end];
        let content_scan = scan(content, ticks_per_measure);
        let span = content_scan.offsets.len();
        if span == 0 {
            continue;
        }

        let mut playing = content.to_string();
        if content_scan.trailing_ticks > 0 {
            for _ in 0..ticks_per_measure - content_scan.trailing_ticks {
                playing.push('_');
            }
        }

        // The first playing carries the real entries; every later playing
        // copies them verbatim.
        let take = span.min(input.mapping.len() - consumed);
        let entries = input.mapping[consumed..consumed + take].to_vec();
        consumed += take;

        let start_measure = mapping.len();
        text.push('|');
        for _ in 0..=found.count {
            text.push_str(&playing);
            text.push('|');
            mapping.extend(entries.iter().copied());
        }
        if found.count > 0 {
            sections.push(RepeatMarker::Section {
                start_measure,
                end_measure: start_measure + span - 1,
                repeat_count: found.count,
            });
        }
        insertions.push((consumed, found.count as usize * span));
    }

    text.push_str(&source[cursor..]);
    mapping.extend_from_slice(&input.mapping[consumed..]);

    // Rebase chunk-pass marker indices into the duplicated measure space.
    let rebase = |index: usize| -> usize {
        index
            + insertions
                .iter()
                .filter(|(at, _)| *at <= index)
                .map(|(_, added)| added)
                .sum::<usize>()
    };
    let mut repeats: Vec<RepeatMarker> = input
        .repeats
        .into_iter()
        .map(|marker| match marker {
            RepeatMarker::Measure {
                source_measure,
                repeat_measures,
            } => RepeatMarker::Measure {
                source_measure: rebase(source_measure),
                repeat_measures: repeat_measures.into_iter().map(rebase).collect(),
            },
            RepeatMarker::Section {
                start_measure,
                end_measure,
                repeat_count,
            } => RepeatMarker::Section {
                start_measure: rebase(start_measure),
                end_measure: rebase(end_measure),
                repeat_count,
            },
        })
        .collect();
    repeats.extend(sections);

    Expansion {
        text,
        mapping,
        repeats,
    }
}
