//! # Tick Counter
//!
//! Counts notation content in sixteenth-note ticks without building notes.
//! The repeat expanders use these counts to decide where input splits into
//! whole-measure-aligned chunks, and to align mapping entries to the first
//! note character of each measure (skipping whitespace and leading
//! barlines).
//!
//! A `|` closes the measure being accumulated when it holds any ticks. A
//! token that crosses a measure boundary also starts the following measure,
//! so its own offset is recorded for both.

use crate::lexer::scan_token;

/// Result of one counting walk over a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TickScan {
    /// Byte offset of the first note character of each measure, in order.
    /// Its length is the fragment's measure count, trailing partial
    /// measures included.
    pub offsets: Vec<usize>,
    /// Ticks in the trailing partial measure; zero when the fragment ends
    /// exactly on a measure boundary.
    pub trailing_ticks: u32,
}

/// Walk `fragment` left to right, tallying measures of `ticks_per_measure`
/// capacity.
pub(crate) fn scan(fragment: &str, ticks_per_measure: u32) -> TickScan {
    let bytes = fragment.as_bytes();
    let mut offsets = Vec::new();
    let mut acc = 0u32;
    let mut start: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == '|' {
            if acc > 0 {
                offsets.push(start.take().unwrap_or(i));
                acc = 0;
            }
            i += 1;
            continue;
        }
        if let Some((_, ticks, next)) = scan_token(bytes, i) {
            if start.is_none() {
                start = Some(i);
            }
            acc += ticks;
            while acc >= ticks_per_measure {
                offsets.push(start.take().unwrap_or(i));
                acc -= ticks_per_measure;
                if acc > 0 {
                    // The token straddles the boundary and opens the next
                    // measure too.
                    start = Some(i);
                }
            }
            i = next;
            continue;
        }
        i += 1;
    }
    if acc > 0 {
        if let Some(s) = start {
            offsets.push(s);
        }
    }
    TickScan {
        offsets,
        trailing_ticks: acc,
    }
}

/// Measure count of a fragment, rounding up a trailing partial measure.
pub(crate) fn count_measures(fragment: &str, ticks_per_measure: u32) -> usize {
    scan(fragment, ticks_per_measure).offsets.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment() {
        let scan = scan("", 16);
        assert!(scan.offsets.is_empty());
        assert_eq!(scan.trailing_ticks, 0);
    }

    #[test]
    fn test_single_partial_measure() {
        let scan = scan("D-T-", 16);
        assert_eq!(scan.offsets, vec![0]);
        assert_eq!(scan.trailing_ticks, 4);
    }

    #[test]
    fn test_exact_measure_has_no_trailing() {
        let scan = scan("D-T-K-T-D-T-K-T-", 16);
        assert_eq!(scan.offsets, vec![0]);
        assert_eq!(scan.trailing_ticks, 0);
    }

    #[test]
    fn test_barline_closes_short_measure() {
        let scan = scan("D-T-|K-", 16);
        assert_eq!(scan.offsets, vec![0, 5]);
        assert_eq!(scan.trailing_ticks, 2);
    }

    #[test]
    fn test_leading_barline_and_whitespace_skipped() {
        // Offsets point at the first note character, never at '|' or blanks.
        let scan = scan("| D-T-", 16);
        assert_eq!(scan.offsets, vec![2]);
    }

    #[test]
    fn test_straddling_token_starts_next_measure() {
        // 18-tick note: measure one starts at it and so does measure two.
        let scan = scan("D-----------------", 16);
        assert_eq!(scan.offsets, vec![0, 0]);
        assert_eq!(scan.trailing_ticks, 2);
    }

    #[test]
    fn test_simile_counts_sixteen_regardless_of_signature() {
        let common = scan("%", 16);
        assert_eq!(common.offsets, vec![0]);
        assert_eq!(common.trailing_ticks, 0);

        // Fixed 16 even in 3/4: spills into a second measure.
        let waltz = scan("%", 12);
        assert_eq!(waltz.offsets, vec![0, 0]);
        assert_eq!(waltz.trailing_ticks, 4);
    }

    #[test]
    fn test_simile_after_notes_opens_second_measure() {
        let scan = scan("D-T-K-T-\n%", 16);
        assert_eq!(scan.offsets, vec![0, 9]);
        assert_eq!(scan.trailing_ticks, 8);
    }

    #[test]
    fn test_count_measures() {
        assert_eq!(count_measures("D-T-K-T-|D-", 16), 2);
        assert_eq!(count_measures("D---", 16), 1);
        assert_eq!(count_measures("", 16), 0);
    }
}
