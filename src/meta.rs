//! # Notation File Metadata
//!
//! Notation files may open with a YAML front-matter block:
//!
//! ```text
//! ---
//! title: Baladi
//! time-signature: 4/4
//! ---
//! D---T-K-S---T-K-
//! ```
//!
//! The core parser never strips headers itself, so the source offsets it
//! reports stay exact for editors feeding it raw fragments. File-oriented
//! callers (the CLI) split the header off first and parse the body.

use serde::Deserialize;

use crate::ast::TimeSignature;
use crate::error::RhythmError;

/// Parsed front-matter fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub title: Option<String>,
    pub time_signature: Option<TimeSignature>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawHeader {
    title: Option<String>,
    time_signature: Option<String>,
    beat_grouping: Option<Vec<u32>>,
}

/// Split an optional `---` fenced YAML header off a notation file,
/// returning the parsed header and the notation body.
///
/// Files without a leading fence pass through untouched with a default
/// header. A fence that never closes, malformed YAML, and an invalid
/// `time-signature` value are errors.
pub fn split_header(source: &str) -> Result<(Header, &str), RhythmError> {
    let rest = match source.strip_prefix("---") {
        Some(rest) if rest.starts_with('\n') || rest.starts_with("\r\n") => rest,
        _ => return Ok((Header::default(), source)),
    };
    let end = rest
        .find("\n---")
        .ok_or_else(|| RhythmError::InvalidHeader("unterminated front matter".to_string()))?;

    let yaml = &rest[..end];
    let body = &rest[end + 4..];
    let body = body.strip_prefix('\r').unwrap_or(body);
    let body = body.strip_prefix('\n').unwrap_or(body);

    let raw: RawHeader = if yaml.trim().is_empty() {
        RawHeader::default()
    } else {
        serde_yaml::from_str(yaml).map_err(|e| RhythmError::InvalidHeader(e.to_string()))?
    };

    let time_signature = match (raw.time_signature.as_deref(), raw.beat_grouping) {
        (Some(s), grouping) => {
            let mut ts = TimeSignature::from_str(s)?;
            ts.beat_grouping = grouping;
            Some(ts)
        }
        (None, Some(grouping)) => {
            let mut ts = TimeSignature::default();
            ts.beat_grouping = Some(grouping);
            Some(ts)
        }
        (None, None) => None,
    };

    Ok((
        Header {
            title: raw.title,
            time_signature,
        },
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_header() {
        let source = "---\ntitle: Baladi\ntime-signature: 4/4\n---\nD---T-K-";
        let (header, body) = split_header(source).unwrap();
        assert_eq!(header.title.as_deref(), Some("Baladi"));
        assert_eq!(header.time_signature, Some(TimeSignature::new(4, 4)));
        assert_eq!(body, "D---T-K-");
    }

    #[test]
    fn test_no_header_passes_through() {
        let (header, body) = split_header("D---T-K-").unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(body, "D---T-K-");
    }

    #[test]
    fn test_empty_header_block() {
        let (header, body) = split_header("---\n---\nD-").unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(body, "D-");
    }

    #[test]
    fn test_beat_grouping_override() {
        let source = "---\ntime-signature: 8/8\nbeat-grouping: [6, 6, 4]\n---\nD-";
        let (header, _) = split_header(source).unwrap();
        let ts = header.time_signature.unwrap();
        assert_eq!(ts.numerator, 8);
        assert_eq!(ts.grouping(), vec![6, 6, 4]);
    }

    #[test]
    fn test_unterminated_header_is_error() {
        let err = split_header("---\ntitle: Baladi\nD-").unwrap_err();
        assert!(matches!(err, RhythmError::InvalidHeader(_)));
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let err = split_header("---\ntitle: [unclosed\n---\nD-").unwrap_err();
        assert!(matches!(err, RhythmError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_time_signature_is_error() {
        let err = split_header("---\ntime-signature: 4/5\n---\nD-").unwrap_err();
        assert_eq!(err, RhythmError::InvalidTimeSignature("4/5".to_string()));
    }

    #[test]
    fn test_leading_dashes_in_notation_are_not_a_header() {
        // A bare "---" run with no newline is continuation characters, not a
        // fence.
        let (header, body) = split_header("---D").unwrap();
        assert_eq!(header, Header::default());
        assert_eq!(body, "---D");
    }
}
