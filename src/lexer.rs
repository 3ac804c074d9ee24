use crate::ast::{Note, Sound, WHOLE_NOTE_TICKS};

/// The sound a notation character stands for, if any.
pub(crate) fn sound_for(c: char) -> Option<Sound> {
    match c {
        'D' | 'd' => Some(Sound::Dum),
        'T' | 't' => Some(Sound::Tak),
        'K' | 'k' => Some(Sound::Ka),
        'S' | 's' => Some(Sound::Slap),
        '_' => Some(Sound::Rest),
        '%' => Some(Sound::Simile),
        _ => None,
    }
}

/// Scan one run-length token starting at byte `i`.
///
/// A sound character opens a token whose duration is one tick plus one tick
/// per immediately following continuation character: `_` continues rest
/// tokens, `-` continues every other sound. `%` is always sixteen ticks.
/// Returns the sound, the tick count, and the index just past the token.
///
/// Notation is ASCII; bytes of multi-byte characters never match a sound
/// character, so byte-wise scanning is safe and returned indices are valid
/// byte offsets.
pub(crate) fn scan_token(bytes: &[u8], i: usize) -> Option<(Sound, u32, usize)> {
    let sound = sound_for(bytes[i] as char)?;
    if sound == Sound::Simile {
        return Some((sound, WHOLE_NOTE_TICKS, i + 1));
    }
    let continuation = if sound == Sound::Rest { b'_' } else { b'-' };
    let mut j = i + 1;
    while j < bytes.len() && bytes[j] == continuation {
        j += 1;
    }
    Some((sound, (j - i) as u32, j))
}

/// Tokenize fully expanded notation text (no repeat syntax left) into raw
/// Notes in source order.
///
/// Whitespace is skipped, `|` emits a zero-duration barline marker, `%`
/// emits a filler-flagged simile Note, and unrecognized characters are
/// silently skipped (permissive lexing).
pub fn tokenize(text: &str) -> Vec<Note> {
    let bytes = text.as_bytes();
    let mut notes = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if c == '|' {
            notes.push(Note::barline());
            i += 1;
            continue;
        }
        match scan_token(bytes, i) {
            Some((Sound::Simile, _, next)) => {
                notes.push(Note::simile());
                i = next;
            }
            Some((sound, ticks, next)) => {
                notes.push(Note::event(sound, ticks));
                i = next;
            }
            None => i += 1,
        }
    }
    notes
}
