//! Note-name and pitch-bend arithmetic.
//!
//! Scientific pitch notation: middle C (MIDI 60) is "C4", concert A (MIDI 69)
//! is "A4". Octaves run from -1 (MIDI 0) to 9 (MIDI 120-127).

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name of a MIDI note number, sharps spelled `#`.
pub fn note_name(note: u8) -> String {
    let note = note.min(127);
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

/// MIDI note number for a name like "C4", "F#3", "Eb2" or "A#-1".
///
/// Accepts `#` or `s` for sharp and `b` for flat. Returns `None` for
/// unparseable names or notes outside 0-127.
pub fn note_number(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let mut semitone: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let octave_str = match rest.chars().next() {
        Some('#') | Some('s') => {
            semitone += 1;
            &rest[1..]
        }
        Some('b') => {
            semitone -= 1;
            &rest[1..]
        }
        _ => rest,
    };

    let octave: i32 = octave_str.parse().ok()?;
    if !(-1..=9).contains(&octave) {
        return None;
    }
    let number = (octave + 1) * 12 + semitone;
    u8::try_from(number).ok().filter(|&n| n <= 127)
}

/// Convert a raw 14-bit pitch-bend value (0-16383, center 8192) to semitones,
/// given the bend range in semitones that one full deflection covers.
#[inline]
pub fn pitch_bend_to_semitones(raw: u16, range_semitones: f32) -> f32 {
    (raw.min(16383) as f32 - 8192.0) / 8192.0 * range_semitones
}

/// Convert a bend in semitones to a raw 14-bit pitch-bend value, clamped to
/// 0-16383.
#[inline]
pub fn semitones_to_pitch_bend(semitones: f32, range_semitones: f32) -> u16 {
    let raw = 8192.0 + semitones / range_semitones * 8192.0;
    raw.clamp(0.0, 16383.0).round() as u16
}
