//! Note classification over the equal-tempered scale.
//!
//! Pure functions only; nothing here keeps state, so everything is safe to
//! call from any thread without coordination.

/// Pitch-class names in semitone order starting from C, sharps only.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Returned for frequencies that cannot name a note (zero, negative,
/// non-finite).
const UNKNOWN_NOTE: &str = "?";

/// Semitone offset of A within [`NOTE_NAMES`].
const A_SEMITONE_INDEX: i64 = 9;

/// Standard concert pitch for A, in Hz.
const CONCERT_PITCH: f32 = 440.0;

/// Map a frequency to the name of the nearest equal-tempered pitch class,
/// referenced to A440.
///
/// Octaves are collapsed: 220 Hz, 440 Hz and 880 Hz all map to `"A"`.
/// Non-positive or non-finite frequencies map to `"?"`.
pub fn note_name_for(frequency: f32) -> &'static str {
    note_name_with_reference(frequency, CONCERT_PITCH)
}

/// Like [`note_name_for`], but referenced to an alternative concert pitch
/// for A (e.g. 432.0 or 443.0).
pub fn note_name_with_reference(frequency: f32, reference_pitch: f32) -> &'static str {
    if !frequency.is_finite()
        || frequency <= 0.0
        || !reference_pitch.is_finite()
        || reference_pitch <= 0.0
    {
        return UNKNOWN_NOTE;
    }
    let semitones_from_a = (12.0 * (frequency / reference_pitch).log2()).round() as i64;
    let index = (A_SEMITONE_INDEX + semitones_from_a).rem_euclid(12) as usize;
    NOTE_NAMES[index]
}

/// The interval between two frequencies, in cents (1200 per octave).
pub fn cents_between(f1: f32, f2: f32) -> f32 {
    1200.0 * (f1 / f2).log2()
}

/// Shift a frequency by the given number of cents (negative shifts down).
pub fn shift_by_cents(frequency: f32, cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0) * frequency
}
