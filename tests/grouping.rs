//! Integration tests for note classification and tone-set grouping.

use approx::assert_relative_eq;
use harp_analysis::{
    cents_between, group_chords, note_name_for, note_name_with_reference, shift_by_cents,
};

#[test]
fn note_names_follow_equal_temperament() {
    assert_eq!(note_name_for(440.0), "A");
    assert_eq!(note_name_for(261.63), "C");
    assert_eq!(note_name_for(329.63), "E");
    assert_eq!(note_name_for(466.16), "A#");
    assert_eq!(note_name_for(659.25), "E");
    assert_eq!(note_name_for(987.77), "B");
}

#[test]
fn note_names_collapse_octaves() {
    assert_eq!(note_name_for(110.0), "A");
    assert_eq!(note_name_for(220.0), "A");
    assert_eq!(note_name_for(880.0), "A");
    assert_eq!(note_name_for(1760.0), "A");
}

#[test]
fn note_names_snap_to_the_nearest_semitone() {
    // 20 cents sharp of A4 is still A; a quarter tone up rounds to A#.
    assert_eq!(note_name_for(shift_by_cents(440.0, 20.0)), "A");
    assert_eq!(note_name_for(shift_by_cents(440.0, 60.0)), "A#");
    assert_eq!(note_name_for(shift_by_cents(440.0, -60.0)), "G#");
}

#[test]
fn unnameable_frequencies_map_to_unknown() {
    assert_eq!(note_name_for(0.0), "?");
    assert_eq!(note_name_for(-5.0), "?");
    assert_eq!(note_name_for(f32::NAN), "?");
    assert_eq!(note_name_for(f32::INFINITY), "?");
}

#[test]
fn alternative_concert_pitch_shifts_the_reference() {
    assert_eq!(note_name_with_reference(432.0, 432.0), "A");
    assert_eq!(note_name_with_reference(440.0, 440.0), "A");
    // 443 Hz is 12 cents flat of A against a 446 reference, still A.
    assert_eq!(note_name_with_reference(443.0, 446.0), "A");
}

#[test]
fn cents_math_round_trips() {
    assert_relative_eq!(cents_between(880.0, 440.0), 1200.0, max_relative = 1e-4);
    assert_relative_eq!(cents_between(440.0, 880.0), -1200.0, max_relative = 1e-4);
    assert_relative_eq!(shift_by_cents(440.0, 1200.0), 880.0, max_relative = 1e-4);
    assert_relative_eq!(
        shift_by_cents(shift_by_cents(440.0, 25.0), -25.0),
        440.0,
        max_relative = 1e-4
    );
}

#[test]
fn empty_tone_set_source_yields_empty_map() {
    let groups = group_chords(Vec::<Vec<f32>>::new());
    assert!(groups.is_empty());
}

#[test]
fn single_tone_set_maps_to_its_signature() {
    let groups = group_chords([vec![440.0, 659.25, 987.77]]);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups.get("A-E-B").map(Vec::as_slice),
        Some(&[440.0, 659.25, 987.77][..])
    );
}

#[test]
fn tone_order_distinguishes_signatures() {
    let groups = group_chords([vec![440.0, 659.25, 987.77], vec![661.0, 987.0, 440.0]]);
    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups.get("A-E-B").map(Vec::as_slice),
        Some(&[440.0, 659.25, 987.77][..])
    );
    assert_eq!(
        groups.get("E-B-A").map(Vec::as_slice),
        Some(&[661.0, 987.0, 440.0][..])
    );
}

#[test]
fn colliding_signatures_keep_the_latest_tone_set() {
    let groups = group_chords([vec![440.0, 659.25, 987.77], vec![441.0, 660.0, 988.0]]);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups.get("A-E-B").map(Vec::as_slice),
        Some(&[441.0, 660.0, 988.0][..])
    );
}
