//! Grouping of harmonica tone-sets by note signature.
//!
//! Operates on symbolic tone lists, not audio: the harmonica model (an
//! external collaborator) enumerates the chords it can physically produce
//! as ordered frequency lists, and this module folds them into a map keyed
//! by their note-name signature.

use crate::note::note_name_for;
use std::collections::HashMap;

/// Separator between note names in a signature.
pub const NOTE_SEPARATOR: &str = "-";

/// Group tone-sets by their note signature.
///
/// Each tone-set's signature is built by naming every frequency in original
/// order and joining the names with [`NOTE_SEPARATOR`], so `[440.0, 659.25,
/// 987.77]` becomes `"A-E-B"`. Order matters: the same pitch classes in a
/// different order produce a distinct signature. When two tone-sets share a
/// signature, the later one's frequencies are retained (last-write-wins).
///
/// An empty source yields an empty map. The map is built fresh on every
/// call, never cached.
pub fn group_chords<I, T>(tone_sets: I) -> HashMap<String, Vec<f32>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[f32]>,
{
    let mut groups = HashMap::new();
    for tone_set in tone_sets {
        let tones = tone_set.as_ref();
        let signature = tones
            .iter()
            .map(|&frequency| note_name_for(frequency))
            .collect::<Vec<_>>()
            .join(NOTE_SEPARATOR);
        groups.insert(signature, tones.to_vec());
    }
    groups
}
