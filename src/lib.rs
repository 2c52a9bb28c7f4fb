//! # harp_analysis
//!
//! Pitch and chord extraction from short frames of digitized audio, tuned
//! for harmonica practice: bend tracking, single-note recognition, and
//! chord-sized multi-pitch detection.
//!
//! Every detector analyzes one self-contained buffer per call (there is no
//! streaming state) and never fails for audio-content reasons: silence,
//! noise and too-short buffers resolve to "no pitch" results with zero
//! confidence.
//!
//! ## Example
//! ```rust
//! use harp_analysis::{ChordExtractor, SinglePitchDetector, synthesis};
//!
//! let sample_rate = 44_100;
//! let samples = synthesis::sine_wave(440.0, sample_rate, sample_rate);
//!
//! let detector = SinglePitchDetector::new();
//! let result = detector.detect(&samples, sample_rate);
//! if let Some(pitch) = result.pitch() {
//!     println!("detected {pitch:.1} Hz, confidence {:.2}", result.confidence());
//! }
//!
//! let extractor = ChordExtractor::new();
//! let chord = extractor.detect_chord(&samples, sample_rate);
//! println!("{} simultaneous pitches", chord.pitch_count());
//! ```
//!
//! ## Detectors
//! - [`SinglePitchDetector`]: normalized-difference minimum search over
//!   candidate periods.
//! - [`ZeroCrossingDetector`]: sign-change density refined by spectral
//!   weighting; an independent estimator with a different confidence model.
//! - [`ChordExtractor`]: learned multi-pitch model (via [`ChordModel`])
//!   with a deterministic spectral fallback.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

pub use chord::{ChordExtractor, ChordExtractorBuilder, ChordModel, ModelError};
pub use grouping::{group_chords, NOTE_SEPARATOR};
pub use note::{cents_between, note_name_for, note_name_with_reference, shift_by_cents};
pub use range::{FrequencyRange, DEFAULT_MAX_FREQUENCY, DEFAULT_MIN_FREQUENCY};
pub use result::{ChordDetectionResult, PitchDetectionResult};
pub use single_pitch::{find_first_minimum, SinglePitchDetector};
pub use synthesis::SynthesisError;
pub use zero_crossing::ZeroCrossingDetector;

/// Chord extraction: learned model boundary plus deterministic fallback.
pub mod chord;

/// Tone-set grouping by note signature.
pub mod grouping;

/// Equal-tempered note classification and cents math.
pub mod note;

/// Frequency range configuration.
pub mod range;

/// Detection result value types.
pub mod result;

/// Minimum-search single-pitch detection.
pub mod single_pitch;

mod spectrum;

/// Test-signal synthesis helpers.
pub mod synthesis;

/// Zero-crossing pitch detection with spectral weighting.
pub mod zero_crossing;
