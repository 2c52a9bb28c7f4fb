//! Detection result value types.
//!
//! Results are plain values constructed once per detection call; absence of
//! a pitch is represented by `None`, which keeps "nothing detected" distinct
//! from a valid frequency of 0 Hz.

/// The outcome of a single-pitch detection call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchDetectionResult {
    pitch: Option<f32>,
    confidence: f32,
}

impl PitchDetectionResult {
    /// A result carrying a detected pitch in Hz and a confidence in [0, 1].
    pub fn detected(pitch: f32, confidence: f32) -> Self {
        PitchDetectionResult {
            pitch: Some(pitch),
            confidence,
        }
    }

    /// The "no detected pitch" result, confidence 0.0.
    pub const fn none() -> Self {
        PitchDetectionResult {
            pitch: None,
            confidence: 0.0,
        }
    }

    /// The detected pitch in Hz, or `None` when nothing was detected.
    pub fn pitch(&self) -> Option<f32> {
        self.pitch
    }

    /// Whether a pitch was detected.
    pub fn is_pitch_detected(&self) -> bool {
        self.pitch.is_some()
    }

    /// The confidence score in [0, 1].
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

/// The outcome of a chord detection call: zero or more pitches plus one
/// aggregate confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordDetectionResult {
    pitches: Vec<f32>,
    confidence: f32,
}

impl ChordDetectionResult {
    /// A result carrying the detected pitches in Hz and an aggregate
    /// confidence in [0, 1].
    pub fn new(pitches: Vec<f32>, confidence: f32) -> Self {
        ChordDetectionResult {
            pitches,
            confidence,
        }
    }

    /// The empty result: no pitches, confidence 0.0.
    pub const fn empty() -> Self {
        ChordDetectionResult {
            pitches: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Lift a single-pitch result into a chord result.
    pub fn from_pitch_result(result: PitchDetectionResult) -> Self {
        match result.pitch() {
            Some(pitch) => ChordDetectionResult::new(vec![pitch], result.confidence()),
            None => ChordDetectionResult::empty(),
        }
    }

    /// Whether at least one pitch was detected.
    pub fn has_pitches(&self) -> bool {
        !self.pitches.is_empty()
    }

    /// The number of detected pitches.
    pub fn pitch_count(&self) -> usize {
        self.pitches.len()
    }

    /// All detected pitches in Hz.
    pub fn pitches(&self) -> &[f32] {
        &self.pitches
    }

    /// The pitch at `index`, or `None` past the end.
    pub fn pitch(&self, index: usize) -> Option<f32> {
        self.pitches.get(index).copied()
    }

    /// The aggregate confidence in [0, 1].
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}
