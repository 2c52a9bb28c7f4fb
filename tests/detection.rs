//! Integration tests for single-pitch and chord detection over synthesized
//! signals.

use harp_analysis::{
    find_first_minimum, synthesis, ChordDetectionResult, ChordExtractor, ChordModel,
    FrequencyRange, ModelError, SinglePitchDetector, SynthesisError, ZeroCrossingDetector,
    DEFAULT_MAX_FREQUENCY, DEFAULT_MIN_FREQUENCY,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SAMPLE_RATE: usize = 44_100;

/// One second of uniform random noise in [-1, 1], seeded for determinism.
fn uniform_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| rng.random_range(-1.0f32..1.0))
        .collect()
}

const TRIAD: [f32; 3] = [261.63, 329.63, 392.0];

/// One second of the C4-E4-G4 triad at equal amplitudes with 5% uniform
/// amplitude noise mixed in.
fn noisy_triad() -> Vec<f32> {
    let mut samples =
        synthesis::chord_wave(&TRIAD, &[0.3, 0.3, 0.3], SAMPLE_RATE, SAMPLE_RATE).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for sample in &mut samples {
        *sample += rng.random_range(-0.05f32..0.05);
    }
    samples
}

#[test]
fn find_first_minimum_clamps_out_of_range_indices() {
    let mut values = vec![1.0f32; 512];
    values[99] = 0.8;
    values[100] = 0.1;
    values[101] = 0.8;

    // The valley is findable with a sane range.
    assert_eq!(find_first_minimum(&values, 0.5, 0, 512), Some(100));

    // Out-of-range requests degrade to "no minimum", never a panic.
    assert_eq!(find_first_minimum(&values, 0.5, 512, 1024), None);
    assert_eq!(find_first_minimum(&values, 0.5, -64, -1), None);
    assert_eq!(find_first_minimum(&values, 0.5, isize::MIN, isize::MAX), Some(100));
}

#[test]
fn find_first_minimum_handles_tiny_buffers() {
    assert_eq!(find_first_minimum(&[], 0.5, 0, 10), None);
    assert_eq!(find_first_minimum(&[1.0], 0.5, 0, 1), None);
    assert_eq!(find_first_minimum(&[1.0, 0.0], 0.5, 0, 2), None);
}

#[test]
fn find_first_minimum_respects_threshold() {
    let mut values = vec![1.0f32; 64];
    values[30] = 0.6;
    assert_eq!(find_first_minimum(&values, 0.5, 0, 64), None);
    assert_eq!(find_first_minimum(&values, 0.7, 0, 64), Some(30));
}

#[test]
fn single_pitch_detects_sine() {
    let samples = synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE);
    let detector = SinglePitchDetector::new();
    let result = detector.detect(&samples, SAMPLE_RATE);

    let pitch = result.pitch().expect("a clean sine should produce a pitch");
    assert!((pitch - 440.0).abs() < 2.0, "expected ~440 Hz, got {pitch}");
    assert!(result.confidence() > 0.5, "low confidence {}", result.confidence());
}

#[test]
fn single_pitch_holds_up_at_low_amplitude() {
    let samples: Vec<f32> = synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE)
        .iter()
        .map(|s| s * 0.05)
        .collect();
    let detector = SinglePitchDetector::new();
    let result = detector.detect(&samples, SAMPLE_RATE);

    let pitch = result.pitch().expect("a quiet sine should still produce a pitch");
    assert!((pitch - 440.0).abs() < 2.0, "expected ~440 Hz, got {pitch}");
    assert!(result.confidence() > 0.5);
}

#[test]
fn zero_crossing_detects_sine() {
    let samples = synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE);
    let detector = ZeroCrossingDetector::new();
    let result = detector.detect_pitch(&samples, SAMPLE_RATE);

    let pitch = result.pitch().expect("a clean sine should produce a pitch");
    assert!((pitch - 440.0).abs() < 5.0, "expected ~440 Hz, got {pitch}");
    assert!(result.confidence() > 0.5, "low confidence {}", result.confidence());
}

#[test]
fn zero_crossing_square_matches_sine_within_wider_band() {
    let detector = ZeroCrossingDetector::new();

    let sine = detector.detect_pitch(
        &synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE),
        SAMPLE_RATE,
    );
    let square = detector.detect_pitch(
        &synthesis::square_wave(440.0, SAMPLE_RATE, SAMPLE_RATE),
        SAMPLE_RATE,
    );

    let sine_pitch = sine.pitch().expect("sine pitch");
    let square_pitch = square.pitch().expect("square pitch");
    // The steep edges add crossings, so the square estimate gets more slack.
    assert!((square_pitch - 440.0).abs() < 15.0, "square at {square_pitch}");
    assert!((square_pitch - sine_pitch).abs() < 15.0);
    assert!(square.confidence() > 0.5);
}

#[test]
fn silence_yields_no_pitch_everywhere() {
    let zeros = vec![0.0f32; SAMPLE_RATE];

    let single = SinglePitchDetector::new().detect(&zeros, SAMPLE_RATE);
    assert!(!single.is_pitch_detected());
    assert_eq!(single.confidence(), 0.0);

    let zcr = ZeroCrossingDetector::new().detect_pitch(&zeros, SAMPLE_RATE);
    assert!(!zcr.is_pitch_detected());
    assert_eq!(zcr.confidence(), 0.0);

    let chord = ChordExtractor::new().detect_chord(&zeros, SAMPLE_RATE);
    assert!(!chord.has_pitches());
    assert_eq!(chord.pitch_count(), 0);
    assert_eq!(chord.confidence(), 0.0);
}

#[test]
fn degenerate_buffers_yield_no_pitch() {
    for samples in [&[][..], &[0.4][..]] {
        let single = SinglePitchDetector::new().detect(samples, SAMPLE_RATE);
        assert!(!single.is_pitch_detected());
        assert_eq!(single.confidence(), 0.0);

        let zcr = ZeroCrossingDetector::new().detect_pitch(samples, SAMPLE_RATE);
        assert!(!zcr.is_pitch_detected());

        let chord = ChordExtractor::new().detect_chord(samples, SAMPLE_RATE);
        assert!(!chord.has_pitches());
        assert_eq!(chord.confidence(), 0.0);
    }
}

#[test]
fn noise_is_never_a_confident_answer() {
    let noise = uniform_noise(SAMPLE_RATE, 42);

    let chord = ChordExtractor::new().detect_chord(&noise, SAMPLE_RATE);
    if chord.has_pitches() {
        assert!(chord.confidence() < 0.5, "noise chord at {}", chord.confidence());
    }

    let zcr = ZeroCrossingDetector::new().detect_pitch(&noise, SAMPLE_RATE);
    if zcr.is_pitch_detected() {
        assert!(zcr.confidence() < 0.5, "noise pitch at {}", zcr.confidence());
    }
}

#[test]
fn chord_extractor_recovers_triad_tones() {
    let samples = noisy_triad();
    let chord = ChordExtractor::new().detect_chord(&samples, SAMPLE_RATE);

    assert!(chord.pitch_count() >= 1, "expected at least one pitch");
    if chord.pitch_count() >= 3 {
        let recovered = TRIAD
            .iter()
            .filter(|&&tone| chord.pitches().iter().any(|&p| (p - tone).abs() < 1.0))
            .count();
        assert!(
            recovered >= 2,
            "expected at least 2 of {TRIAD:?} within 1 Hz, got {:?}",
            chord.pitches()
        );
    }
}

#[test]
fn detection_is_deterministic() {
    let samples = noisy_triad();

    let single = SinglePitchDetector::new();
    assert_eq!(
        single.detect(&samples, SAMPLE_RATE),
        single.detect(&samples, SAMPLE_RATE)
    );

    let zcr = ZeroCrossingDetector::new();
    assert_eq!(
        zcr.detect_pitch(&samples, SAMPLE_RATE),
        zcr.detect_pitch(&samples, SAMPLE_RATE)
    );

    let extractor = ChordExtractor::new();
    assert_eq!(
        extractor.detect_chord(&samples, SAMPLE_RATE),
        extractor.detect_chord(&samples, SAMPLE_RATE)
    );
}

#[test]
fn inverted_range_is_tolerated() {
    let samples = synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE);
    let inverted = FrequencyRange::new(2000.0, 100.0);

    let single = SinglePitchDetector::with_range(inverted).detect(&samples, SAMPLE_RATE);
    assert!(!single.is_pitch_detected());
    assert_eq!(single.confidence(), 0.0);

    let zcr = ZeroCrossingDetector::with_range(inverted).detect_pitch(&samples, SAMPLE_RATE);
    assert!(!zcr.is_pitch_detected());
}

#[test]
fn out_of_range_pitch_is_discounted_not_rejected() {
    let samples = synthesis::sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE);

    let baseline = ZeroCrossingDetector::new().detect_pitch(&samples, SAMPLE_RATE);

    let mut narrowed = ZeroCrossingDetector::new();
    narrowed.set_min_frequency(500.0);
    let result = narrowed.detect_pitch(&samples, SAMPLE_RATE);

    let pitch = result.pitch().expect("out-of-range pitch is still reported");
    assert!((pitch - 440.0).abs() < 5.0, "expected ~440 Hz, got {pitch}");
    assert!(result.confidence() > 0.0);
    assert!(result.confidence() < baseline.confidence());
}

#[test]
fn range_configuration_round_trips() {
    assert_eq!(DEFAULT_MIN_FREQUENCY, 80.0);
    assert_eq!(DEFAULT_MAX_FREQUENCY, 4835.0);

    let mut detector = SinglePitchDetector::new();
    assert_eq!(detector.min_frequency(), DEFAULT_MIN_FREQUENCY);
    assert_eq!(detector.max_frequency(), DEFAULT_MAX_FREQUENCY);

    detector.set_min_frequency(200.0);
    detector.set_max_frequency(2000.0);
    assert_eq!(detector.min_frequency(), 200.0);
    assert_eq!(detector.max_frequency(), 2000.0);

    // Reconfiguring one detector family leaves the others untouched.
    assert_eq!(ZeroCrossingDetector::new().min_frequency(), DEFAULT_MIN_FREQUENCY);
    assert_eq!(ChordExtractor::new().max_frequency(), DEFAULT_MAX_FREQUENCY);
}

struct FixedModel {
    pitches: Vec<f32>,
    confidence: f32,
}

impl ChordModel for FixedModel {
    fn classify(
        &self,
        _samples: &[f32],
        _sample_rate: usize,
    ) -> Result<ChordDetectionResult, ModelError> {
        Ok(ChordDetectionResult::new(
            self.pitches.clone(),
            self.confidence,
        ))
    }
}

struct FailingModel;

impl ChordModel for FailingModel {
    fn classify(
        &self,
        _samples: &[f32],
        _sample_rate: usize,
    ) -> Result<ChordDetectionResult, ModelError> {
        Err(ModelError::Unavailable("model file missing".into()))
    }
}

#[test]
fn usable_model_answer_is_returned_as_is() {
    let samples = noisy_triad();
    let extractor = ChordExtractor::builder()
        .model(Box::new(FixedModel {
            pitches: vec![392.0, 493.88],
            confidence: 0.9,
        }))
        .build();

    let chord = extractor.detect_chord(&samples, SAMPLE_RATE);
    assert_eq!(chord.pitches(), &[392.0, 493.88]);
    assert_eq!(chord.confidence(), 0.9);
}

#[test]
fn model_failure_falls_back_transparently() {
    let samples = noisy_triad();

    let with_model = ChordExtractor::builder()
        .model(Box::new(FailingModel))
        .build();
    let without_model = ChordExtractor::new();

    // The fallback is deterministic, so both answers are identical.
    assert_eq!(
        with_model.detect_chord(&samples, SAMPLE_RATE),
        without_model.detect_chord(&samples, SAMPLE_RATE)
    );
}

#[test]
fn degenerate_model_answers_fall_back() {
    let samples = noisy_triad();
    let without_model = ChordExtractor::new().detect_chord(&samples, SAMPLE_RATE);

    let empty_answer = ChordExtractor::builder()
        .model(Box::new(FixedModel {
            pitches: Vec::new(),
            confidence: 0.9,
        }))
        .build();
    assert_eq!(empty_answer.detect_chord(&samples, SAMPLE_RATE), without_model);

    let unconfident_answer = ChordExtractor::builder()
        .model(Box::new(FixedModel {
            pitches: vec![100.0],
            confidence: 0.01,
        }))
        .build();
    assert_eq!(
        unconfident_answer.detect_chord(&samples, SAMPLE_RATE),
        without_model
    );
}

#[test]
fn silence_bypasses_the_model() {
    let zeros = vec![0.0f32; SAMPLE_RATE];
    let extractor = ChordExtractor::builder()
        .model(Box::new(FixedModel {
            pitches: vec![440.0],
            confidence: 0.9,
        }))
        .build();

    let chord = extractor.detect_chord(&zeros, SAMPLE_RATE);
    assert!(!chord.has_pitches());
    assert_eq!(chord.confidence(), 0.0);
}

#[test]
fn chord_wave_rejects_mismatched_amplitudes() {
    let err = synthesis::chord_wave(&[440.0, 554.37], &[1.0], SAMPLE_RATE, 128).unwrap_err();
    assert!(matches!(
        err,
        SynthesisError::AmplitudeCountMismatch {
            frequencies: 2,
            amplitudes: 1
        }
    ));
}
