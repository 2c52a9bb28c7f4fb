//! Test-signal synthesis.
//!
//! Small generators for the waveforms the detectors are validated against.
//! These helpers fail fast on contract violations (mismatched input
//! lengths), unlike the detectors themselves, which degrade gracefully on
//! any audio content.

use std::f32::consts::PI;
use thiserror::Error;

/// Errors from the synthesis helpers.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// `chord_wave` needs one amplitude per frequency.
    #[error("expected {frequencies} amplitudes to match the frequencies, got {amplitudes}")]
    AmplitudeCountMismatch {
        /// Number of frequencies supplied.
        frequencies: usize,
        /// Number of amplitudes supplied.
        amplitudes: usize,
    },
}

/// Generate a unit-amplitude sine wave.
pub fn sine_wave(frequency: f32, sample_rate: usize, num_samples: usize) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate as f32;
    (0..num_samples).map(|i| (step * i as f32).sin()).collect()
}

/// Generate a unit-amplitude square wave (sign of the matching sine).
pub fn square_wave(frequency: f32, sample_rate: usize, num_samples: usize) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate as f32;
    (0..num_samples)
        .map(|i| if (step * i as f32).sin() >= 0.0 { 1.0 } else { -1.0 })
        .collect()
}

/// Generate a chord: a sum of sines, one amplitude per frequency.
///
/// Returns [`SynthesisError::AmplitudeCountMismatch`] when the slices
/// differ in length.
pub fn chord_wave(
    frequencies: &[f32],
    amplitudes: &[f32],
    sample_rate: usize,
    num_samples: usize,
) -> Result<Vec<f32>, SynthesisError> {
    if frequencies.len() != amplitudes.len() {
        return Err(SynthesisError::AmplitudeCountMismatch {
            frequencies: frequencies.len(),
            amplitudes: amplitudes.len(),
        });
    }
    let mut samples = vec![0.0f32; num_samples];
    for (&frequency, &amplitude) in frequencies.iter().zip(amplitudes) {
        let step = 2.0 * PI * frequency / sample_rate as f32;
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample += amplitude * (step * i as f32).sin();
        }
    }
    Ok(samples)
}
