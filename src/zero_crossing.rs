//! Zero-crossing pitch detection with spectral weighting.
//!
//! A coarse period estimate from the signal's sign-change density is paired
//! with a bounded autocorrelation estimate; the spectrum decides which
//! candidate to trust, refines it to sub-bin accuracy, and drives the
//! confidence score. Harmonically rich input may resolve to the fundamental
//! or to a strong harmonic; the estimator is aliasing-prone by nature and
//! callers should expect either.

use crate::range::FrequencyRange;
use crate::result::PitchDetectionResult;
use crate::spectrum::{
    magnitude_spectrum, parabolic_interpolation, parabolic_log_interpolation, rms,
    spectral_flatness,
};

/// Minimum amplitude for a sample to participate in a counted crossing,
/// and the RMS level below which a buffer counts as silent.
const AMPLITUDE_GATE: f32 = 0.005;

/// Transform size for the spectral weighting stage.
const FFT_SIZE: usize = 2048;

/// Samples fed to the autocorrelation estimate.
const AUTOCORRELATION_WINDOW: usize = 1024;

/// Normalized autocorrelation peaks below this never count as a period.
const AUTOCORRELATION_PEAK_THRESHOLD: f32 = 0.3;

/// Candidate estimates are accepted inside the configured range widened by
/// these factors; the final range check only discounts confidence.
const RANGE_SLACK_LOW: f32 = 0.7;
const RANGE_SLACK_HIGH: f32 = 1.3;

/// Confidence multiplier when both candidate estimates agree within 10%.
const AGREEMENT_BOOST: f32 = 1.2;

/// Confidence multiplier for a pitch outside the configured range.
const OUT_OF_RANGE_DISCOUNT: f32 = 0.5;

/// Fraction of the expected bin searched for the true spectral peak.
const REFINEMENT_SEARCH_RADIUS: f32 = 0.2;

/// A spectral refinement drifting further than this fraction from the
/// time-domain estimate is discarded.
const MAX_REFINEMENT_DRIFT: f32 = 0.2;

/// Zero-crossing-rate pitch detector.
///
/// Same call contract as [`crate::SinglePitchDetector`], algorithmically
/// independent, with its own copy of the frequency range.
#[derive(Debug, Clone)]
pub struct ZeroCrossingDetector {
    range: FrequencyRange,
}

impl ZeroCrossingDetector {
    /// Create a detector with the default frequency range.
    pub fn new() -> Self {
        Self::with_range(FrequencyRange::default())
    }

    /// Create a detector with an explicit frequency range.
    pub fn with_range(range: FrequencyRange) -> Self {
        ZeroCrossingDetector { range }
    }

    /// The configured frequency range.
    pub fn range(&self) -> FrequencyRange {
        self.range
    }

    /// The configured lower analysis bound in Hz.
    pub fn min_frequency(&self) -> f32 {
        self.range.min()
    }

    /// The configured upper analysis bound in Hz.
    pub fn max_frequency(&self) -> f32 {
        self.range.max()
    }

    /// Replace the lower analysis bound.
    pub fn set_min_frequency(&mut self, min: f32) {
        self.range.set_min(min);
    }

    /// Replace the upper analysis bound.
    pub fn set_max_frequency(&mut self, max: f32) {
        self.range.set_max(max);
    }

    /// Detect the dominant pitch of a buffer.
    ///
    /// Empty, single-sample and silent buffers resolve to the no-pitch
    /// result with confidence 0.0. A pitch outside the configured range is
    /// still reported, with its confidence halved: real signals can
    /// legitimately exceed a practice-range configuration.
    ///
    /// Documented tolerance: about ±5 Hz for clean sine waves and ±15 Hz
    /// for square waves at mid-range frequencies over second-long buffers.
    pub fn detect_pitch(&self, samples: &[f32], sample_rate: usize) -> PitchDetectionResult {
        if samples.len() < 2 || sample_rate == 0 {
            return PitchDetectionResult::none();
        }
        if rms(samples) < AMPLITUDE_GATE {
            return PitchDetectionResult::none();
        }

        let crossing_estimate = self.estimate_from_crossings(samples, sample_rate);
        let autocorrelation_estimate = self.estimate_from_autocorrelation(samples, sample_rate);

        let spectrum = magnitude_spectrum(samples, FFT_SIZE);

        let (initial, agreement) = match (crossing_estimate, autocorrelation_estimate) {
            (Some(zc), Some(ac)) => {
                let zc_weight = spectral_weight(zc, &spectrum, sample_rate);
                let ac_weight = spectral_weight(ac, &spectrum, sample_rate);
                let chosen = if ac_weight > zc_weight { ac } else { zc };
                (chosen, (zc - ac).abs() < 0.1 * zc)
            }
            (Some(zc), None) => (zc, false),
            (None, Some(ac)) => (ac, false),
            (None, None) => return PitchDetectionResult::none(),
        };

        let pitch = refine_with_spectrum(initial, &spectrum, sample_rate);

        // Spectral clarity drives the confidence: a tonal spectrum scores
        // high, broadband noise scores low even when a spurious pitch
        // slipped through the gates.
        let flatness = spectral_flatness(
            &spectrum,
            sample_rate,
            FFT_SIZE,
            self.range.min(),
            self.range.max(),
        );
        let mut confidence = (1.0 - flatness).clamp(0.0, 1.0);
        if agreement {
            confidence = (confidence * AGREEMENT_BOOST).min(1.0);
        }
        if !(self.range.min()..=self.range.max()).contains(&pitch) {
            confidence *= OUT_OF_RANGE_DISCOUNT;
        }

        PitchDetectionResult::detected(pitch, confidence)
    }

    /// Pitch estimate from the density of amplitude-gated sign changes.
    fn estimate_from_crossings(&self, samples: &[f32], sample_rate: usize) -> Option<f32> {
        let mut crossings = 0u32;
        for pair in samples.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if prev.abs() > AMPLITUDE_GATE
                && cur.abs() > AMPLITUDE_GATE
                && (prev < 0.0) != (cur < 0.0)
            {
                crossings += 1;
            }
        }
        if crossings <= 1 {
            return None;
        }
        // Two crossings per cycle.
        let duration = samples.len() as f32 / sample_rate as f32;
        let frequency = crossings as f32 / (2.0 * duration);
        self.accepts(frequency).then_some(frequency)
    }

    /// Pitch estimate from the strongest normalized autocorrelation peak
    /// inside the lag band, over a bounded window.
    fn estimate_from_autocorrelation(&self, samples: &[f32], sample_rate: usize) -> Option<f32> {
        let window = samples.len().min(AUTOCORRELATION_WINDOW);
        let frame = &samples[..window];

        let energy: f32 = frame.iter().map(|&s| s * s).sum();
        if energy < 1e-6 {
            return None;
        }

        let mut autocorrelation = vec![0.0f32; window / 2];
        for (lag, slot) in autocorrelation.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for i in 0..window - lag {
                sum += frame[i] * frame[i + lag];
            }
            *slot = sum / energy;
        }
        if autocorrelation.len() < 3 {
            return None;
        }

        let min_lag = ((sample_rate as f32 / (self.range.max() * RANGE_SLACK_HIGH)) as usize).max(1);
        let max_lag = ((sample_rate as f32 / (self.range.min() * RANGE_SLACK_LOW)) as isize)
            .clamp(0, autocorrelation.len() as isize - 2) as usize;

        let mut peak_lag = None;
        let mut peak_value = AUTOCORRELATION_PEAK_THRESHOLD;
        for lag in min_lag..=max_lag {
            if autocorrelation[lag] > autocorrelation[lag - 1]
                && autocorrelation[lag] > autocorrelation[lag + 1]
                && autocorrelation[lag] > peak_value
            {
                peak_lag = Some(lag);
                peak_value = autocorrelation[lag];
            }
        }

        let lag = peak_lag?;
        let refined = parabolic_interpolation(&autocorrelation, lag);
        if refined <= 0.0 {
            return None;
        }
        let frequency = sample_rate as f32 / refined;
        self.accepts(frequency).then_some(frequency)
    }

    /// Whether a candidate estimate falls inside the widened acceptance
    /// band around the configured range.
    fn accepts(&self, frequency: f32) -> bool {
        (self.range.min() * RANGE_SLACK_LOW..=self.range.max() * RANGE_SLACK_HIGH)
            .contains(&frequency)
    }
}

impl Default for ZeroCrossingDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Spectral energy near a candidate's bin, used to rank candidates.
fn spectral_weight(pitch: f32, spectrum: &[f32], sample_rate: usize) -> f32 {
    let bin = (pitch * FFT_SIZE as f32 / sample_rate as f32) as usize;
    if bin == 0 || bin + 1 >= spectrum.len() {
        return 0.0;
    }
    spectrum[bin - 1..=bin + 1]
        .iter()
        .cloned()
        .fold(0.0f32, f32::max)
}

/// Snap the time-domain estimate onto the nearest spectral peak, with
/// sub-bin interpolation. Falls back to the estimate when the peak drifts
/// too far from it.
fn refine_with_spectrum(initial: f32, spectrum: &[f32], sample_rate: usize) -> f32 {
    let bin_width = sample_rate as f32 / FFT_SIZE as f32;
    let expected = (initial / bin_width).round() as isize;
    if expected <= 0 || expected as usize >= spectrum.len() {
        return initial;
    }
    let expected = expected as usize;

    let radius = ((expected as f32 * REFINEMENT_SEARCH_RADIUS) as usize).max(1);
    let lo = expected.saturating_sub(radius);
    let hi = (expected + radius).min(spectrum.len() - 1);
    let mut peak_bin = expected;
    for bin in lo..=hi {
        if spectrum[bin] > spectrum[peak_bin] {
            peak_bin = bin;
        }
    }

    let refined = parabolic_log_interpolation(spectrum, peak_bin) * bin_width;
    if (refined - initial).abs() > initial * MAX_REFINEMENT_DRIFT {
        initial
    } else {
        refined
    }
}
