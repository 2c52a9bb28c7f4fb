//! Multi-pitch (chord) extraction.
//!
//! A learned multi-pitch model, when one is attached, gets the first try at
//! every buffer; its absence, failure, or a degenerate answer routes to a
//! deterministic spectral fallback behind the same result contract. The
//! caller never sees which path produced the answer.

use crate::range::FrequencyRange;
use crate::result::ChordDetectionResult;
use crate::spectrum::{magnitude_spectrum, parabolic_log_interpolation, spectral_flatness};
use log::debug;
use thiserror::Error;

/// Samples with magnitude at or below this count as silence.
const SILENCE_FLOOR: f32 = 1e-6;

/// A model answer below this aggregate confidence is treated as unusable.
const MODEL_CONFIDENCE_FLOOR: f32 = 0.1;

/// Minimum normalized magnitude for a spectral peak to be considered.
const PEAK_THRESHOLD: f32 = 0.05;

/// Peaks closer than this are merged into one.
const MIN_PEAK_DISTANCE_HZ: f32 = 25.0;

/// At most this many pitches are reported.
const MAX_PITCHES: usize = 4;

/// Spectral flatness above this classifies the buffer as noise. Broadband
/// noise measures around 0.85 on the windowed spectrum; chords with a few
/// percent of mixed-in noise stay below 0.4.
const SPECTRAL_FLATNESS_THRESHOLD: f32 = 0.5;

/// How close a frequency ratio must sit to an integer to count as a
/// harmonic of a stronger peak.
const HARMONIC_TOLERANCE: f32 = 0.05;

/// A harmonic-ratio peak survives unless it is weaker than this fraction
/// of the stronger peak.
const HARMONIC_MAGNITUDE_RATIO: f32 = 0.3;

/// Octave ratios within this tolerance are never filtered as harmonics.
const OCTAVE_TOLERANCE: f32 = 0.1;

/// Integer ratios above this are accepted as separate tones rather than
/// harmonics.
const MAX_HARMONIC_RATIO: f32 = 5.0;

/// A higher-frequency peak weaker than this fraction of a kept lower peak
/// is dropped.
const LOW_PRIORITY_RATIO: f32 = 0.6;

/// Smallest transform used by the fallback path.
const MIN_FFT_SIZE: usize = 1024;

/// Errors a learned chord model may report across its boundary.
///
/// The extractor never propagates these: any error routes to the
/// deterministic fallback.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model could not be loaded or is not present.
    #[error("model unavailable: {0}")]
    Unavailable(String),

    /// Inference ran and failed.
    #[error("model inference failed: {0}")]
    Inference(String),
}

/// A learned multi-pitch classifier.
///
/// Implementations receive the same `(samples, sample_rate)` pair as the
/// extractor and answer with the pitch-list-plus-confidence shape of
/// [`ChordDetectionResult`]. Determinism is not assumed of implementors.
pub trait ChordModel: Send + Sync {
    /// Classify the buffer into zero or more candidate pitches with an
    /// aggregate confidence.
    fn classify(
        &self,
        samples: &[f32],
        sample_rate: usize,
    ) -> Result<ChordDetectionResult, ModelError>;
}

/// Builder for a [`ChordExtractor`].
pub struct ChordExtractorBuilder {
    range: FrequencyRange,
    model: Option<Box<dyn ChordModel>>,
}

impl ChordExtractorBuilder {
    /// Start with the default frequency range and no model attached.
    pub fn new() -> Self {
        ChordExtractorBuilder {
            range: FrequencyRange::default(),
            model: None,
        }
    }

    /// Set the frequency range the fallback searches within.
    pub fn range(mut self, range: FrequencyRange) -> Self {
        self.range = range;
        self
    }

    /// Attach a learned multi-pitch model to try before the fallback.
    pub fn model(mut self, model: Box<dyn ChordModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Build the extractor.
    pub fn build(self) -> ChordExtractor {
        ChordExtractor {
            range: self.range,
            model: self.model,
        }
    }
}

impl Default for ChordExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Multi-pitch extractor: learned model first, deterministic spectral
/// peak picking as the fallback.
pub struct ChordExtractor {
    range: FrequencyRange,
    model: Option<Box<dyn ChordModel>>,
}

impl ChordExtractor {
    /// Return a builder to attach a model or customize the range.
    pub fn builder() -> ChordExtractorBuilder {
        ChordExtractorBuilder::new()
    }

    /// Create an extractor with the default range and no model; every call
    /// runs the deterministic fallback.
    pub fn new() -> Self {
        Self::builder().build()
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

    /// Detect the set of simultaneous pitches in a buffer.
    ///
    /// Silence yields the empty result with confidence exactly 0.0 on
    /// every path. Broadband noise yields the empty result or a low
    /// (< 0.5) aggregate confidence. Model failure is never surfaced; the
    /// fallback answers instead.
    pub fn detect_chord(&self, samples: &[f32], sample_rate: usize) -> ChordDetectionResult {
        if samples.len() < 2 || sample_rate == 0 {
            return ChordDetectionResult::empty();
        }
        // Silence short-circuits before either path runs.
        if samples.iter().all(|s| s.abs() <= SILENCE_FLOOR) {
            debug!("chord detection: silent buffer, returning empty result");
            return ChordDetectionResult::empty();
        }

        if let Some(model) = &self.model {
            match model.classify(samples, sample_rate) {
                Ok(result)
                    if result.has_pitches() && result.confidence() >= MODEL_CONFIDENCE_FLOOR =>
                {
                    debug!(
                        "chord detection: model reported {} pitches, confidence {:.2}",
                        result.pitch_count(),
                        result.confidence()
                    );
                    return result;
                }
                Ok(_) => debug!("chord detection: model answer unusable, falling back"),
                Err(err) => debug!("chord detection: model failed ({err}), falling back"),
            }
        }

        self.detect_with_spectrum(samples, sample_rate)
    }

    /// Deterministic fallback: spectral peak picking with harmonic
    /// suppression.
    fn detect_with_spectrum(&self, samples: &[f32], sample_rate: usize) -> ChordDetectionResult {
        let fft_size = samples.len().next_power_of_two().max(MIN_FFT_SIZE);
        let mut magnitudes = magnitude_spectrum(samples, fft_size);

        let flatness = spectral_flatness(
            &magnitudes,
            sample_rate,
            fft_size,
            self.range.min(),
            self.range.max(),
        );
        if flatness > SPECTRAL_FLATNESS_THRESHOLD {
            debug!("chord detection: spectral flatness {flatness:.3}, classified as noise");
            return ChordDetectionResult::empty();
        }

        let max_magnitude = magnitudes.iter().cloned().fold(0.0f32, f32::max);
        if max_magnitude <= 0.0 {
            return ChordDetectionResult::empty();
        }
        for magnitude in &mut magnitudes {
            *magnitude /= max_magnitude;
        }

        let bin_width = sample_rate as f32 / fft_size as f32;
        let mut peaks = find_spectral_peaks(&magnitudes, bin_width);
        debug!("chord detection: {} initial peaks", peaks.len());

        peaks.retain(|p| (self.range.min()..=self.range.max()).contains(&p.frequency));
        let peaks = filter_harmonics(peaks);
        let peaks = prioritize_lower_frequencies(peaks);
        let mut peaks = merge_close_peaks(peaks);
        peaks.truncate(MAX_PITCHES);
        debug!("chord detection: {} peaks after filtering", peaks.len());

        if peaks.is_empty() {
            return ChordDetectionResult::empty();
        }

        // Mean peak strength, scaled down as the spectrum approaches the
        // noise threshold, keeps near-noise answers below 0.5.
        let tonality = (1.0 - flatness / SPECTRAL_FLATNESS_THRESHOLD).clamp(0.0, 1.0);
        let mean_magnitude =
            peaks.iter().map(|p| p.magnitude).sum::<f32>() / peaks.len() as f32;
        let confidence = (mean_magnitude * tonality).clamp(0.0, 1.0);

        let pitches = peaks.into_iter().map(|p| p.frequency).collect();
        ChordDetectionResult::new(pitches, confidence)
    }
}

impl Default for ChordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A spectral peak candidate.
#[derive(Debug, Clone, Copy)]
struct Peak {
    frequency: f32,
    magnitude: f32,
}

/// Local maxima of the normalized spectrum above the peak threshold, with
/// sub-bin frequency refinement, strongest first.
fn find_spectral_peaks(magnitudes: &[f32], bin_width: f32) -> Vec<Peak> {
    let mut peaks = Vec::new();
    for bin in 1..magnitudes.len().saturating_sub(1) {
        let magnitude = magnitudes[bin];
        if magnitude >= PEAK_THRESHOLD
            && magnitude > magnitudes[bin - 1]
            && magnitude > magnitudes[bin + 1]
        {
            let refined = parabolic_log_interpolation(magnitudes, bin);
            peaks.push(Peak {
                frequency: refined * bin_width,
                magnitude,
            });
        }
    }
    peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    peaks
}

/// Drop peaks sitting on an integer multiple of a stronger peak unless they
/// hold their own in magnitude. Octaves always survive, and ratios beyond
/// [`MAX_HARMONIC_RATIO`] count as separate tones.
fn filter_harmonics(peaks: Vec<Peak>) -> Vec<Peak> {
    let mut kept: Vec<Peak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let mut is_harmonic = false;
        for stronger in &kept {
            let ratio = peak.frequency / stronger.frequency;
            if (ratio - 2.0).abs() < OCTAVE_TOLERANCE {
                continue;
            }
            if (ratio - ratio.round()).abs() < HARMONIC_TOLERANCE
                && ratio <= MAX_HARMONIC_RATIO
                && peak.magnitude < stronger.magnitude * HARMONIC_MAGNITUDE_RATIO
            {
                is_harmonic = true;
                break;
            }
        }
        if !is_harmonic {
            kept.push(peak);
        }
    }
    kept
}

/// Order peaks by frequency and drop any peak overshadowed by a markedly
/// stronger peak below it.
fn prioritize_lower_frequencies(mut peaks: Vec<Peak>) -> Vec<Peak> {
    peaks.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    let mut kept: Vec<Peak> = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let overshadowed = kept.iter().any(|lower| {
            peak.frequency > lower.frequency && peak.magnitude < lower.magnitude * LOW_PRIORITY_RATIO
        });
        if !overshadowed {
            kept.push(peak);
        }
    }
    kept
}

/// Merge frequency-ordered peaks closer than [`MIN_PEAK_DISTANCE_HZ`] into
/// their magnitude-weighted average.
fn merge_close_peaks(peaks: Vec<Peak>) -> Vec<Peak> {
    let mut iter = peaks.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };
    let mut merged = Vec::new();
    for next in iter {
        if (next.frequency - current.frequency).abs() < MIN_PEAK_DISTANCE_HZ {
            let total = current.magnitude + next.magnitude;
            current = Peak {
                frequency: (current.frequency * current.magnitude
                    + next.frequency * next.magnitude)
                    / total,
                magnitude: total,
            };
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}
