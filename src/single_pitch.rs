//! Minimum-search single-pitch detection.
//!
//! Time-domain estimator for monophonic buffers: a difference function over
//! candidate lags is normalized by its cumulative mean, and the first local
//! minimum below an energy-adaptive threshold marks the fundamental period.
//! The lag search window is derived from the configured frequency range.

use crate::note::shift_by_cents;
use crate::range::FrequencyRange;
use crate::result::PitchDetectionResult;
use crate::spectrum::{parabolic_interpolation, rms};

/// Longest prefix of the buffer fed to the difference function. Bounds the
/// quadratic cost for second-long buffers without losing lag resolution at
/// the bottom of the default range.
const ANALYSIS_WINDOW: usize = 8192;

/// Base threshold applied to the normalized difference before the
/// energy-adaptive widening.
const MINIMUM_THRESHOLD: f32 = 0.4;

/// Scaling of the RMS term in the adaptive threshold.
const RMS_SCALING_FACTOR: f32 = 0.3;

/// The lag band is widened by this margin on both ends so pitches sitting
/// exactly on a range bound still fall inside the search window.
const LAG_MARGIN_CENTS: f32 = 25.0;

/// Single-pitch detector over a normalized difference function.
///
/// Detection is a pure function of the buffer, the sample rate and the
/// configured [`FrequencyRange`]; calls may run on any thread as long as
/// the range is not being reconfigured concurrently.
#[derive(Debug, Clone)]
pub struct SinglePitchDetector {
    range: FrequencyRange,
}

impl SinglePitchDetector {
    /// Create a detector with the default frequency range.
    pub fn new() -> Self {
        Self::with_range(FrequencyRange::default())
    }

    /// Create a detector with an explicit frequency range.
    pub fn with_range(range: FrequencyRange) -> Self {
        SinglePitchDetector { range }
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

    /// Replace the lower analysis bound. An inverted range (`min > max`) is
    /// tolerated and resolves every detection to "no pitch".
    pub fn set_min_frequency(&mut self, min: f32) {
        self.range.set_min(min);
    }

    /// Replace the upper analysis bound.
    pub fn set_max_frequency(&mut self, max: f32) {
        self.range.set_max(max);
    }

    /// Detect the fundamental pitch of a monophonic buffer.
    ///
    /// Empty and single-sample buffers resolve to the no-pitch result with
    /// confidence 0.0; so does any buffer without a qualifying minimum in
    /// the lag window (silence, noise, out-of-range pitches).
    pub fn detect(&self, samples: &[f32], sample_rate: usize) -> PitchDetectionResult {
        if samples.len() < 2 || sample_rate == 0 {
            return PitchDetectionResult::none();
        }
        let frame = &samples[..samples.len().min(ANALYSIS_WINDOW)];

        // Lag bounds from the frequency range: high frequencies mean short
        // periods, so the range maximum yields the minimum lag.
        let min_lag =
            (sample_rate as f32 / shift_by_cents(self.range.max(), LAG_MARGIN_CENTS)) as isize;
        let max_lag =
            (sample_rate as f32 / shift_by_cents(self.range.min(), -LAG_MARGIN_CENTS)) as isize;

        let difference = difference_function(frame);
        let cmndf = cumulative_mean_normalized_difference(&difference, min_lag, max_lag);

        let level = rms(frame);
        let threshold = (MINIMUM_THRESHOLD * (1.0 + RMS_SCALING_FACTOR / (level + 0.01))).min(0.5);

        let Some(lag) = find_first_minimum(&cmndf, threshold, min_lag, max_lag) else {
            return PitchDetectionResult::none();
        };
        let refined_lag = parabolic_interpolation(&cmndf, lag);
        if refined_lag <= 0.0 {
            return PitchDetectionResult::none();
        }

        // Confidence from how far below the threshold the minimum sits.
        let confidence = (1.0 - (cmndf[lag] / threshold).powi(2)).clamp(0.0, 1.0);
        PitchDetectionResult::detected(sample_rate as f32 / refined_lag, confidence)
    }
}

impl Default for SinglePitchDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first index in `[min_index, max_index)` whose value is a local
/// minimum (strictly below both neighbors) and below `threshold`.
///
/// The requested range is clamped to `[0, values.len())` before scanning,
/// so out-of-range and negative indices, as produced by upstream
/// frequency-to-lag conversions, degrade to `None` instead of indexing
/// outside the buffer. Buffers of length 0 or 1 always yield `None`.
pub fn find_first_minimum(
    values: &[f32],
    threshold: f32,
    min_index: isize,
    max_index: isize,
) -> Option<usize> {
    if values.len() < 2 {
        return None;
    }
    let len = values.len() as isize;
    let lo = min_index.clamp(0, len) as usize;
    let hi = max_index.clamp(0, len) as usize;

    // A local minimum needs both neighbors, which excludes the endpoints.
    let start = lo.max(1);
    let end = hi.min(values.len() - 1);
    for i in start..end {
        if values[i] < threshold && values[i] < values[i - 1] && values[i] < values[i + 1] {
            return Some(i);
        }
    }
    None
}

/// Squared-difference function over lags `0..samples.len() / 2`.
fn difference_function(samples: &[f32]) -> Vec<f32> {
    let half = samples.len() / 2;
    let mut difference = vec![0.0f32; half];
    for (lag, slot) in difference.iter_mut().enumerate() {
        let mut sum = 0.0f32;
        for i in 0..half {
            let delta = samples[i] - samples[i + lag];
            sum += delta * delta;
        }
        *slot = sum;
    }
    difference
}

/// Cumulative mean normalized difference, computed inside the lag band
/// only; lags outside it are pinned to 1.0 so they can never qualify as a
/// minimum.
fn cumulative_mean_normalized_difference(
    difference: &[f32],
    min_lag: isize,
    max_lag: isize,
) -> Vec<f32> {
    let mut cmndf = vec![1.0f32; difference.len()];
    let mut cumulative_sum = 0.0f32;
    for lag in 1..difference.len() {
        cumulative_sum += difference[lag];
        if (min_lag..=max_lag).contains(&(lag as isize)) {
            cmndf[lag] = difference[lag] / (cumulative_sum / lag as f32 + 1e-10);
        }
    }
    cmndf
}
