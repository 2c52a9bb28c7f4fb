//! Shared numeric helpers for the spectral paths: windowed magnitude
//! spectra, band-limited spectral flatness, and peak interpolation.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;

/// Root-mean-square amplitude of a buffer.
pub(crate) fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|&s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Hamming-windowed magnitude spectrum.
///
/// Up to `fft_size` leading samples are windowed and zero-padded into the
/// transform; the returned magnitudes cover bins `0..fft_size / 2`.
pub(crate) fn magnitude_spectrum(samples: &[f32], fft_size: usize) -> Vec<f32> {
    let n = samples.len().min(fft_size);
    let mut buffer = vec![Complex { re: 0.0, im: 0.0 }; fft_size];
    if n > 1 {
        let denom = (n - 1) as f32;
        for (i, slot) in buffer.iter_mut().take(n).enumerate() {
            let window = 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos();
            slot.re = samples[i] * window;
        }
    } else if n == 1 {
        buffer[0].re = samples[0];
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut buffer);

    buffer[..fft_size / 2]
        .iter()
        .map(|c| (c.re * c.re + c.im * c.im).sqrt())
        .collect()
}

/// Spectral flatness (geometric mean over arithmetic mean) of the bins
/// covering `[min_frequency, max_frequency]`.
///
/// Values near 0 indicate a tonal spectrum, values near 1 indicate noise.
/// An empty or degenerate band reports 1.0, i.e. maximally noise-like.
pub(crate) fn spectral_flatness(
    magnitudes: &[f32],
    sample_rate: usize,
    fft_size: usize,
    min_frequency: f32,
    max_frequency: f32,
) -> f32 {
    if magnitudes.is_empty() || sample_rate == 0 {
        return 1.0;
    }
    let bin_of = |freq: f32| (freq * fft_size as f32 / sample_rate as f32) as isize;
    let start = bin_of(min_frequency).max(1) as usize;
    let end = (bin_of(max_frequency).max(0) as usize).min(magnitudes.len() - 1);
    if start > end {
        return 1.0;
    }

    let mut sum = 0.0f64;
    let mut log_sum = 0.0f64;
    for &m in &magnitudes[start..=end] {
        let value = f64::from(m) + 1e-10;
        sum += value;
        log_sum += value.ln();
    }
    let count = (end - start + 1) as f64;
    if sum <= 0.0 {
        return 1.0;
    }
    let arithmetic_mean = sum / count;
    let geometric_mean = (log_sum / count).exp();
    (geometric_mean / arithmetic_mean) as f32
}

/// Refine a peak index with parabolic interpolation over the raw values.
///
/// Returns the index unchanged at array edges, for degenerate curvature,
/// or when the fitted vertex drifts more than one bin away.
pub(crate) fn parabolic_interpolation(values: &[f32], peak_index: usize) -> f32 {
    if peak_index == 0 || peak_index + 1 >= values.len() {
        return peak_index as f32;
    }
    let y0 = values[peak_index - 1];
    let y1 = values[peak_index];
    let y2 = values[peak_index + 1];
    let denominator = y0 - 2.0 * y1 + y2;
    if denominator.abs() < 1e-10 {
        return peak_index as f32;
    }
    let adjustment = 0.5 * (y0 - y2) / denominator;
    if adjustment.abs() > 1.0 {
        return peak_index as f32;
    }
    peak_index as f32 + adjustment
}

/// Refine a spectral peak bin to sub-bin accuracy by fitting a parabola to
/// the log magnitudes around it.
pub(crate) fn parabolic_log_interpolation(magnitudes: &[f32], peak_bin: usize) -> f32 {
    if peak_bin == 0 || peak_bin + 1 >= magnitudes.len() {
        return peak_bin as f32;
    }
    let y0 = magnitudes[peak_bin - 1].ln();
    let y1 = magnitudes[peak_bin].ln();
    let y2 = magnitudes[peak_bin + 1].ln();
    if !y0.is_finite() || !y1.is_finite() || !y2.is_finite() {
        return peak_bin as f32;
    }
    let denominator = 2.0 * y1 - y0 - y2;
    if denominator.abs() < 1e-6 {
        return peak_bin as f32;
    }
    let shift = (y2 - y0) / (2.0 * denominator);
    if shift.abs() > 1.0 {
        return peak_bin as f32;
    }
    peak_bin as f32 + shift
}
