//! FFT wrapper with windowing functions

use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;
use tubemat_core::Complex64;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Rectangular (no windowing)
    #[default]
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Blackman-Harris window (better sidelobe suppression)
    BlackmanHarris,
}

impl Window {
    /// Periodic window value at sample `i` of `n`.
    fn weight(self, i: usize, n: usize) -> f64 {
        let x = 2.0 * PI * i as f64 / n as f64;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 * (1.0 - x.cos()),
            Window::Hamming => 0.54 - 0.46 * x.cos(),
            Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
            Window::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
        }
    }

    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f64]) {
        let n = buffer.len();
        if *self == Window::Rectangular {
            return;
        }
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.weight(i, n);
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f64> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Planned forward and inverse transforms of one size
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f64>>,
    ifft: Arc<dyn rustfft::Fft<f64>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        Self { fft, ifft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Perform forward FFT on real input
    ///
    /// Returns complex spectrum (size/2 + 1 bins for positive frequencies)
    pub fn forward(&self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x, 0.0)).collect();

        // Pad or truncate to FFT size
        buffer.resize(self.size, Complex64::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        // Return only positive frequencies (DC to Nyquist)
        buffer.truncate(self.size / 2 + 1);
        buffer
    }

    /// Perform inverse FFT of a one-sided spectrum
    ///
    /// `spectrum` holds bins 0..=size/2; the negative frequencies are the
    /// conjugate mirror. Returns the real signal, normalized by 1/size.
    pub fn inverse(&self, spectrum: &[Complex64]) -> Vec<f64> {
        let half = self.size / 2;
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.size];
        for (i, &bin) in spectrum.iter().take(half + 1).enumerate() {
            buffer[i] = bin;
            if i > 0 && i < self.size - i {
                buffer[self.size - i] = bin.conj();
            }
        }

        self.ifft.process(&mut buffer);

        // Normalize and extract real part
        let scale = 1.0 / self.size as f64;
        buffer.iter().map(|c| c.re * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_roundtrip() {
        let fft = Fft::new(256);

        // Create test signal
        let input: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / 256.0).sin() + 0.25)
            .collect();

        let spectrum = fft.forward(&input);
        assert_eq!(spectrum.len(), 129);
        let reconstructed = fft.inverse(&spectrum);

        // Check reconstruction
        for (a, b) in input.iter().zip(reconstructed.iter()) {
            assert!((a - b).abs() < 1e-12, "Mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_window_hann() {
        let mut buffer = vec![1.0; 100];
        Window::Hann.apply(&mut buffer);

        // Hann window should be 0 at edges, 1 at center
        assert!(buffer[0] < 0.01);
        assert!(buffer[99] < 0.01);
        assert!((buffer[50] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_bin_aligned_tone() {
        let fft = Fft::new(256);
        let input: Vec<f64> = (0..256)
            .map(|i| (2.0 * PI * 16.0 * i as f64 / 256.0).cos())
            .collect();
        let spectrum = fft.forward(&input);

        // Unit cosine on bin 16 carries size/2 in that bin and nothing elsewhere
        assert!((spectrum[16].re - 128.0).abs() < 1e-9);
        let leakage: f64 = spectrum
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != 16)
            .map(|(_, c)| c.norm())
            .sum();
        assert!(leakage < 1e-9);
    }
}
