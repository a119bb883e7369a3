//! Block-averaged transfer function estimation.
//!
//! For each microphone `i` the estimator accumulates the cross-spectrum
//! `G_i1 = Σ Y_i·X̄_1` and the auto-spectra `G_11`, `G_ii` over blocks, then
//! forms `H_i1 = G_i1 / G_11` (the H1 estimator, exact when the reference
//! channel is noise-free) and the coherence `γ² = |G_i1|² / (G_11·G_ii)`.

use tracing::debug;
use tubemat_core::{
    ChannelSet, Complex64, Error, FrequencySet, MIC_COUNT, Result, TransferFunctionSet, nan,
};

use crate::fft::{Fft, Window};

/// Reference bins this far below the strongest bin (as a power ratio) are
/// treated as unexcited.
pub const REFERENCE_FLOOR: f64 = 1e-12;

/// Transfer function estimator over synchronized microphone channels.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralEstimator {
    block_len: usize,
    overlap: f64,
    window: Window,
}

impl SpectralEstimator {
    /// Estimator with disjoint rectangular blocks of `block_len` samples.
    pub fn new(block_len: usize) -> Result<Self> {
        if block_len < 2 {
            return Err(Error::invalid(
                "block_len",
                format!("must be at least 2, got {block_len}"),
            ));
        }
        Ok(Self {
            block_len,
            overlap: 0.0,
            window: Window::Rectangular,
        })
    }

    /// Fraction of a block shared with the next one, in `[0, 0.95]`.
    pub fn with_overlap(mut self, overlap: f64) -> Result<Self> {
        if !(0.0..=0.95).contains(&overlap) {
            return Err(Error::invalid(
                "overlap",
                format!("must be within 0..=0.95, got {overlap}"),
            ));
        }
        self.overlap = overlap;
        Ok(self)
    }

    /// Window applied to every block.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Samples per block.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Block overlap fraction.
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    /// Block window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Distance between consecutive block starts.
    pub fn hop(&self) -> usize {
        (((1.0 - self.overlap) * self.block_len as f64).round() as usize).max(1)
    }

    /// Number of complete blocks in `len` samples; the remainder is dropped.
    pub fn block_count(&self, len: usize) -> usize {
        if len < self.block_len {
            0
        } else {
            (len - self.block_len) / self.hop() + 1
        }
    }

    /// Analysis grid for signals sampled at `sample_rate`.
    pub fn frequencies(&self, sample_rate: f64) -> Result<FrequencySet> {
        FrequencySet::new(sample_rate, self.block_len)
    }

    /// Estimate H21, H31 and H41 with coherence.
    ///
    /// The channel mean is removed before blocking. Bins where the reference
    /// carries no power yield NaN transfer functions and zero coherence.
    pub fn estimate(&self, channels: &ChannelSet) -> Result<TransferFunctionSet> {
        let frequencies = self.frequencies(channels.sample_rate())?;
        let blocks = self.block_count(channels.len());
        if blocks == 0 {
            return Err(Error::InsufficientData {
                len: channels.len(),
                block_len: self.block_len,
            });
        }

        let centered: Vec<Vec<f64>> = channels
            .channels()
            .iter()
            .map(|c| remove_mean(c))
            .collect();
        let fft = Fft::new(self.block_len);
        let window = self.window.coefficients(self.block_len);
        let bins = frequencies.len();
        let hop = self.hop();

        // auto[0] is G_11; cross[i - 1] is G_i1
        let mut auto = vec![vec![0.0f64; bins]; MIC_COUNT];
        let mut cross = vec![vec![Complex64::new(0.0, 0.0); bins]; MIC_COUNT - 1];

        let mut block = vec![0.0f64; self.block_len];
        for b in 0..blocks {
            let start = b * hop;
            let mut reference = Vec::new();
            for (ch, signal) in centered.iter().enumerate() {
                for ((dst, &x), &w) in block
                    .iter_mut()
                    .zip(&signal[start..start + self.block_len])
                    .zip(&window)
                {
                    *dst = x * w;
                }
                let spectrum = fft.forward(&block);
                for (acc, y) in auto[ch].iter_mut().zip(&spectrum) {
                    *acc += y.norm_sqr();
                }
                if ch == 0 {
                    reference = spectrum;
                } else {
                    let pairs = cross[ch - 1].iter_mut().zip(&spectrum).zip(&reference);
                    for ((acc, y), x) in pairs {
                        *acc += y * x.conj();
                    }
                }
            }
        }

        let floor = auto[0].iter().fold(0.0f64, |m, &g| m.max(g)) * REFERENCE_FLOOR;
        let mut responses: [Vec<Complex64>; 3] = Default::default();
        let mut coherence: [Vec<f64>; 3] = Default::default();
        for i in 0..MIC_COUNT - 1 {
            responses[i] = Vec::with_capacity(bins);
            coherence[i] = Vec::with_capacity(bins);
            for k in 0..bins {
                let g11 = auto[0][k];
                let gii = auto[i + 1][k];
                let gi1 = cross[i][k];
                if g11 > floor && g11 > 0.0 {
                    responses[i].push(gi1 / g11);
                    let denom = g11 * gii;
                    let coh = if denom > 0.0 { gi1.norm_sqr() / denom } else { 0.0 };
                    coherence[i].push(coh.clamp(0.0, 1.0));
                } else {
                    responses[i].push(nan());
                    coherence[i].push(0.0);
                }
            }
        }

        let unexcited = responses[0].iter().filter(|h| h.re.is_nan()).count();
        debug!(
            blocks,
            hop,
            bins,
            unexcited,
            discarded = channels.len() - ((blocks - 1) * hop + self.block_len),
            window = ?self.window,
            "estimated transfer functions"
        );

        let [h21, h31, h41] = responses;
        TransferFunctionSet::new(frequencies, h21, h31, h41)?.with_coherence(coherence)
    }
}

fn remove_mean(signal: &[f64]) -> Vec<f64> {
    let mean = signal.iter().sum::<f64>() / signal.len().max(1) as f64;
    signal.iter().map(|x| x - mean).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(len: usize, cycles_per_block: f64, block: usize, gain: f64, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|n| gain * (2.0 * PI * cycles_per_block * n as f64 / block as f64 + phase).cos())
            .collect()
    }

    #[test]
    fn recovers_gain_and_phase_of_bin_aligned_tone() {
        let block = 256;
        let len = 4 * block + 17;
        let x = tone(len, 8.0, block, 1.0, 0.3);
        let channels = ChannelSet::new(
            1000.0,
            [
                x,
                tone(len, 8.0, block, 0.5, 0.3 - 0.2),
                tone(len, 8.0, block, 2.0, 0.3 + 1.0),
                tone(len, 8.0, block, 1.0, 0.3),
            ],
        )
        .unwrap();
        let tf = SpectralEstimator::new(block).unwrap().estimate(&channels).unwrap();
        assert_eq!(tf.len(), 129);

        let expected = [
            Complex64::from_polar(0.5, -0.2),
            Complex64::from_polar(2.0, 1.0),
            Complex64::new(1.0, 0.0),
        ];
        for (h, e) in tf.at(8).iter().zip(expected) {
            assert!((h - e).norm() < 1e-9, "{h} != {e}");
        }
        assert!((tf.min_coherence(8) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unexcited_bins_are_nan_with_zero_coherence() {
        let block = 128;
        let x = tone(4 * block, 5.0, block, 1.0, 0.0);
        let channels = ChannelSet::new(1000.0, [x.clone(), x.clone(), x.clone(), x]).unwrap();
        let tf = SpectralEstimator::new(block).unwrap().estimate(&channels).unwrap();
        assert!(tf.h21[0].re.is_nan(), "DC is removed with the mean");
        assert!(tf.h31[20].re.is_nan());
        assert_eq!(tf.coherence[2][20], 0.0);
        assert!((tf.h41[5] - 1.0).norm() < 1e-12);
    }

    #[test]
    fn remainder_is_discarded() {
        let estimator = SpectralEstimator::new(100).unwrap();
        assert_eq!(estimator.block_count(99), 0);
        assert_eq!(estimator.block_count(100), 1);
        assert_eq!(estimator.block_count(299), 2);

        let estimator = estimator.with_overlap(0.5).unwrap();
        assert_eq!(estimator.hop(), 50);
        assert_eq!(estimator.block_count(299), 4);
    }

    #[test]
    fn short_signal_is_insufficient() {
        let silent = vec![0.0; 10];
        let channels = ChannelSet::new(
            1000.0,
            [silent.clone(), silent.clone(), silent.clone(), silent],
        )
        .unwrap();
        let err = SpectralEstimator::new(64).unwrap().estimate(&channels).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientData {
                len: 10,
                block_len: 64
            }
        );
    }

    #[test]
    fn uncorrelated_noise_lowers_coherence() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(5);
        let len = 64 * 128;
        let x: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let noisy: Vec<f64> = x.iter().map(|v| v + rng.gen_range(-1.0..1.0)).collect();
        let channels = ChannelSet::new(1000.0, [x.clone(), noisy, x.clone(), x]).unwrap();
        let tf = SpectralEstimator::new(128)
            .unwrap()
            .with_window(Window::Hann)
            .with_overlap(0.5)
            .unwrap()
            .estimate(&channels)
            .unwrap();
        let mean = |c: &[f64]| c[1..64].iter().sum::<f64>() / 63.0;
        // Equal signal and noise power: γ² ≈ 0.5
        assert!((mean(&tf.coherence[0]) - 0.5).abs() < 0.1);
        assert!(mean(&tf.coherence[1]) > 0.999);
        assert!(!tf.h21[10].re.is_nan());
    }

    #[test]
    fn rejects_bad_overlap() {
        assert!(SpectralEstimator::new(64).unwrap().with_overlap(1.0).is_err());
        assert!(SpectralEstimator::new(1).is_err());
    }
}
