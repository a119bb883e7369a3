//! Random-phase multitone excitation.
//!
//! The stimulus is one period of a line spectrum (unit-magnitude tones with
//! random phases) repeated for the requested duration. Because every tone sits
//! exactly on the grid of one period, an analysis block of one period length
//! sees each tone in a single bin with no leakage.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tubemat_core::{Complex64, Error, Result, expj};

use crate::fft::Fft;

/// How tones are distributed over the band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToneSpacing {
    /// Every `step_hz`, rounded to the period grid.
    Linear {
        /// Tone spacing (Hz).
        step_hz: f64,
    },
    /// `count` log-spaced frequencies, rounded to the period grid; tones that
    /// round onto the same bin are merged.
    Logarithmic {
        /// Number of frequencies drawn before rounding.
        count: usize,
    },
}

/// Multitone stimulus generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Multitone {
    sample_rate: f64,
    f_low: f64,
    f_high: f64,
    duration_secs: f64,
    fade_in_secs: f64,
    fade_out_secs: f64,
    period_len: usize,
    spacing: ToneSpacing,
}

impl Multitone {
    /// Create a generator for the band `[f_low, f_high]`.
    ///
    /// Defaults: one-second period (tones on a 1 Hz grid), one tone per grid
    /// line, no fades.
    pub fn new(sample_rate: f64, f_low: f64, f_high: f64, duration_secs: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid(
                "sample_rate",
                format!("must be positive, got {sample_rate}"),
            ));
        }
        if !(f_low > 0.0 && f_low < f_high && f_high <= sample_rate / 2.0) {
            return Err(Error::invalid(
                "band",
                format!(
                    "need 0 < f_low < f_high <= {}, got {f_low}..{f_high}",
                    sample_rate / 2.0
                ),
            ));
        }
        if !(duration_secs.is_finite() && duration_secs > 0.0) {
            return Err(Error::invalid(
                "duration_secs",
                format!("must be positive, got {duration_secs}"),
            ));
        }
        let period_len = sample_rate.round() as usize;
        Ok(Self {
            sample_rate,
            f_low,
            f_high,
            duration_secs,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
            period_len,
            spacing: ToneSpacing::Linear {
                step_hz: sample_rate / period_len as f64,
            },
        })
    }

    /// Raised-cosine fade-in and fade-out lengths.
    pub fn with_fade(mut self, fade_in_secs: f64, fade_out_secs: f64) -> Result<Self> {
        if !(fade_in_secs >= 0.0 && fade_out_secs >= 0.0)
            || fade_in_secs + fade_out_secs > self.duration_secs
        {
            return Err(Error::invalid(
                "fade",
                format!(
                    "fades {fade_in_secs} s + {fade_out_secs} s must fit in {} s",
                    self.duration_secs
                ),
            ));
        }
        self.fade_in_secs = fade_in_secs;
        self.fade_out_secs = fade_out_secs;
        Ok(self)
    }

    /// Length of one excitation period in samples.
    pub fn with_period_len(mut self, period_len: usize) -> Result<Self> {
        if period_len < 4 {
            return Err(Error::invalid(
                "period_len",
                format!("must be at least 4, got {period_len}"),
            ));
        }
        self.period_len = period_len;
        Ok(self)
    }

    /// Tone distribution over the band.
    pub fn with_spacing(mut self, spacing: ToneSpacing) -> Result<Self> {
        let valid = match spacing {
            ToneSpacing::Linear { step_hz } => step_hz.is_finite() && step_hz > 0.0,
            ToneSpacing::Logarithmic { count } => count >= 2,
        };
        if !valid {
            return Err(Error::invalid("spacing", format!("{spacing:?}")));
        }
        self.spacing = spacing;
        Ok(self)
    }

    /// Sample rate (Hz).
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples per excitation period.
    pub fn period_len(&self) -> usize {
        self.period_len
    }

    /// Output length: duration × sample rate.
    pub fn num_samples(&self) -> usize {
        (self.duration_secs * self.sample_rate).round() as usize
    }

    fn resolution(&self) -> f64 {
        self.sample_rate / self.period_len as f64
    }

    /// Period-grid bins carrying a tone, ascending, excluding DC and Nyquist.
    pub fn tone_bins(&self) -> Vec<usize> {
        let df = self.resolution();
        let highest = (self.period_len - 1) / 2;
        let mut bins: Vec<usize> = match self.spacing {
            ToneSpacing::Linear { step_hz } => {
                let step = ((step_hz / df).round() as usize).max(1);
                let first = (self.f_low / df).ceil() as usize;
                let last = (self.f_high / df).floor() as usize;
                (first..=last).step_by(step).collect()
            }
            ToneSpacing::Logarithmic { count } => {
                let ratio = self.f_high / self.f_low;
                (0..count)
                    .map(|i| {
                        let f = self.f_low * ratio.powf(i as f64 / (count - 1) as f64);
                        (f / df).round() as usize
                    })
                    .collect()
            }
        };
        bins.retain(|&bin| bin > 0 && bin <= highest);
        bins.dedup();
        bins
    }

    /// Tone frequencies (Hz).
    pub fn tone_frequencies(&self) -> Vec<f64> {
        let df = self.resolution();
        self.tone_bins().iter().map(|&b| b as f64 * df).collect()
    }

    /// Draw one phase per tone, uniformly in [0, 2π), from a seeded generator.
    pub fn random_phases(&self, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.tone_bins()
            .iter()
            .map(|_| rng.gen_range(0.0..2.0 * PI))
            .collect()
    }

    /// Generate the stimulus with phases drawn from `seed`.
    pub fn generate(&self, seed: u64) -> Result<Vec<f64>> {
        self.render(&self.random_phases(seed))
    }

    /// Render the stimulus for a given phase assignment, normalized to unit peak.
    pub fn render(&self, phases: &[f64]) -> Result<Vec<f64>> {
        self.render_response(phases, |_| Complex64::new(1.0, 0.0))
    }

    /// Render the steady-state output of a linear system driven by the stimulus.
    ///
    /// `response(f)` is the system's complex gain at tone frequency `f`. The
    /// output carries the same fades and the same scale factor as
    /// [`render`](Self::render), so `response = 1` reproduces the stimulus.
    pub fn render_response<F>(&self, phases: &[f64], response: F) -> Result<Vec<f64>>
    where
        F: Fn(f64) -> Complex64,
    {
        let bins = self.tone_bins();
        if bins.is_empty() {
            return Err(Error::invalid(
                "band",
                format!(
                    "no tone between {} Hz and {} Hz on a {} Hz grid",
                    self.f_low,
                    self.f_high,
                    self.resolution()
                ),
            ));
        }
        if phases.len() != bins.len() {
            return Err(Error::length_mismatch("phases", bins.len(), phases.len()));
        }

        let stimulus = self.synthesize(&bins, phases, |_| Complex64::new(1.0, 0.0));
        let peak = stimulus.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        if peak == 0.0 {
            return Err(Error::invalid("band", "stimulus is silent"));
        }
        let scale = 1.0 / peak;

        let mut output = self.synthesize(&bins, phases, response);
        for x in &mut output {
            *x *= scale;
        }
        debug!(
            tones = bins.len(),
            samples = output.len(),
            crest_factor = peak / rms(&stimulus).max(f64::MIN_POSITIVE),
            "rendered multitone"
        );
        Ok(output)
    }

    /// One period by inverse FFT, tiled to full length, with fades applied.
    fn synthesize<F>(&self, bins: &[usize], phases: &[f64], response: F) -> Vec<f64>
    where
        F: Fn(f64) -> Complex64,
    {
        let df = self.resolution();
        let mut spectrum = vec![Complex64::new(0.0, 0.0); self.period_len / 2 + 1];
        for (&bin, &phase) in bins.iter().zip(phases) {
            spectrum[bin] = expj(phase) * response(bin as f64 * df);
        }
        let period = Fft::new(self.period_len).inverse(&spectrum);

        let mut output: Vec<f64> = period
            .iter()
            .copied()
            .cycle()
            .take(self.num_samples())
            .collect();
        self.apply_fades(&mut output);
        output
    }

    fn apply_fades(&self, output: &mut [f64]) {
        let n = output.len();
        let fade_in = ((self.fade_in_secs * self.sample_rate).round() as usize).min(n);
        let fade_out = ((self.fade_out_secs * self.sample_rate).round() as usize).min(n);
        for i in 0..fade_in {
            output[i] *= 0.5 * (1.0 - (PI * i as f64 / fade_in as f64).cos());
        }
        for i in 0..fade_out {
            output[n - 1 - i] *= 0.5 * (1.0 - (PI * i as f64 / fade_out as f64).cos());
        }
    }
}

fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_duration_times_rate() {
        let multitone = Multitone::new(8000.0, 100.0, 1000.0, 2.5).unwrap();
        assert_eq!(multitone.num_samples(), 20000);
        assert_eq!(multitone.generate(1).unwrap().len(), 20000);
    }

    #[test]
    fn unit_peak_and_deterministic() {
        let multitone = Multitone::new(8000.0, 100.0, 1000.0, 1.0).unwrap();
        let a = multitone.generate(7).unwrap();
        let b = multitone.generate(7).unwrap();
        let c = multitone.generate(8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        let peak = a.iter().fold(0.0f64, |m, x| m.max(x.abs()));
        assert!((peak - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_tones_cover_band() {
        let multitone = Multitone::new(8000.0, 100.0, 1000.0, 1.0)
            .unwrap()
            .with_spacing(ToneSpacing::Linear { step_hz: 10.0 })
            .unwrap();
        let freqs = multitone.tone_frequencies();
        assert_eq!(freqs.first(), Some(&100.0));
        assert_eq!(freqs.last(), Some(&1000.0));
        assert_eq!(freqs.len(), 91);
    }

    #[test]
    fn log_tones_are_rounded_and_unique() {
        let multitone = Multitone::new(48000.0, 50.0, 3000.0, 1.0)
            .unwrap()
            .with_spacing(ToneSpacing::Logarithmic { count: 800 })
            .unwrap();
        let bins = multitone.tone_bins();
        assert!(bins.len() < 800, "low end collapses onto shared bins");
        assert!(bins.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(bins.first(), Some(&50));
        assert_eq!(bins.last(), Some(&3000));
    }

    #[test]
    fn tones_land_in_single_bins() {
        let multitone = Multitone::new(1024.0, 10.0, 100.0, 1.0)
            .unwrap()
            .with_spacing(ToneSpacing::Linear { step_hz: 30.0 })
            .unwrap();
        let signal = multitone.generate(3).unwrap();
        let spectrum = Fft::new(1024).forward(&signal);
        let bins = multitone.tone_bins();
        assert_eq!(bins, vec![10, 40, 70, 100]);
        let tone = spectrum[40].norm();
        for (i, c) in spectrum.iter().enumerate() {
            if bins.contains(&i) {
                assert!((c.norm() - tone).abs() < 1e-9 * tone);
            } else {
                assert!(c.norm() < 1e-9 * tone, "leakage in bin {i}");
            }
        }
    }

    #[test]
    fn unit_response_reproduces_stimulus() {
        let multitone = Multitone::new(8000.0, 100.0, 1000.0, 0.5)
            .unwrap()
            .with_fade(0.05, 0.05)
            .unwrap();
        let phases = multitone.random_phases(11);
        let stimulus = multitone.render(&phases).unwrap();
        let response = multitone
            .render_response(&phases, |_| Complex64::new(1.0, 0.0))
            .unwrap();
        assert_eq!(stimulus, response);
        assert_eq!(stimulus[0], 0.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(Multitone::new(8000.0, 1000.0, 100.0, 1.0).is_err());
        assert!(Multitone::new(8000.0, 100.0, 5000.0, 1.0).is_err());
        assert!(Multitone::new(8000.0, 100.0, 1000.0, 0.0).is_err());
        let multitone = Multitone::new(8000.0, 100.0, 1000.0, 1.0).unwrap();
        assert!(multitone.clone().with_fade(0.6, 0.6).is_err());
        assert!(multitone.clone().with_period_len(2).is_err());
        assert!(multitone.render(&[0.0; 3]).unwrap_err().is_length_mismatch());
    }
}
