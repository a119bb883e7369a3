//! Synchronized microphone time series.

use crate::error::{Error, Result};

/// Number of microphones in the tube.
pub const MIC_COUNT: usize = 4;

/// Real-valued samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    sample_rate: f64,
    samples: Vec<f64>,
}

impl TimeSeries {
    /// Wrap samples acquired at `sample_rate` Hz.
    pub fn new(sample_rate: f64, samples: Vec<f64>) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid(
                "sample_rate",
                format!("must be positive, got {sample_rate}"),
            ));
        }
        Ok(Self {
            sample_rate,
            samples,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sample values.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// The four time-aligned microphone signals of one acquisition scan.
///
/// Channel 0 is the reference microphone (mic 1, farthest upstream); channels
/// 1..3 are mics 2, 3 and 4 in order of position along the tube. All channels
/// share one sample rate and one length; construction fails otherwise since
/// time alignment can no longer be guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    sample_rate: f64,
    channels: [Vec<f64>; MIC_COUNT],
}

impl ChannelSet {
    /// Build from four equally long channels.
    pub fn new(sample_rate: f64, channels: [Vec<f64>; MIC_COUNT]) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid(
                "sample_rate",
                format!("must be positive, got {sample_rate}"),
            ));
        }
        const NAMES: [&str; MIC_COUNT] = ["channel 1", "channel 2", "channel 3", "channel 4"];
        let expected = channels[0].len();
        for (&name, channel) in NAMES.iter().zip(&channels).skip(1) {
            if channel.len() != expected {
                return Err(Error::length_mismatch(name, expected, channel.len()));
            }
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Build from four [`TimeSeries`], which must agree in rate and length.
    pub fn from_series(series: [TimeSeries; MIC_COUNT]) -> Result<Self> {
        let sample_rate = series[0].sample_rate();
        if let Some(other) = series
            .iter()
            .find(|s| (s.sample_rate() - sample_rate).abs() > f64::EPSILON * sample_rate)
        {
            return Err(Error::invalid(
                "sample_rate",
                format!(
                    "channels disagree: {} Hz vs {} Hz",
                    sample_rate,
                    other.sample_rate()
                ),
            ));
        }
        let [a, b, c, d] = series;
        Self::new(sample_rate, [a.samples, b.samples, c.samples, d.samples])
    }

    /// De-interleave a scan buffer laid out as `[m1, m2, m3, m4, m1, ...]`.
    pub fn from_interleaved(sample_rate: f64, buffer: &[f64]) -> Result<Self> {
        if buffer.len() % MIC_COUNT != 0 {
            return Err(Error::invalid(
                "buffer",
                format!(
                    "{} samples is not a whole number of {MIC_COUNT}-channel frames",
                    buffer.len()
                ),
            ));
        }
        let frames = buffer.len() / MIC_COUNT;
        let mut channels: [Vec<f64>; MIC_COUNT] = std::array::from_fn(|_| Vec::with_capacity(frames));
        for frame in buffer.chunks_exact(MIC_COUNT) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Whether the channels are empty.
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate
    }

    /// Samples of channel `index` (0 = reference).
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    /// Reference channel (mic 1).
    pub fn reference(&self) -> &[f64] {
        &self.channels[0]
    }

    /// All four channels.
    pub fn channels(&self) -> &[Vec<f64>; MIC_COUNT] {
        &self.channels
    }

    /// Drop the first `samples` frames of every channel.
    ///
    /// Used to discard the settling transient at the start of a scan.
    pub fn skip_leading(self, samples: usize) -> Self {
        let skip = samples.min(self.len());
        let channels = self.channels.map(|c| c[skip..].to_vec());
        Self {
            sample_rate: self.sample_rate,
            channels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unequal_lengths_rejected() {
        let err = ChannelSet::new(
            48000.0,
            [vec![0.0; 10], vec![0.0; 10], vec![0.0; 9], vec![0.0; 10]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                what: "channel 3",
                expected: 10,
                found: 9
            }
        );
    }

    #[test]
    fn deinterleave_takes_every_fourth_sample() {
        let buffer: Vec<f64> = (0..12).map(f64::from).collect();
        let set = ChannelSet::from_interleaved(48000.0, &buffer).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.channel(0), &[0.0, 4.0, 8.0]);
        assert_eq!(set.channel(3), &[3.0, 7.0, 11.0]);
    }

    #[test]
    fn deinterleave_rejects_partial_frame() {
        assert!(ChannelSet::from_interleaved(48000.0, &[0.0; 7]).is_err());
    }

    #[test]
    fn skip_leading_trims_all_channels() {
        let set = ChannelSet::new(
            10.0,
            [
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .unwrap()
        .skip_leading(2);
        assert_eq!(set.len(), 1);
        assert_eq!(set.channel(1), &[6.0]);
        assert_eq!(set.duration_secs(), 0.1);
    }

    #[test]
    fn series_must_share_rate() {
        let a = TimeSeries::new(48000.0, vec![0.0; 4]).unwrap();
        let b = TimeSeries::new(44100.0, vec![0.0; 4]).unwrap();
        assert!(ChannelSet::from_series([a.clone(), a.clone(), a, b]).is_err());
    }
}
