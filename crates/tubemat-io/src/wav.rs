//! WAV file reading and writing.
//!
//! Scans are stored as interleaved four-channel WAV files, channel order
//! mic 1 to mic 4. Integer PCM is scaled to [-1, 1); 32-bit files are float.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use tubemat_core::{ChannelSet, MIC_COUNT};

use crate::{Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels);
    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        format,
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample: 16 or 24 for PCM, 32 for float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Decode every sample of an open reader to `f64`, in file order.
pub(crate) fn decode<R: Read + 'static>(
    reader: WavReader<R>,
) -> Box<dyn Iterator<Item = Result<f64>>> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => Box::new(
            reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from).map_err(Error::from)),
        ),
        SampleFormat::Int => {
            let full_scale = f64::from(1u32 << (spec.bits_per_sample - 1));
            Box::new(
                reader
                    .into_samples::<i32>()
                    .map(move |s| s.map(|v| f64::from(v) / full_scale).map_err(Error::from)),
            )
        }
    }
}

/// Read a WAV file as interleaved samples along with its spec.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let samples = decode(reader).collect::<Result<Vec<_>>>()?;
    Ok((samples, spec))
}

/// Read a four-channel scan.
///
/// Files with any other channel count are rejected; there is no implicit
/// mixing or padding of microphone channels.
pub fn read_channels<P: AsRef<Path>>(path: P) -> Result<ChannelSet> {
    let (samples, spec) = read_wav(path)?;
    if usize::from(spec.channels) != MIC_COUNT {
        return Err(Error::ChannelCount {
            expected: MIC_COUNT as u16,
            found: spec.channels,
        });
    }
    Ok(ChannelSet::from_interleaved(
        f64::from(spec.sample_rate),
        &samples,
    )?)
}

/// Write interleaved samples to a WAV file.
///
/// Samples are clipped to the integer range for PCM formats.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f64], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample as f32)?;
        }
    } else {
        let full_scale = f64::from(1u32 << (spec.bits_per_sample - 1));
        for &sample in samples {
            let int_sample = (sample * full_scale).clamp(-full_scale, full_scale - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Write a four-channel scan, interleaved mic 1 to mic 4.
pub fn write_channels<P: AsRef<Path>>(
    path: P,
    channels: &ChannelSet,
    bits_per_sample: u16,
) -> Result<()> {
    let sample_rate = channels.sample_rate();
    if sample_rate.fract() != 0.0 || sample_rate > f64::from(u32::MAX) {
        return Err(tubemat_core::Error::invalid(
            "sample_rate",
            format!("WAV needs an integer rate, got {sample_rate}"),
        )
        .into());
    }
    let spec = WavSpec {
        channels: MIC_COUNT as u16,
        sample_rate: sample_rate as u32,
        bits_per_sample,
    };
    let mut interleaved = Vec::with_capacity(channels.len() * MIC_COUNT);
    for frame in 0..channels.len() {
        interleaved.extend(channels.channels().iter().map(|c| c[frame]));
    }
    write_wav(path, &interleaved, spec)
}
