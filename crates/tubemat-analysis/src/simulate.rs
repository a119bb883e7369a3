//! Synthetic four-microphone recordings from an analytic sample.
//!
//! The downstream section ends in an anechoic termination, so it carries only
//! the transmitted wave. The sample's transfer matrix maps the rear-face state
//! back to the front face, which fixes the upstream incident and reflected
//! waves; microphone pressures follow from the plane-wave field.

use tubemat_core::{
    AirProperties, ChannelSet, Complex64, FrequencySet, MIC_COUNT, Result, TransferFunctionSet,
    TubeGeometry, TwoPort, expj,
};

use crate::multitone::Multitone;

/// An impedance tube holding a known sample.
#[derive(Debug, Clone)]
pub struct SyntheticTube<S> {
    sample: S,
    geometry: TubeGeometry,
    air: AirProperties,
    gains: [Complex64; MIC_COUNT],
}

impl<S: TwoPort> SyntheticTube<S> {
    /// Tube with ideal, matched microphones.
    pub fn new(sample: S, geometry: TubeGeometry, air: AirProperties) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            sample,
            geometry,
            air,
            gains: [Complex64::new(1.0, 0.0); MIC_COUNT],
        })
    }

    /// Complex gain of each microphone channel.
    pub fn with_channel_gains(mut self, gains: [Complex64; MIC_COUNT]) -> Self {
        self.gains = gains;
        self
    }

    /// Upstream incident and reflected amplitudes at `x = 0` for a
    /// transmitted wave of unit amplitude.
    fn upstream_waves(&self, freq_hz: f64) -> (Complex64, Complex64) {
        let k = self.air.wavenumber(freq_hz);
        let d = self.geometry.thickness;
        let e = self.sample.elements(freq_hz, &self.air);

        // Rear face: transmitted wave only
        let pd = expj(-k * d);
        let ud = pd * self.geometry.area_ratio();
        let p0 = e.t11 * pd + e.t12_norm * ud;
        let u0 = e.t21_norm * pd + e.t11 * ud;
        ((p0 + u0) / 2.0, (p0 - u0) / 2.0)
    }

    /// Transmitted over incident pressure amplitude, both referred to `x = 0`.
    pub fn transmission(&self, freq_hz: f64) -> Complex64 {
        let (incident, _) = self.upstream_waves(freq_hz);
        1.0 / incident
    }

    /// Pressures at mics 1 to 4 for a unit incident wave, before channel gains.
    pub fn pressures(&self, freq_hz: f64) -> [Complex64; MIC_COUNT] {
        let k = self.air.wavenumber(freq_hz);
        let (incident, reflected) = self.upstream_waves(freq_hz);

        let [x1, x2, x3, x4] = self.geometry.mic_positions();
        let upstream = |x: f64| (incident * expj(-k * x) + reflected * expj(k * x)) / incident;
        let downstream = |x: f64| expj(-k * x) / incident;
        [upstream(x1), upstream(x2), downstream(x3), downstream(x4)]
    }

    /// Channel responses: pressures times channel gains.
    pub fn channel_responses(&self, freq_hz: f64) -> [Complex64; MIC_COUNT] {
        let p = self.pressures(freq_hz);
        std::array::from_fn(|i| p[i] * self.gains[i])
    }

    /// Exact transfer functions `H_i1` on `frequencies`, as an ideal estimator
    /// would measure them through the channel gains.
    pub fn transfer_functions(&self, frequencies: &FrequencySet) -> Result<TransferFunctionSet> {
        let mut h: [Vec<Complex64>; 3] = Default::default();
        for freq in frequencies.iter() {
            let r = self.channel_responses(freq);
            for (dst, ri) in h.iter_mut().zip(&r[1..]) {
                dst.push(ri / r[0]);
            }
        }
        let [h21, h31, h41] = h;
        TransferFunctionSet::new(frequencies.clone(), h21, h31, h41)
    }

    /// Render the four microphone signals for a multitone excitation.
    pub fn render(&self, stimulus: &Multitone, phases: &[f64]) -> Result<ChannelSet> {
        let mut channels: [Vec<f64>; MIC_COUNT] = Default::default();
        for (i, channel) in channels.iter_mut().enumerate() {
            *channel = stimulus.render_response(phases, |f| self.channel_responses(f)[i])?;
        }
        ChannelSet::new(stimulus.sample_rate(), channels)
    }

    /// Render a through measurement: every microphone exposed to the same
    /// field, so the recording differs between channels only by their gains.
    pub fn render_through(&self, stimulus: &Multitone, phases: &[f64]) -> Result<ChannelSet> {
        let mut channels: [Vec<f64>; MIC_COUNT] = Default::default();
        for (channel, &gain) in channels.iter_mut().zip(&self.gains) {
            *channel = stimulus.render_response(phases, |_| gain)?;
        }
        ChannelSet::new(stimulus.sample_rate(), channels)
    }
}
