//! Impedance tube geometry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Axial position along the tube, measured from the sample's front face (m).
///
/// The upstream section (source side, mics 1 and 2) lies at negative `x`; the
/// sample occupies `0..thickness`; the downstream section (mics 3 and 4)
/// follows it.
pub type Position = f64;

/// Physical layout of a four-microphone tube.
///
/// ```text
///  source  mic1     mic2          sample          mic3     mic4   termination
///    |------o--------o-----|#################|-----o--------o------|
///           <-  s1  -><-l1->        d         <-l2-><-  s2  ->
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubeGeometry {
    /// Cross-sectional area of the upstream section (m²).
    pub area_upstream: f64,
    /// Cross-sectional area of the downstream section (m²).
    pub area_downstream: f64,
    /// Spacing between mics 1 and 2 (m).
    pub spacing_upstream: f64,
    /// Spacing between mics 3 and 4 (m).
    pub spacing_downstream: f64,
    /// Distance from mic 2 to the sample front face (m).
    pub gap_upstream: f64,
    /// Distance from the sample rear face to mic 3 (m).
    pub gap_downstream: f64,
    /// Sample thickness (m).
    pub thickness: f64,
}

impl TubeGeometry {
    /// Check that every dimension is finite and physically meaningful.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("area_upstream", self.area_upstream),
            ("area_downstream", self.area_downstream),
            ("spacing_upstream", self.spacing_upstream),
            ("spacing_downstream", self.spacing_downstream),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid(name, format!("must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("gap_upstream", self.gap_upstream),
            ("gap_downstream", self.gap_downstream),
            ("thickness", self.thickness),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::invalid(
                    name,
                    format!("must be non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Positions of mics 1 to 4.
    pub fn mic_positions(&self) -> [Position; 4] {
        let x2 = -self.gap_upstream;
        let x1 = x2 - self.spacing_upstream;
        let x3 = self.thickness + self.gap_downstream;
        let x4 = x3 + self.spacing_downstream;
        [x1, x2, x3, x4]
    }

    /// Downstream over upstream cross-sectional area.
    ///
    /// Volume-flow continuity scales downstream particle velocity by this
    /// ratio when it is referred to the upstream section.
    pub fn area_ratio(&self) -> f64 {
        self.area_downstream / self.area_upstream
    }

    /// Geometry with equal circular sections of diameter `bore`.
    pub fn circular(
        bore: f64,
        spacing: f64,
        gap_upstream: f64,
        gap_downstream: f64,
        thickness: f64,
    ) -> Self {
        let area = std::f64::consts::PI * bore * bore / 4.0;
        Self {
            area_upstream: area,
            area_downstream: area,
            spacing_upstream: spacing,
            spacing_downstream: spacing,
            gap_upstream,
            gap_downstream,
            thickness,
        }
    }
}

impl Default for TubeGeometry {
    /// 30 mm bore, 45 mm microphone spacing, 36.5 mm / 99.5 mm gaps, 23.5 mm sample.
    fn default() -> Self {
        Self::circular(0.030, 0.045, 0.0365, 0.0995, 0.0235)
    }
}
