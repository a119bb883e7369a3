//! Ambient air inside the tube.
//!
//! Properties are plain values computed once per run. Humid-air thermophysics
//! is outside this crate: callers with a better property source construct
//! [`AirProperties`] directly, everyone else uses the dry-air ideal-gas
//! approximation in [`AirProperties::from_conditions`].

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Offset between Celsius and Kelvin.
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// Specific gas constant of dry air (J/(kg·K)).
pub const DRY_AIR_GAS_CONSTANT: f64 = 287.05;

/// Standard atmospheric pressure (Pa).
pub const STANDARD_PRESSURE: f64 = 101_325.0;

/// Thermodynamic and transport properties of the air in the tube.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirProperties {
    /// Density ρ₀ (kg/m³).
    pub density: f64,
    /// Adiabatic speed of sound c₀ (m/s).
    pub speed_of_sound: f64,
    /// Static pressure P₀ (Pa).
    pub static_pressure: f64,
    /// Ratio of specific heats γ.
    pub gamma: f64,
    /// Dynamic viscosity η (Pa·s).
    pub viscosity: f64,
    /// Prandtl number.
    pub prandtl: f64,
}

impl AirProperties {
    /// Dry air at `temperature_c` °C and `pressure_pa` Pa.
    ///
    /// c₀ = 20.05·√T, ρ₀ = P₀/(R·T), viscosity from Sutherland's law.
    pub fn from_conditions(temperature_c: f64, pressure_pa: f64) -> Result<Self> {
        let kelvin = temperature_c + ZERO_CELSIUS_K;
        if !(kelvin.is_finite() && kelvin > 0.0) {
            return Err(Error::invalid(
                "temperature_c",
                format!("{temperature_c} °C is below absolute zero"),
            ));
        }
        if !(pressure_pa.is_finite() && pressure_pa > 0.0) {
            return Err(Error::invalid(
                "pressure_pa",
                format!("must be positive, got {pressure_pa}"),
            ));
        }
        Ok(Self {
            density: pressure_pa / (DRY_AIR_GAS_CONSTANT * kelvin),
            speed_of_sound: 20.05 * kelvin.sqrt(),
            static_pressure: pressure_pa,
            gamma: 1.4,
            viscosity: 1.458e-6 * kelvin.powf(1.5) / (kelvin + 110.4),
            prandtl: 0.71,
        })
    }

    /// Characteristic impedance Z₀ = ρ₀c₀ (Pa·s/m).
    pub fn characteristic_impedance(&self) -> f64 {
        self.density * self.speed_of_sound
    }

    /// Free-field wavenumber k = ω/c₀ (rad/m).
    pub fn wavenumber(&self, freq_hz: f64) -> f64 {
        2.0 * PI * freq_hz / self.speed_of_sound
    }

    /// Viscous boundary-layer thickness δ = √(2η/(ωρ₀)) (m).
    pub fn viscous_skin_depth(&self, freq_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz;
        (2.0 * self.viscosity / (omega * self.density)).sqrt()
    }

    /// Thermal boundary-layer thickness δ′ = √(2η/(ω·Pr·ρ₀)) (m).
    pub fn thermal_skin_depth(&self, freq_hz: f64) -> f64 {
        self.viscous_skin_depth(freq_hz) / self.prandtl.sqrt()
    }
}

impl Default for AirProperties {
    /// Dry air at 20 °C and standard pressure.
    fn default() -> Self {
        let kelvin = 20.0 + ZERO_CELSIUS_K;
        Self {
            density: STANDARD_PRESSURE / (DRY_AIR_GAS_CONSTANT * kelvin),
            speed_of_sound: 20.05 * kelvin.sqrt(),
            static_pressure: STANDARD_PRESSURE,
            gamma: 1.4,
            viscosity: 1.458e-6 * kelvin.powf(1.5) / (kelvin + 110.4),
            prandtl: 0.71,
        }
    }
}
