//! Analytic material models.
//!
//! A material is described as an equivalent fluid with complex effective
//! density ρ̃ and bulk modulus K̃ (time convention `e^{jωt}`; losses appear as
//! `Im ρ̃ ≤ 0` and `Im K̃ ≥ 0`). A [`Layer`] of such a fluid has an exact
//! transfer matrix and serves as the reference for measurements.

use std::f64::consts::PI;

use crate::air::AirProperties;
use crate::complex::{Complex64, J};
use crate::matrix::{TwoPort, TwoPortElements};

/// Frequency-dependent effective properties of a fluid-like material.
pub trait FluidModel {
    /// Effective density ρ̃ (kg/m³) at `freq_hz`.
    fn density(&self, freq_hz: f64, air: &AirProperties) -> Complex64;

    /// Effective bulk modulus K̃ (Pa) at `freq_hz`.
    fn bulk_modulus(&self, freq_hz: f64, air: &AirProperties) -> Complex64;
}

/// Constant effective properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalentFluid {
    /// Effective density (kg/m³).
    pub density: Complex64,
    /// Effective bulk modulus (Pa).
    pub bulk_modulus: Complex64,
}

impl EquivalentFluid {
    /// The tube's own air: ρ₀ and ρ₀c₀².
    pub fn of_air(air: &AirProperties) -> Self {
        Self {
            density: Complex64::new(air.density, 0.0),
            bulk_modulus: Complex64::new(air.density * air.speed_of_sound.powi(2), 0.0),
        }
    }
}

impl FluidModel for EquivalentFluid {
    fn density(&self, _freq_hz: f64, _air: &AirProperties) -> Complex64 {
        self.density
    }

    fn bulk_modulus(&self, _freq_hz: f64, _air: &AirProperties) -> Complex64 {
        self.bulk_modulus
    }
}

/// Rigid frame pierced by parallel cylindrical pores (Zwikker–Kosten).
///
/// Visco-thermal losses in each pore follow from the ratio J₁/J₀ of Bessel
/// functions of complex argument; the porosity scales the pore-fluid values
/// to the homogenized material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylindricalPores {
    /// Pore radius (m).
    pub radius: f64,
    /// Open porosity (0, 1].
    pub porosity: f64,
}

impl CylindricalPores {
    /// Shear wave number s = √(ωρ₀R²/η).
    pub fn shear_number(&self, freq_hz: f64, air: &AirProperties) -> f64 {
        let omega = 2.0 * PI * freq_hz;
        (omega * air.density * self.radius * self.radius / air.viscosity).sqrt()
    }

    /// `1 − 2/(x√−j) · J₁(x√−j)/J₀(x√−j)`, the pore loss factor.
    fn loss_factor(x: f64) -> Complex64 {
        let z = x * Complex64::new(0.0, -1.0).sqrt();
        1.0 - 2.0 / z * bessel_j1_over_j0(z)
    }
}

impl FluidModel for CylindricalPores {
    fn density(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        let s = self.shear_number(freq_hz, air);
        air.density / Self::loss_factor(s) / self.porosity
    }

    fn bulk_modulus(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        let s = self.shear_number(freq_hz, air);
        let thermal = 1.0 - Self::loss_factor(air.prandtl.sqrt() * s);
        air.gamma * air.static_pressure / (1.0 + (air.gamma - 1.0) * thermal) / self.porosity
    }
}

/// J₁(z)/J₀(z) for complex `z`.
///
/// Evaluated by backward recurrence of the ratio `ρₖ = Jₖ/Jₖ₋₁ =
/// z/(2k − z·ρₖ₊₁)`, which is stable where the power series loses precision
/// to cancellation.
pub fn bessel_j1_over_j0(z: Complex64) -> Complex64 {
    let start = 2 * z.norm().ceil() as usize + 64;
    let mut ratio = Complex64::new(0.0, 0.0);
    for k in (1..=start).rev() {
        ratio = z / (2.0 * k as f64 - z * ratio);
    }
    ratio
}

/// A slab of material of given thickness filling the tube cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer<M> {
    /// Material model.
    pub model: M,
    /// Thickness (m).
    pub thickness: f64,
}

impl<M: FluidModel> Layer<M> {
    /// Wrap a material model.
    pub fn new(model: M, thickness: f64) -> Self {
        Self { model, thickness }
    }

    /// Characteristic impedance Z̃ = √(ρ̃K̃) (Pa·s/m).
    pub fn characteristic_impedance(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        (self.model.density(freq_hz, air) * self.model.bulk_modulus(freq_hz, air)).sqrt()
    }

    /// Complex wavenumber k̃ = ω√(ρ̃/K̃) (rad/m).
    pub fn wavenumber(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        let omega = 2.0 * PI * freq_hz;
        omega * (self.model.density(freq_hz, air) / self.model.bulk_modulus(freq_hz, air)).sqrt()
    }

    /// Surface impedance of the layer on a rigid backing, −jZ̃·cot(k̃d).
    pub fn rigid_backed_impedance(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        let kd = self.wavenumber(freq_hz, air) * self.thickness;
        -J * self.characteristic_impedance(freq_hz, air) * kd.cos() / kd.sin()
    }

    /// Reflection coefficient of the layer on a rigid backing.
    pub fn rigid_backed_reflection(&self, freq_hz: f64, air: &AirProperties) -> Complex64 {
        let zs = self.rigid_backed_impedance(freq_hz, air);
        let z0 = air.characteristic_impedance();
        (zs - z0) / (zs + z0)
    }
}

impl<M: FluidModel> TwoPort for Layer<M> {
    fn elements(&self, freq_hz: f64, air: &AirProperties) -> TwoPortElements {
        let kd = self.wavenumber(freq_hz, air) * self.thickness;
        let zc = self.characteristic_impedance(freq_hz, air) / air.characteristic_impedance();
        let sin = kd.sin();
        TwoPortElements {
            t11: kd.cos(),
            t12_norm: J * zc * sin,
            t21_norm: J * sin / zc,
        }
    }
}
