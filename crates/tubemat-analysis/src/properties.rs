//! Acoustic properties from a transfer matrix.
//!
//! All quantities are evaluated per bin from `T11`, `T12/Z₀` and `T21·Z₀`
//! (with `T22 = T11`):
//!
//! - transmission, anechoic termination:
//!   `t = 2e^{jkd} / ((1 + r)·T11 + r·T12/Z₀ + T21·Z₀)`, `r = S_down/S_up`
//! - reflection, rigid backing: `R = (T11 − T21·Z₀) / (T11 + T21·Z₀)`, `α = 1 − |R|²`
//! - normalized characteristic impedance: `z = √((T12/Z₀)/(T21·Z₀))`, `Re z ≥ 0`
//! - wavenumber in the sample: `K = arccos(T11)/d`

use std::f64::consts::PI;

use tracing::{debug, warn};
use tubemat_core::{
    AcousticProperties, AirProperties, Complex64, Result, SquareRoot, TransferMatrix,
    TubeGeometry, TwoPortElements, expj, nan, sqrt_non_negative_real,
};

/// Bound violations smaller than this are attributed to rounding.
pub const PASSIVITY_TOLERANCE: f64 = 1e-6;

/// Transmission coefficient for an anechoic termination.
///
/// `kd` is the air wavenumber times the sample thickness; the phase term
/// refers the transmitted wave to the sample's front face. `area_ratio` is
/// downstream over upstream area: the matrix relates upstream velocity to
/// downstream velocity referred through that ratio, so the anechoic rear
/// face sees `u_d = area_ratio·p_d`.
pub fn transmission_coefficient(e: &TwoPortElements, kd: f64, area_ratio: f64) -> Complex64 {
    2.0 * expj(kd)
        / ((1.0 + area_ratio) * e.t11 + area_ratio * e.t12_norm + e.t21_norm)
}

/// Transmission loss in dB, `−20·log₁₀|t|`.
pub fn transmission_loss_db(t: Complex64) -> f64 {
    -20.0 * t.norm().log10()
}

/// Reflection coefficient of the sample on a rigid backing.
///
/// The backing forces `u_d = 0`, so the surface impedance is `T11/T21` and
/// its normalized form `T11/(T21·Z₀)`.
pub fn reflection_coefficient(e: &TwoPortElements) -> Complex64 {
    (e.t11 - e.t21_norm) / (e.t11 + e.t21_norm)
}

/// Absorption coefficient `1 − |R|²`.
pub fn absorption_coefficient(r: Complex64) -> f64 {
    1.0 - r.norm_sqr()
}

/// Normalized characteristic impedance on the non-negative-real branch.
pub fn characteristic_impedance(e: &TwoPortElements) -> SquareRoot {
    sqrt_non_negative_real(e.t12_norm / e.t21_norm)
}

/// Propagation wavenumber in a sample of thickness `d` (principal arccos).
pub fn sample_wavenumber(e: &TwoPortElements, thickness: f64) -> Complex64 {
    if thickness > 0.0 {
        e.t11.acos() / thickness
    } else {
        nan()
    }
}

/// Derive every property over the matrix's grid.
///
/// Unreliable bins get NaN values. Impedance branch ties and passivity
/// violations do not stop the derivation; they are logged and visible in the
/// returned record.
pub fn derive_properties(
    matrix: &TransferMatrix,
    air: &AirProperties,
    geometry: &TubeGeometry,
) -> Result<AcousticProperties> {
    matrix.validate()?;
    geometry.validate()?;
    let thickness = geometry.thickness;
    let area_ratio = geometry.area_ratio();

    let n = matrix.len();
    let z0 = air.characteristic_impedance();
    let mut props = AcousticProperties {
        frequencies: matrix.frequencies.clone(),
        z0,
        reflection: Vec::with_capacity(n),
        absorption: Vec::with_capacity(n),
        transmission: Vec::with_capacity(n),
        transmission_loss_db: Vec::with_capacity(n),
        impedance: Vec::with_capacity(n),
        impedance_tie: Vec::with_capacity(n),
        wavenumber: Vec::with_capacity(n),
        effective_density: Vec::with_capacity(n),
        effective_bulk_modulus: Vec::with_capacity(n),
        status: matrix.status.clone(),
    };

    for i in 0..n {
        if !matrix.status[i].is_reliable() {
            props.reflection.push(nan());
            props.absorption.push(f64::NAN);
            props.transmission.push(nan());
            props.transmission_loss_db.push(f64::NAN);
            props.impedance.push(nan());
            props.impedance_tie.push(false);
            props.wavenumber.push(nan());
            props.effective_density.push(nan());
            props.effective_bulk_modulus.push(nan());
            continue;
        }

        let freq = matrix.frequencies.frequency(i);
        let omega = 2.0 * PI * freq;
        let e = matrix.at(i);

        let t = transmission_coefficient(&e, air.wavenumber(freq) * thickness, area_ratio);
        let r = reflection_coefficient(&e);
        let z = characteristic_impedance(&e);
        let k = sample_wavenumber(&e, thickness);
        let z_abs = z.value * z0;

        props.transmission.push(t);
        props.transmission_loss_db.push(transmission_loss_db(t));
        props.reflection.push(r);
        props.absorption.push(absorption_coefficient(r));
        props.impedance.push(z.value);
        props.impedance_tie.push(z.tie_broken);
        props.wavenumber.push(k);
        props.effective_density.push(z_abs * k / omega);
        props.effective_bulk_modulus.push(z_abs * omega / k);
    }

    let ties = props.tie_bins();
    if !ties.is_empty() {
        let frequencies: Vec<f64> = ties
            .iter()
            .map(|&i| props.frequencies.frequency(i))
            .collect();
        warn!(
            count = ties.len(),
            ?frequencies,
            "impedance real part exactly zero; chose root with non-negative imaginary part"
        );
    }
    let violations = props.passivity_violations(PASSIVITY_TOLERANCE);
    if !violations.is_empty() {
        warn!(
            count = violations.len(),
            first_hz = props.frequencies.frequency(violations[0]),
            "passivity violated (absorption outside [0, 1] or negative resistance)"
        );
    }
    debug!(bins = n, "derived acoustic properties");
    Ok(props)
}
