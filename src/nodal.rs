//! Nodal corrections for the harmonic constituents.
//!
//! The 18.6-year regression of the lunar orbital node slowly modulates each
//! constituent's effective amplitude (factor `f`) and phase (angle `u`).
//! Formulas follow Schureman's "Manual of Harmonic Analysis and Prediction
//! of Tides" (S.P. 98), truncated to the cos N / sin N leading terms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::{julian_centuries, normalize_degrees};
use crate::constituents::Constituent;

/// Per-instant nodal correction for one constituent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstituentFactor {
    pub constituent: Constituent,
    /// Amplitude factor, clamped to `[0.5, 1.5]`.
    pub f: f64,
    /// Phase correction in degrees, normalized to `(-180, 180]`.
    pub u: f64,
}

/// Mean astronomical arguments at an instant, degrees in `[0, 360)`.
///
/// `s` lunar mean longitude, `h` solar mean longitude, `p` lunar perigee
/// longitude, `n` lunar node longitude, `ps` solar perigee longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AstronomicalArguments {
    pub s: f64,
    pub h: f64,
    pub p: f64,
    pub n: f64,
    pub ps: f64,
}

/// Evaluate the mean-longitude polynomials at an instant.
pub fn astronomical_arguments(instant: DateTime<Utc>) -> AstronomicalArguments {
    let t = julian_centuries(instant);
    AstronomicalArguments {
        s: normalize_degrees(218.316_447_7 + 481_267.881_234_21 * t),
        h: normalize_degrees(280.466_46 + 36_000.769_83 * t),
        p: normalize_degrees(83.353_246_5 + 4_069.013_728_7 * t),
        n: normalize_degrees(125.044_52 - 1_934.136_261 * t),
        ps: normalize_degrees(282.937_3 + 1.719_46 * t),
    }
}

/// Wrap a phase angle in degrees into `(-180, 180]`.
fn wrap_signed(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Nodal correction for a single constituent at node longitude `n` (degrees).
///
/// S2 is a purely solar term and M4/MS4 are compound shallow-water
/// frequencies without independent nodal modulation, so all three carry
/// `f = 1, u = 0`. That is intentional, not a placeholder.
pub fn nodal_correction(constituent: Constituent, n_deg: f64) -> ConstituentFactor {
    let n = n_deg.to_radians();
    let (f, u) = match constituent {
        Constituent::M2 => (1.000_4 - 0.037_3 * n.cos(), -2.14 * n.sin()),
        Constituent::S2 => (1.0, 0.0),
        Constituent::K1 => (1.006_0 + 0.115_0 * n.cos(), -8.86 * n.sin()),
        Constituent::O1 => (1.008_9 + 0.187_1 * n.cos(), 10.80 * n.sin()),
        Constituent::Mf => (1.042_9 + 0.413_5 * n.cos(), -23.74 * n.sin()),
        Constituent::Mm => (1.000_0 - 0.130_0 * n.cos(), 0.0),
        Constituent::M4 => (1.0, 0.0),
        Constituent::MS4 => (1.0, 0.0),
    };

    ConstituentFactor {
        constituent,
        f: f.clamp(0.5, 1.5),
        u: wrap_signed(u),
    }
}

/// Nodal corrections for every known constituent at an instant.
pub fn constituent_factors(instant: DateTime<Utc>) -> Vec<ConstituentFactor> {
    let args = astronomical_arguments(instant);
    Constituent::ALL
        .iter()
        .map(|&c| nodal_correction(c, args.n))
        .collect()
}
