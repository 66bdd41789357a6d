//! Tide-type classification and intensity scoring.
//!
//! Uses the Japanese-tradition five-way split of tidal range strength —
//! spring (大潮), medium (中潮), neap (小潮), long (長潮), and young (若潮) —
//! keyed to lunar age, which is finer-grained than the plain spring/neap
//! dichotomy. The intensity score additionally folds in lunar distance
//! (perigee amplifies, apogee dampens) and proximity to an equinox.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::{self, MoonPhase, SYNODIC_MONTH_DAYS};
use crate::error::{TideError, TideResult};

/// Five-way tide-type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TideType {
    Spring,
    Neap,
    Medium,
    Long,
    Young,
}

/// Day-of-year of the March and September equinoxes.
const EQUINOX_DAYS: [f64; 2] = [79.0, 265.0];

/// Half-window around an equinox inside which the seasonal boost applies.
const EQUINOX_WINDOW_DAYS: f64 = 30.0;

/// E-folding scale of the seasonal boost decay, in days.
const EQUINOX_DECAY_DAYS: f64 = 12.0;

/// Distance factors outside this band are accepted but flagged; they are
/// physically implausible for the Earth-Moon system.
const PLAUSIBLE_DISTANCE_FACTORS: std::ops::RangeInclusive<f64> = 0.8..=1.2;

fn validated_age(moon: &MoonPhase) -> TideResult<f64> {
    let age = moon.age_days;
    if !(0.0..=SYNODIC_MONTH_DAYS).contains(&age) {
        return Err(TideError::InvalidInput(format!(
            "lunar age {age} outside [0, {SYNODIC_MONTH_DAYS}]"
        )));
    }
    // A full synodic month is the same point in the cycle as age zero.
    if age >= SYNODIC_MONTH_DAYS {
        return Ok(0.0);
    }
    Ok(age)
}

/// Classify the tide type from the lunar age.
///
/// The day ranges are fixed boundaries, reproduced exactly:
/// spring covers the syzygies, neap the quadratures, with long and young
/// tides in the transition out of each neap and medium everywhere else.
pub fn classify_tide_type(moon: &MoonPhase) -> TideResult<TideType> {
    let age = validated_age(moon)?;

    let tide_type = if (0.0..=2.5).contains(&age) || age >= 27.5 || (12.0..=17.5).contains(&age) {
        TideType::Spring
    } else if (5.5..=9.0).contains(&age) || (20.0..=24.0).contains(&age) {
        TideType::Neap
    } else if (age > 9.0 && age <= 10.5) || (age > 24.0 && age <= 25.5) {
        TideType::Long
    } else if (age > 10.5 && age < 12.0) || (age > 25.5 && age < 27.5) {
        TideType::Young
    } else {
        TideType::Medium
    };

    Ok(tide_type)
}

/// Intensity score on a 0-120 scale.
///
/// `moon_distance_factor` is the normalized Earth-Moon distance where 1.0 is
/// the mean (see [`astro::moon_distance_factor`]); it must be positive.
/// `now` anchors the seasonal correction; `None` uses the current instant.
///
/// The base score is a smooth function of lunar age peaking at new and full
/// moon and bottoming at the quarters, spanning roughly 10-90. Perigee can
/// push the corrected score past 100; that headroom is intentional and the
/// result is only clamped at 120.
pub fn tide_strength(
    moon: &MoonPhase,
    moon_distance_factor: f64,
    now: Option<DateTime<Utc>>,
) -> TideResult<u8> {
    if moon_distance_factor.is_nan() || moon_distance_factor <= 0.0 {
        return Err(TideError::InvalidDistanceFactor(moon_distance_factor));
    }
    if !PLAUSIBLE_DISTANCE_FACTORS.contains(&moon_distance_factor) {
        log::warn!(
            "moon distance factor {moon_distance_factor} outside plausible range \
             [{}, {}]",
            PLAUSIBLE_DISTANCE_FACTORS.start(),
            PLAUSIBLE_DISTANCE_FACTORS.end()
        );
    }
    let age = validated_age(moon)?;

    // Two full oscillations per lunation: maxima at the syzygies, minima at
    // the quadratures. Range [10, 90].
    let base = 50.0 + 40.0 * (2.0 * std::f64::consts::TAU * age / SYNODIC_MONTH_DAYS).cos();

    // Inverse-cube tidal force scaling, bounded to keep outliers sane.
    let distance = (1.0 / moon_distance_factor).powi(3).clamp(0.8, 1.3);

    let seasonal = seasonal_factor(now.unwrap_or_else(Utc::now));

    let score = (base * distance * seasonal).round().clamp(0.0, 120.0);
    Ok(score as u8)
}

/// Equinoctial boost: up to 1.1× within 30 days of day-of-year 79 or 265,
/// decaying exponentially with distance from the equinox date.
fn seasonal_factor(now: DateTime<Utc>) -> f64 {
    let doy = now.ordinal() as f64;
    let days_from_equinox = EQUINOX_DAYS
        .iter()
        .map(|&eq| {
            let direct = (doy - eq).abs();
            direct.min(365.0 - direct)
        })
        .fold(f64::INFINITY, f64::min);

    if days_from_equinox > EQUINOX_WINDOW_DAYS {
        return 1.0;
    }
    1.0 + 0.1 * (-days_from_equinox / EQUINOX_DECAY_DAYS).exp()
}

/// Moon phase for a date; named here because classification call sites need
/// it directly. Delegates to the astronomical calculator.
pub fn moon_phase_for_date(date: DateTime<Utc>) -> MoonPhase {
    astro::moon_phase(date)
}
