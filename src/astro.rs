//! Low-precision solar & lunar ephemeris and moon-phase calculator.
//!
//! Truncated series after Jean Meeus, "Astronomical Algorithms" (ch. 25 for
//! the Sun, ch. 47 for the Moon), keeping only the leading periodic terms.
//! Accuracy: ~0.01° for solar longitude, ~0.3° for lunar longitude/latitude,
//! well under 1% for lunar distance — more than enough for nodal-correction
//! and tide-classification work, and cheap enough to stay far inside the
//! latency budget without any caching.
//!
//! All computations are closed-form in time; there is no iteration and no
//! shared state, so every function here is safe to call concurrently.

use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Mean length of the synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// Mean Earth-Moon distance in km (Meeus ch. 47 base term).
pub const MEAN_LUNAR_DISTANCE_KM: f64 = 385_000.56;

/// Reference new moon: 2000-01-06T18:14:00Z, as Unix seconds.
const NEW_MOON_EPOCH_UNIX: f64 = 947_182_440.0;

/// J2000.0 (2000-01-01T12:00:00Z) as Unix seconds.
const J2000_UNIX: f64 = 946_728_000.0;

/// Julian day number of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

const DEG: f64 = std::f64::consts::PI / 180.0;

/// Years for which the truncated series are calibrated. Instants outside
/// this range still compute (the series stay numerically valid) but are
/// flagged with a warning because extrapolation degrades accuracy.
const PRACTICAL_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Named phase of the lunation, bucketed from lunar age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

/// Moon phase at an instant: age within the lunation, bucketed name, and
/// illuminated fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPhase {
    /// Days since the last new moon, in `[0, 29.53)`.
    pub age_days: f64,
    /// Phase bucket (new ≈ 0 d, first quarter ≈ 7.38 d, full ≈ 14.77 d,
    /// last quarter ≈ 22.15 d, with ~1.8-day half-bands between).
    pub phase: PhaseName,
    /// Illuminated fraction of the disc, `[0, 1]`.
    pub illumination: f64,
}

/// Ecliptic position of the Sun (geocentric, degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    pub longitude: f64,
    pub latitude: f64,
}

/// Ecliptic position of the Moon (geocentric, degrees and km).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoonPosition {
    pub longitude: f64,
    pub latitude: f64,
    pub distance_km: f64,
}

/// Solar and lunar ecliptic positions at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    pub sun: SunPosition,
    pub moon: MoonPosition,
}

/// Aggregate of everything the calculator can produce for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AstronomicalSnapshot {
    pub moon_phase: MoonPhase,
    pub positions: CelestialPosition,
}

/// Julian day number for a UTC instant.
pub fn julian_day(instant: DateTime<Utc>) -> f64 {
    J2000_JD + (instant.timestamp_millis() as f64 / 1000.0 - J2000_UNIX) / 86_400.0
}

/// Julian centuries since J2000.0.
pub fn julian_centuries(instant: DateTime<Utc>) -> f64 {
    (julian_day(instant) - J2000_JD) / 36_525.0
}

/// Reduce an angle in degrees to `[0, 360)`.
pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 {
        d + 360.0
    } else {
        d
    }
}

fn warn_if_extrapolating(instant: DateTime<Utc>) {
    if !PRACTICAL_YEAR_RANGE.contains(&instant.year()) {
        log::warn!(
            "instant {instant} is outside the calibrated {}-{} range; \
             extrapolated ephemeris results are less accurate",
            PRACTICAL_YEAR_RANGE.start(),
            PRACTICAL_YEAR_RANGE.end()
        );
    }
}

/// Compute the moon phase for a UTC instant.
///
/// Age is measured from the 2000-01-06T18:14Z reference new moon, reduced
/// modulo the mean synodic month. Illumination uses the cosine model
/// `(1 - cos(2π·age/synodic)) / 2`, so a new moon is ≈ 0 and a full moon ≈ 1.
pub fn moon_phase(instant: DateTime<Utc>) -> MoonPhase {
    warn_if_extrapolating(instant);

    let days = (instant.timestamp_millis() as f64 / 1000.0 - NEW_MOON_EPOCH_UNIX) / 86_400.0;
    let age_days = days.rem_euclid(SYNODIC_MONTH_DAYS);

    let illumination = (1.0 - (TAU * age_days / SYNODIC_MONTH_DAYS).cos()) / 2.0;

    // Scale ×8, round to the nearest band, mask back onto [0, 7].
    let index = ((age_days / SYNODIC_MONTH_DAYS * 8.0) + 0.5).floor() as u8 & 7;
    let phase = match index {
        0 => PhaseName::New,
        1 => PhaseName::WaxingCrescent,
        2 => PhaseName::FirstQuarter,
        3 => PhaseName::WaxingGibbous,
        4 => PhaseName::Full,
        5 => PhaseName::WaningGibbous,
        6 => PhaseName::LastQuarter,
        _ => PhaseName::WaningCrescent,
    };

    MoonPhase {
        age_days,
        phase,
        illumination,
    }
}

/// Solar ecliptic longitude in degrees (apparent, low precision).
fn sun_longitude(t: f64) -> f64 {
    let l0 = 280.46646 + t * (36_000.76983 + t * 0.000_3032);
    let m = (357.52911 + t * (35_999.05029 - t * 0.000_1537)) * DEG;

    let center = m.sin() * (1.914_602 - t * (0.004_817 + t * 0.000_014))
        + (2.0 * m).sin() * (0.019_993 - t * 0.000_101)
        + (3.0 * m).sin() * 0.000_289;

    let omega = (125.04 - 1934.136 * t) * DEG;
    normalize_degrees(l0 + center - 0.005_69 - 0.004_78 * omega.sin())
}

/// Lunar ecliptic longitude, latitude, and distance.
///
/// Leading terms of Meeus tables 47.A/47.B; the omitted tail contributes
/// under 0.2° in longitude and under 0.1% in distance.
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    // Fundamental arguments, degrees.
    let lp = normalize_degrees(218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t);
    let d = normalize_degrees(297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t) * DEG;
    let m = normalize_degrees(357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t * t) * DEG;
    let mp = normalize_degrees(134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t) * DEG;
    let f = normalize_degrees(93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t) * DEG;

    let lon = lp
        + 6.288_774 * mp.sin()
        + 1.274_027 * (2.0 * d - mp).sin()
        + 0.658_314 * (2.0 * d).sin()
        + 0.213_618 * (2.0 * mp).sin()
        - 0.185_116 * m.sin()
        - 0.114_332 * (2.0 * f).sin()
        + 0.058_793 * (2.0 * d - 2.0 * mp).sin()
        + 0.057_066 * (2.0 * d - m - mp).sin()
        + 0.053_322 * (2.0 * d + mp).sin()
        + 0.045_758 * (2.0 * d - m).sin();

    let lat = 5.128_122 * f.sin()
        + 0.280_602 * (mp + f).sin()
        + 0.277_693 * (mp - f).sin()
        + 0.173_237 * (2.0 * d - f).sin()
        + 0.055_413 * (2.0 * d - mp + f).sin()
        + 0.046_271 * (2.0 * d - mp - f).sin();

    let dist = MEAN_LUNAR_DISTANCE_KM
        - 20_905.355 * mp.cos()
        - 3_699.111 * (2.0 * d - mp).cos()
        - 2_955.968 * (2.0 * d).cos()
        - 569.925 * (2.0 * mp).cos()
        + 48.888 * m.cos()
        + 246.158 * (2.0 * d - 2.0 * mp).cos()
        - 152.138 * (2.0 * d - m - mp).cos()
        - 170.733 * (2.0 * d + mp).cos()
        - 204.586 * (2.0 * d - m).cos();

    (normalize_degrees(lon), lat, dist)
}

/// Compute solar and lunar ecliptic positions for a UTC instant.
pub fn celestial_positions(instant: DateTime<Utc>) -> CelestialPosition {
    warn_if_extrapolating(instant);

    let t = julian_centuries(instant);
    let (moon_lon, moon_lat, moon_dist) = moon_ecliptic(t);

    CelestialPosition {
        sun: SunPosition {
            longitude: sun_longitude(t),
            // Solar ecliptic latitude never exceeds 1.2 arcsec; zero at
            // this precision.
            latitude: 0.0,
        },
        moon: MoonPosition {
            longitude: moon_lon,
            latitude: moon_lat,
            distance_km: moon_dist,
        },
    }
}

/// Moon phase and celestial positions together.
///
/// Equivalent to calling [`moon_phase`] and [`celestial_positions`] with the
/// same instant; the aggregate exists for call sites that want both.
pub fn calculate_all(instant: DateTime<Utc>) -> AstronomicalSnapshot {
    AstronomicalSnapshot {
        moon_phase: moon_phase(instant),
        positions: celestial_positions(instant),
    }
}

/// Normalized lunar distance where 1.0 is the mean Earth-Moon distance.
/// Below 1.0 toward perigee, above 1.0 toward apogee.
pub fn moon_distance_factor(instant: DateTime<Utc>) -> f64 {
    celestial_positions(instant).moon.distance_km / MEAN_LUNAR_DISTANCE_KM
}
