//! Harmonic synthesis, extremum search, and tidal stream strength.
//!
//! The predicted water level at an instant is the sum of weighted cosine
//! waves, one per constituent, each adjusted by its nodal correction:
//!
//! ```text
//! level(t) = Σ  A·f · cos(ω·t + φ + u)
//! ```
//!
//! with `t` in hours since the 2000-01-01T12:00Z epoch, `ω` the constituent
//! speed in degrees/hour, `φ` the location phase lag, and `(f, u)` from the
//! nodal module. The argument is reduced mod 360° before the trig call so
//! large `t` values keep full precision.
//!
//! High/low water detection is a two-pass numerical search (coarse slope
//! scan, then local refinement); the stream rate is the exact analytic
//! derivative of the sum, not a finite difference.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constituents::Constituent;
use crate::error::{TideError, TideResult};
use crate::nodal::{astronomical_arguments, nodal_correction};
use crate::settings::SearchSettings;
use crate::HarmonicConstant;

/// Harmonic time origin: 2000-01-01T12:00:00Z as Unix seconds.
const HARMONIC_EPOCH_UNIX: f64 = 946_728_000.0;

/// Window scanned by [`next_extreme`]: two semidiurnal days always contain
/// at least one high and one low for any constituent set with tidal energy.
const NEXT_EXTREME_WINDOW_HOURS: i64 = 48;

/// A high or low water event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidalExtreme {
    pub time: DateTime<Utc>,
    /// Water level in cm relative to the harmonic mean.
    pub level: f64,
    pub kind: ExtremeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeKind {
    High,
    Low,
}

/// Instantaneous tidal stream state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideStrength {
    /// Strength on the 0-10 scale derived from `|rate|`.
    pub value: f64,
    /// Signed rate of change in cm/hour.
    pub rate: f64,
    pub direction: FlowDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Rising,
    Falling,
}

/// One point of a sampled tide curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideSample {
    pub time: DateTime<Utc>,
    /// Water level in cm relative to the harmonic mean.
    pub level: f64,
}

/// Hours since the harmonic epoch (negative before 2000-01-01T12:00Z).
fn hours_since_epoch(instant: DateTime<Utc>) -> f64 {
    (instant.timestamp_millis() as f64 / 1000.0 - HARMONIC_EPOCH_UNIX) / 3_600.0
}

/// A constant resolved against the constituent table and the nodal state.
struct ResolvedTerm {
    speed: f64,
    amplitude: f64,
    phase: f64,
    f: f64,
    u: f64,
}

/// Resolve a constant list at an instant. Unknown constituent names are
/// skipped with a warning; they never abort an otherwise valid list.
fn resolve_terms(instant: DateTime<Utc>, constants: &[HarmonicConstant]) -> Vec<ResolvedTerm> {
    let n = astronomical_arguments(instant).n;
    constants
        .iter()
        .filter_map(|hc| match hc.constituent.parse::<Constituent>() {
            Ok(c) => {
                let correction = nodal_correction(c, n);
                Some(ResolvedTerm {
                    speed: c.frequency(),
                    amplitude: hc.amplitude,
                    phase: hc.phase,
                    f: correction.f,
                    u: correction.u,
                })
            }
            Err(_) => {
                log::warn!(
                    "skipping unknown constituent '{}' in harmonic constant list",
                    hc.constituent
                );
                None
            }
        })
        .collect()
}

/// Synthesis core without the emptiness check; used by the search loops.
fn level_at(instant: DateTime<Utc>, constants: &[HarmonicConstant]) -> f64 {
    let t = hours_since_epoch(instant);
    resolve_terms(instant, constants)
        .iter()
        .map(|term| {
            let arg = (term.speed * t + term.phase + term.u).rem_euclid(360.0);
            term.amplitude * term.f * arg.to_radians().cos()
        })
        .sum()
}

/// Predicted water level in cm at an instant.
///
/// A zero-amplitude entry contributes exactly zero regardless of phase.
pub fn tide_level(instant: DateTime<Utc>, constants: &[HarmonicConstant]) -> TideResult<f64> {
    if constants.is_empty() {
        return Err(TideError::EmptyConstituents);
    }
    Ok(level_at(instant, constants))
}

/// Locate high/low water events between `start` and `end`.
///
/// Coarse pass: sample every 30 minutes and flag a candidate wherever the
/// finite-difference slope changes sign. Refinement pass: re-sample the
/// flanking interval at 5-minute resolution and walk to the local max or
/// min. If refinement finds nothing better than the coarse sample, the
/// interval midpoint is reported — a degraded but non-fatal result.
///
/// A flat (all-zero-amplitude) input yields zero extrema; that is a valid
/// answer, not an error.
pub fn find_tidal_extremes(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    constants: &[HarmonicConstant],
) -> TideResult<Vec<TidalExtreme>> {
    find_tidal_extremes_with(start, end, constants, &SearchSettings::default())
}

/// [`find_tidal_extremes`] with explicit search resolutions.
pub fn find_tidal_extremes_with(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    constants: &[HarmonicConstant],
    search: &SearchSettings,
) -> TideResult<Vec<TidalExtreme>> {
    if end <= start {
        return Err(TideError::InvalidRange);
    }
    if constants.is_empty() {
        return Err(TideError::EmptyConstituents);
    }
    if search.coarse_step_minutes == 0 || search.refine_step_minutes == 0 {
        return Err(TideError::InvalidInput(
            "search step minutes must be positive".to_string(),
        ));
    }

    let coarse_step = Duration::minutes(i64::from(search.coarse_step_minutes));
    let mut samples = Vec::new();
    let mut t = start;
    while t <= end {
        samples.push((t, level_at(t, constants)));
        t += coarse_step;
    }

    let mut extremes = Vec::new();
    for i in 1..samples.len().saturating_sub(1) {
        let d_prev = samples[i].1 - samples[i - 1].1;
        let d_next = samples[i + 1].1 - samples[i].1;

        let kind = if d_prev > 0.0 && d_next < 0.0 {
            ExtremeKind::High
        } else if d_prev < 0.0 && d_next > 0.0 {
            ExtremeKind::Low
        } else {
            // No sign change; a flat curve never produces candidates.
            continue;
        };

        extremes.push(refine_extreme(
            samples[i - 1].0,
            samples[i + 1].0,
            samples[i],
            kind,
            search.refine_step_minutes,
            constants,
        ));
    }

    Ok(extremes)
}

/// Walk the candidate interval at fine resolution toward the true extremum.
fn refine_extreme(
    lo: DateTime<Utc>,
    hi: DateTime<Utc>,
    coarse: (DateTime<Utc>, f64),
    kind: ExtremeKind,
    refine_step_minutes: u32,
    constants: &[HarmonicConstant],
) -> TidalExtreme {
    let step = Duration::minutes(i64::from(refine_step_minutes));
    let (mut best_time, mut best_level) = coarse;
    let mut improved = false;

    let mut t = lo;
    while t <= hi {
        let level = level_at(t, constants);
        let better = match kind {
            ExtremeKind::High => level > best_level,
            ExtremeKind::Low => level < best_level,
        };
        if better {
            best_time = t;
            best_level = level;
            improved = true;
        }
        t += step;
    }

    if !improved {
        // Best-effort heuristic: report the interval midpoint rather than
        // dropping the event.
        log::warn!(
            "extremum refinement found no improvement in [{lo}, {hi}]; reporting midpoint"
        );
        best_time = lo + (hi - lo) / 2;
        best_level = level_at(best_time, constants);
    }

    TidalExtreme {
        time: best_time,
        level: best_level,
        kind,
    }
}

/// Instantaneous strength, rate, and direction of the tidal stream.
///
/// The rate is the exact analytic derivative of the harmonic sum,
/// `d/dt [A·f·cos(ωt + φ + u)] = -A·f·ω·sin(ωt + φ + u)`, summed per
/// constituent — no finite differencing.
pub fn tide_strength(
    instant: DateTime<Utc>,
    constants: &[HarmonicConstant],
) -> TideResult<TideStrength> {
    if constants.is_empty() {
        return Err(TideError::EmptyConstituents);
    }

    let t = hours_since_epoch(instant);
    let rate: f64 = resolve_terms(instant, constants)
        .iter()
        .map(|term| {
            let arg = (term.speed * t + term.phase + term.u).rem_euclid(360.0);
            -term.amplitude * term.f * term.speed.to_radians() * arg.to_radians().sin()
        })
        .sum();

    let direction = if rate >= 0.0 {
        FlowDirection::Rising
    } else {
        FlowDirection::Falling
    };

    Ok(TideStrength {
        value: strength_value(rate.abs()),
        rate,
        direction,
    })
}

/// Band mapping of `|rate|` in cm/hour onto the 0-10 scale.
///
/// The breakpoints at 2, 8, 20 and 40 cm/h separate stagnant, weak,
/// moderate, and strong flow. Downstream labels key off these exact values;
/// they are documented thresholds, not free parameters. Beyond 40 cm/h the
/// scale saturates asymptotically toward 10.
fn strength_value(rate_abs: f64) -> f64 {
    const BANDS: [(f64, f64, f64, f64); 4] = [
        (0.0, 2.0, 0.0, 1.0),
        (2.0, 8.0, 1.0, 4.0),
        (8.0, 20.0, 4.0, 7.0),
        (20.0, 40.0, 7.0, 9.0),
    ];
    for (lo, hi, value_lo, value_hi) in BANDS {
        if rate_abs < hi {
            return value_lo + (rate_abs - lo) / (hi - lo) * (value_hi - value_lo);
        }
    }
    10.0 - (-(rate_abs - 40.0) / 40.0).exp()
}

/// Sample the tide curve at a fixed minute step across a window.
///
/// Returns time-ordered samples including both endpoints where the step
/// divides the window evenly. Callers compose their own view models from
/// this; no display structure is produced here.
pub fn tide_curve(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_minutes: u32,
    constants: &[HarmonicConstant],
) -> TideResult<Vec<TideSample>> {
    if end <= start {
        return Err(TideError::InvalidRange);
    }
    if step_minutes == 0 {
        return Err(TideError::InvalidInput(
            "curve step minutes must be positive".to_string(),
        ));
    }
    if constants.is_empty() {
        return Err(TideError::EmptyConstituents);
    }

    let step = Duration::minutes(i64::from(step_minutes));
    let mut samples = Vec::new();
    let mut t = start;
    while t <= end {
        samples.push(TideSample {
            time: t,
            level: level_at(t, constants),
        });
        t += step;
    }
    Ok(samples)
}

/// First high or low water after `after`, searching a 48-hour window.
///
/// Returns `Ok(None)` for flat input (no tidal energy, no events).
pub fn next_extreme(
    after: DateTime<Utc>,
    constants: &[HarmonicConstant],
) -> TideResult<Option<TidalExtreme>> {
    let window_end = after + Duration::hours(NEXT_EXTREME_WINDOW_HOURS);
    let extremes = find_tidal_extremes(after, window_end, constants)?;
    Ok(extremes.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    /// Harmonic constants in the shape of Portland, ME (NOAA station 8418150),
    /// converted to centimeters.
    fn portland_constants() -> Vec<HarmonicConstant> {
        vec![
            HarmonicConstant::new("M2", 137.5, 105.0),
            HarmonicConstant::new("S2", 20.7, 140.0),
            HarmonicConstant::new("K1", 14.6, 205.0),
            HarmonicConstant::new("O1", 11.3, 184.0),
            HarmonicConstant::new("M4", 4.0, 33.0),
            HarmonicConstant::new("MS4", 2.5, 80.0),
        ]
    }

    fn m2_only() -> Vec<HarmonicConstant> {
        vec![HarmonicConstant::new("M2", 100.0, 0.0)]
    }

    #[test]
    fn empty_constants_are_rejected_everywhere() {
        let t0 = utc(2024, 6, 1, 0, 0);
        let t1 = utc(2024, 6, 2, 0, 0);
        assert!(matches!(
            tide_level(t0, &[]),
            Err(TideError::EmptyConstituents)
        ));
        assert!(matches!(
            find_tidal_extremes(t0, t1, &[]),
            Err(TideError::EmptyConstituents)
        ));
        assert!(matches!(
            tide_strength(t0, &[]),
            Err(TideError::EmptyConstituents)
        ));
        assert!(matches!(
            tide_curve(t0, t1, 24, &[]),
            Err(TideError::EmptyConstituents)
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let t0 = utc(2024, 6, 1, 0, 0);
        assert!(matches!(
            find_tidal_extremes(t0, t0, &m2_only()),
            Err(TideError::InvalidRange)
        ));
        assert!(matches!(
            find_tidal_extremes(t0, t0 - Duration::hours(1), &m2_only()),
            Err(TideError::InvalidRange)
        ));
    }

    #[test]
    fn zero_amplitude_contributes_nothing() {
        let t = utc(2024, 3, 15, 6, 30);
        let zero = vec![HarmonicConstant::new("M2", 0.0, 123.0)];
        assert_eq!(tide_level(t, &zero).unwrap(), 0.0);

        // Appending a zero-amplitude entry must not move the sum.
        let mut padded = m2_only();
        padded.push(HarmonicConstant::new("K1", 0.0, 301.0));
        assert_eq!(
            tide_level(t, &m2_only()).unwrap(),
            tide_level(t, &padded).unwrap()
        );
    }

    #[test]
    fn unknown_name_in_list_is_skipped_not_fatal() {
        let t = utc(2024, 3, 15, 6, 30);
        let mut with_junk = m2_only();
        with_junk.push(HarmonicConstant::new("Z9", 50.0, 0.0));
        let level = tide_level(t, &with_junk).unwrap();
        assert_eq!(level, tide_level(t, &m2_only()).unwrap());
    }

    #[test]
    fn single_constituent_daily_continuity() {
        // M2 aliases ~24.4° per civil day, bounding |Δlevel| over 24 h by
        // 2·A·sin(·) ≈ 42 cm plus slow nodal drift.
        for hour in [0, 5, 11, 17, 23] {
            let t = utc(2024, 4, 10, hour, 0);
            let a = tide_level(t, &m2_only()).unwrap();
            let b = tide_level(t + Duration::hours(24), &m2_only()).unwrap();
            assert!(
                (a - b).abs() < 50.0,
                "24 h drift {} cm too large at {t}",
                (a - b).abs()
            );
        }
    }

    #[test]
    fn extremes_alternate_and_ascend() {
        let start = utc(2024, 6, 1, 0, 0);
        let end = utc(2024, 6, 2, 0, 0);
        let extremes = find_tidal_extremes(start, end, &m2_only()).unwrap();

        // M2 period 12.42 h: a 24 h window holds 3-4 turning points.
        assert!(
            (3..=4).contains(&extremes.len()),
            "expected 3-4 extremes in 24 h, got {}",
            extremes.len()
        );
        for pair in extremes.windows(2) {
            assert!(pair[0].time < pair[1].time, "extremes must ascend in time");
            assert_ne!(pair[0].kind, pair[1].kind, "highs and lows must alternate");
        }
        for e in &extremes {
            // Amplitude 100 with f in [0.963, 1.037].
            assert!(
                e.level.abs() > 90.0 && e.level.abs() < 105.0,
                "extreme level {} implausible for amplitude 100",
                e.level
            );
            match e.kind {
                ExtremeKind::High => assert!(e.level > 0.0),
                ExtremeKind::Low => assert!(e.level < 0.0),
            }
        }
    }

    #[test]
    fn flat_input_yields_no_extremes() {
        let start = utc(2024, 6, 1, 0, 0);
        let end = utc(2024, 6, 2, 0, 0);
        let flat = vec![
            HarmonicConstant::new("M2", 0.0, 10.0),
            HarmonicConstant::new("S2", 0.0, 250.0),
        ];
        let extremes = find_tidal_extremes(start, end, &flat).unwrap();
        assert!(extremes.is_empty(), "flat input must produce zero extrema");
    }

    #[test]
    fn refined_extreme_beats_coarse_neighbours() {
        let start = utc(2024, 6, 1, 0, 0);
        let end = utc(2024, 6, 1, 13, 0);
        let extremes = find_tidal_extremes(start, end, &portland_constants()).unwrap();
        assert!(!extremes.is_empty());
        for e in &extremes {
            // Levels a coarse step to either side must not exceed the
            // refined extremum.
            let before = level_at(e.time - Duration::minutes(30), &portland_constants());
            let after = level_at(e.time + Duration::minutes(30), &portland_constants());
            match e.kind {
                ExtremeKind::High => {
                    assert!(e.level >= before && e.level >= after);
                }
                ExtremeKind::Low => {
                    assert!(e.level <= before && e.level <= after);
                }
            }
        }
    }

    #[test]
    fn analytic_rate_matches_finite_difference() {
        let constants = portland_constants();
        for hour in [2, 8, 14, 20] {
            let t = utc(2024, 6, 1, hour, 0);
            let strength = tide_strength(t, &constants).unwrap();

            let dt = Duration::minutes(1);
            let numeric = (level_at(t + dt, &constants) - level_at(t - dt, &constants))
                / (2.0 / 60.0);
            assert!(
                (strength.rate - numeric).abs() < 0.5,
                "analytic {} vs numeric {} cm/h at {t}",
                strength.rate,
                numeric
            );
        }
    }

    #[test]
    fn direction_follows_rate_sign() {
        let constants = m2_only();
        let start = utc(2024, 6, 1, 0, 0);
        for minutes in (0..24 * 60).step_by(45) {
            let t = start + Duration::minutes(minutes);
            let s = tide_strength(t, &constants).unwrap();
            match s.direction {
                FlowDirection::Rising => assert!(s.rate >= 0.0),
                FlowDirection::Falling => assert!(s.rate < 0.0),
            }
        }
    }

    #[test]
    fn strength_scale_breakpoints() {
        assert_eq!(strength_value(0.0), 0.0);
        assert!((strength_value(2.0) - 1.0).abs() < 1e-12);
        assert!((strength_value(8.0) - 4.0).abs() < 1e-12);
        assert!((strength_value(20.0) - 7.0).abs() < 1e-12);
        assert!((strength_value(40.0) - 9.0).abs() < 1e-12);
        let saturated = strength_value(200.0);
        assert!(saturated > 9.9 && saturated <= 10.0);
    }

    #[test]
    fn strength_near_slack_is_stagnant() {
        // At a high water the stream is near slack.
        let extremes = find_tidal_extremes(
            utc(2024, 6, 1, 0, 0),
            utc(2024, 6, 2, 0, 0),
            &m2_only(),
        )
        .unwrap();
        let high = extremes.iter().find(|e| e.kind == ExtremeKind::High).unwrap();
        let s = tide_strength(high.time, &m2_only()).unwrap();
        assert!(
            s.value < 2.0,
            "stream at high water should be near slack, got value {}",
            s.value
        );
    }

    #[test]
    fn curve_is_evenly_sampled_and_ordered() {
        let start = utc(2024, 6, 1, 0, 0);
        let end = utc(2024, 6, 2, 0, 0);
        let samples = tide_curve(start, end, 24, &portland_constants()).unwrap();

        // 24 h at 24-minute steps: 61 samples including both endpoints.
        assert_eq!(samples.len(), 61);
        assert_eq!(samples[0].time, start);
        assert_eq!(samples[60].time, end);
        for pair in samples.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, Duration::minutes(24));
        }
    }

    #[test]
    fn curve_rejects_zero_step() {
        let start = utc(2024, 6, 1, 0, 0);
        let end = utc(2024, 6, 2, 0, 0);
        assert!(matches!(
            tide_curve(start, end, 0, &m2_only()),
            Err(TideError::InvalidInput(_))
        ));
    }

    #[test]
    fn next_extreme_finds_upcoming_event() {
        let after = utc(2024, 6, 1, 0, 0);
        let next = next_extreme(after, &m2_only()).unwrap().unwrap();
        assert!(next.time > after);
        assert!(next.time < after + Duration::hours(8), "first M2 turning point is within 8 h");
    }

    #[test]
    fn next_extreme_is_none_for_flat_input() {
        let flat = vec![HarmonicConstant::new("M2", 0.0, 0.0)];
        let next = next_extreme(utc(2024, 6, 1, 0, 0), &flat).unwrap();
        assert!(next.is_none());
    }

    #[test]
    fn extremes_serialize_for_caching() {
        let extremes = find_tidal_extremes(
            utc(2024, 6, 1, 0, 0),
            utc(2024, 6, 2, 0, 0),
            &portland_constants(),
        )
        .unwrap();

        let payload = serde_json::to_vec(&extremes).unwrap();
        let loaded: Vec<TidalExtreme> = serde_json::from_slice(&payload).unwrap();
        assert_eq!(loaded, extremes);
    }

    mod performance_tests {
        use super::*;
        use std::time::Instant;

        /// Repeated synthesis with a realistic constant set must stay well
        /// inside the per-call latency budget.
        #[test]
        fn repeated_level_synthesis_is_fast() {
            let constants = portland_constants();
            let t = utc(2024, 6, 1, 0, 0);

            let clock = Instant::now();
            for i in 0..100 {
                let _ = tide_level(t + Duration::minutes(i), &constants).unwrap();
            }
            let elapsed = clock.elapsed();
            assert!(
                elapsed.as_millis() < 1_000,
                "100 level calls took too long: {elapsed:?}"
            );
        }

        #[test]
        fn full_day_extreme_search_is_fast() {
            let clock = Instant::now();
            let _ = find_tidal_extremes(
                utc(2024, 6, 1, 0, 0),
                utc(2024, 6, 2, 0, 0),
                &portland_constants(),
            )
            .unwrap();
            let elapsed = clock.elapsed();
            assert!(
                elapsed.as_millis() < 100,
                "24 h extreme search took too long: {elapsed:?}"
            );
        }
    }
}
