//! # Tide Engine Core Library
//!
//! A pure, stateless tidal prediction core: per-location harmonic constants
//! plus a point in time go in; a physically grounded tide curve, high/low
//! events, instantaneous rate of change, and a tide-type classification come
//! out. Nothing here fetches data, persists anything, or renders anything —
//! the caller supplies the inputs and owns the value objects returned.
//!
//! ## Design Philosophy
//!
//! ### Pure computation
//! Every entry point is a synchronous, CPU-bound function with no I/O and no
//! shared mutable state, so independent calls may run concurrently from any
//! number of threads without coordination. Caching belongs to callers: all
//! returned types serialize with `serde`, ready for memoization keyed on
//! `(location, instant, precision)` by whatever cache layer sits outside.
//!
//! ### Closed-form over iterative
//! Positions of the Sun and Moon come from truncated trigonometric series,
//! not iterative root-finding, which keeps a single calculation comfortably
//! under 50 ms and a year of daily calls under 5 s on commodity hardware.
//!
//! ### Skip, don't abort
//! An unknown constituent name handed to a top-level lookup is an error; the
//! same name embedded in an otherwise valid constant list is logged and
//! skipped so one bad entry cannot void a whole station's prediction.
//!
//! ## Module Map
//!
//! - [`astro`] — lunar age/phase/illumination and solar/lunar ecliptic
//!   positions (truncated Meeus series)
//! - [`constituents`] — the closed table of eight tidal constituents
//! - [`nodal`] — 18.6-year nodal corrections `(f, u)` per constituent
//! - [`harmonics`] — level synthesis, extremum search, stream strength
//! - [`classify`] — five-way tide-type classification and intensity score
//! - [`settings`] — search-resolution configuration with TOML loading
//!
//! ## Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use tide_engine::{classify, harmonics, HarmonicConstant};
//!
//! let constants = vec![
//!     HarmonicConstant::new("M2", 137.5, 105.0),
//!     HarmonicConstant::new("S2", 20.7, 140.0),
//!     HarmonicConstant::new("K1", 14.6, 205.0),
//!     HarmonicConstant::new("O1", 11.3, 184.0),
//! ];
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! let level = harmonics::tide_level(now, &constants).unwrap();
//! assert!(level.abs() < 200.0);
//!
//! let moon = classify::moon_phase_for_date(now);
//! let tide_type = classify::classify_tide_type(&moon).unwrap();
//! println!("level {level:.1} cm, {tide_type:?} tide");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod astro;
pub mod classify;
pub mod constituents;
pub mod error;
pub mod harmonics;
pub mod nodal;
pub mod settings;

pub use crate::error::{TideError, TideResult};

/// A caller-supplied harmonic constant for one constituent at one location.
///
/// The constituent is carried by name because these records arrive from
/// regional-data sources as plain text; synthesis resolves the name against
/// the closed [`constituents::Constituent`] table and skips entries it does
/// not recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicConstant {
    /// Darwin name of the constituent, e.g. `"M2"`.
    pub constituent: String,
    /// Amplitude in centimeters.
    pub amplitude: f64,
    /// Phase lag in degrees.
    pub phase: f64,
}

impl HarmonicConstant {
    pub fn new(constituent: impl Into<String>, amplitude: f64, phase: f64) -> Self {
        HarmonicConstant {
            constituent: constituent.into(),
            amplitude,
            phase,
        }
    }
}

/// Parse an RFC 3339 timestamp into a UTC instant.
///
/// The engine's own API takes typed [`DateTime<Utc>`] values, so invalid
/// dates cannot reach the math; callers holding strings funnel them through
/// here to get the invalid-input failure semantics in one place.
pub fn parse_instant(s: &str) -> TideResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TideError::InvalidInput(format!("unparseable instant '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_instant_accepts_rfc3339() {
        let t = parse_instant("2024-01-11T11:57:00Z").unwrap();
        assert_eq!(t.timestamp(), 1_704_974_220);

        let offset = parse_instant("2024-01-11T12:57:00+01:00").unwrap();
        assert_eq!(offset, t);
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        for bad in ["", "not-a-date", "2024-13-40T99:99:99Z", "NaN"] {
            assert!(
                matches!(parse_instant(bad), Err(TideError::InvalidInput(_))),
                "'{bad}' should fail to parse"
            );
        }
    }

    #[test]
    fn harmonic_constant_serializes_for_caching() {
        let constant = HarmonicConstant::new("M2", 137.5, 105.0);
        let json = serde_json::to_string(&constant).unwrap();
        let loaded: HarmonicConstant = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, constant);
        assert!(json.contains("\"M2\""));
    }
}
