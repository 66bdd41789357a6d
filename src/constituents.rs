//! Tidal constituent table.
//!
//! The engine recognizes a closed set of eight constituents. Keeping them as
//! an enum (rather than free-form name strings) guarantees at compile time
//! that every constituent has a frequency, period, and nodal-correction
//! formula defined, and makes an unknown name a genuinely exceptional path.
//!
//! Frequencies are the standard Doodson/Schureman values in degrees per mean
//! solar hour; periods are derived as `360 / frequency`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TideError, TideResult};

/// A single periodic component of the tide-generating force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constituent {
    /// Principal lunar semidiurnal.
    M2,
    /// Principal solar semidiurnal.
    S2,
    /// Lunisolar declinational diurnal.
    K1,
    /// Principal lunar declinational diurnal.
    O1,
    /// Lunar fortnightly.
    Mf,
    /// Lunar monthly.
    Mm,
    /// First overtide of M2.
    M4,
    /// Compound tide of M2 and S2.
    MS4,
}

/// Broad frequency class of a constituent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Semidiurnal,
    Diurnal,
    LongPeriod,
    QuarterDiurnal,
}

impl Constituent {
    /// Every known constituent, in conventional amplitude order.
    pub const ALL: [Constituent; 8] = [
        Constituent::M2,
        Constituent::S2,
        Constituent::K1,
        Constituent::O1,
        Constituent::Mf,
        Constituent::Mm,
        Constituent::M4,
        Constituent::MS4,
    ];

    /// Angular speed in degrees per mean solar hour.
    pub fn frequency(self) -> f64 {
        match self {
            Constituent::M2 => 28.984_104_2,
            Constituent::S2 => 30.0,
            Constituent::K1 => 15.041_068_6,
            Constituent::O1 => 13.943_035_6,
            Constituent::Mf => 1.098_033_1,
            Constituent::Mm => 0.544_374_7,
            Constituent::M4 => 57.968_208_4,
            Constituent::MS4 => 58.984_104_2,
        }
    }

    /// Period in hours, derived from the angular speed.
    pub fn period(self) -> f64 {
        360.0 / self.frequency()
    }

    pub fn species(self) -> Species {
        match self {
            Constituent::M2 | Constituent::S2 => Species::Semidiurnal,
            Constituent::K1 | Constituent::O1 => Species::Diurnal,
            Constituent::Mf | Constituent::Mm => Species::LongPeriod,
            Constituent::M4 | Constituent::MS4 => Species::QuarterDiurnal,
        }
    }

    /// Conventional Darwin name.
    pub fn name(self) -> &'static str {
        match self {
            Constituent::M2 => "M2",
            Constituent::S2 => "S2",
            Constituent::K1 => "K1",
            Constituent::O1 => "O1",
            Constituent::Mf => "Mf",
            Constituent::Mm => "Mm",
            Constituent::M4 => "M4",
            Constituent::MS4 => "MS4",
        }
    }
}

impl fmt::Display for Constituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Constituent {
    type Err = TideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M2" => Ok(Constituent::M2),
            "S2" => Ok(Constituent::S2),
            "K1" => Ok(Constituent::K1),
            "O1" => Ok(Constituent::O1),
            "Mf" => Ok(Constituent::Mf),
            "Mm" => Ok(Constituent::Mm),
            "M4" => Ok(Constituent::M4),
            "MS4" => Ok(Constituent::MS4),
            other => Err(TideError::UnknownConstituent(other.to_string())),
        }
    }
}

/// Angular speed lookup by name, for callers still holding a string.
pub fn constituent_frequency(name: &str) -> TideResult<f64> {
    Ok(name.parse::<Constituent>()?.frequency())
}

/// Period lookup by name, for callers still holding a string.
pub fn constituent_period(name: &str) -> TideResult<f64> {
    Ok(name.parse::<Constituent>()?.period())
}
