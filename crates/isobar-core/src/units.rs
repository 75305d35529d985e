//! Physical units and the convertibility checks derived coordinates rely on.
//!
//! A [`Unit`] is a base-dimension exponent vector plus a scale factor
//! relative to SI. Only a small catalog of symbols is understood: enough
//! to express pressures, lengths, masses, times and temperatures, each
//! optionally carrying a single SI prefix (`hPa`, `km`, `mbar`, ...).
//!
//! Two special units mirror CF metadata practice: `unknown` (the unit is
//! not known) and `no_unit` (the quantity has no meaningful unit). Neither
//! is convertible to anything, including itself.

use crate::error::UnitError;
use std::fmt;
use std::str::FromStr;
use uom::si::f64::{Mass, Pressure};
use uom::si::mass::{gram, kilogram};
use uom::si::pressure::{atmosphere, bar, pascal};

/// Exponents of the base dimensions: mass, length, time, temperature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Dimension([i8; 4]);

impl Dimension {
    const NONE: Self = Self([0, 0, 0, 0]);
    const MASS: Self = Self([1, 0, 0, 0]);
    const LENGTH: Self = Self([0, 1, 0, 0]);
    const TIME: Self = Self([0, 0, 1, 0]);
    const TEMPERATURE: Self = Self([0, 0, 0, 1]);
    /// kg m-1 s-2
    const PRESSURE: Self = Self([1, -1, -2, 0]);
}

#[derive(Clone, Copy, Debug)]
enum UnitKind {
    Known { dimension: Dimension, scale: f64 },
    Unknown,
    NoUnit,
}

/// Catalog entry: accepted spellings, dimension, SI scale, and whether
/// SI prefixes may be attached.
///
/// Scales of the pressure and mass symbols are read from `uom`'s SI
/// definitions so they agree with typed quantities elsewhere.
struct BaseUnit {
    symbol: &'static str,
    long_names: &'static [&'static str],
    dimension: Dimension,
    scale: fn() -> f64,
    prefixable: bool,
}

const BASE_UNITS: &[BaseUnit] = &[
    BaseUnit {
        symbol: "Pa",
        long_names: &["pascal", "pascals"],
        dimension: Dimension::PRESSURE,
        scale: pascal_scale,
        prefixable: true,
    },
    BaseUnit {
        symbol: "bar",
        long_names: &["bars"],
        dimension: Dimension::PRESSURE,
        scale: bar_scale,
        prefixable: true,
    },
    BaseUnit {
        symbol: "atm",
        long_names: &["atmosphere"],
        dimension: Dimension::PRESSURE,
        scale: atmosphere_scale,
        prefixable: false,
    },
    BaseUnit {
        symbol: "m",
        long_names: &["meter", "metre", "meters", "metres"],
        dimension: Dimension::LENGTH,
        scale: unity,
        prefixable: true,
    },
    BaseUnit {
        symbol: "g",
        long_names: &["gram", "grams"],
        dimension: Dimension::MASS,
        scale: gram_scale,
        prefixable: true,
    },
    BaseUnit {
        symbol: "s",
        long_names: &["second", "seconds"],
        dimension: Dimension::TIME,
        scale: unity,
        prefixable: true,
    },
    BaseUnit {
        symbol: "K",
        long_names: &["kelvin"],
        dimension: Dimension::TEMPERATURE,
        scale: unity,
        prefixable: true,
    },
];

fn unity() -> f64 {
    1.0
}

fn pascal_scale() -> f64 {
    Pressure::new::<pascal>(1.0).get::<pascal>()
}

fn bar_scale() -> f64 {
    Pressure::new::<bar>(1.0).get::<pascal>()
}

fn atmosphere_scale() -> f64 {
    Pressure::new::<atmosphere>(1.0).get::<pascal>()
}

fn gram_scale() -> f64 {
    Mass::new::<gram>(1.0).get::<kilogram>()
}

/// SI prefixes, longest first so `da` wins over `d`.
const PREFIXES: &[(&str, f64)] = &[
    ("da", 1.0e1),
    ("h", 1.0e2),
    ("k", 1.0e3),
    ("M", 1.0e6),
    ("d", 1.0e-1),
    ("c", 1.0e-2),
    ("m", 1.0e-3),
    ("u", 1.0e-6),
];

/// Long-form prefixed names that appear in CF metadata.
const PREFIXED_LONG_NAMES: &[(&str, &str)] = &[
    ("hectopascal", "hPa"),
    ("hectopascals", "hPa"),
    ("kilopascal", "kPa"),
    ("millibar", "mbar"),
    ("millibars", "mbar"),
    ("kilometer", "km"),
    ("kilometre", "km"),
    ("kilogram", "kg"),
];

/// A physical unit.
///
/// Equality compares the physical meaning, not the spelling:
/// `hPa == mbar`, but `hPa != Pa` even though they are convertible.
///
/// # Examples
///
/// ```
/// use isobar_core::Unit;
///
/// let hpa: Unit = "hPa".parse().unwrap();
/// let pa = Unit::pascal();
/// assert!(hpa.is_convertible(&pa));
/// assert_ne!(hpa, pa);
/// assert_eq!(hpa, "mbar".parse::<Unit>().unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct Unit {
    spelling: String,
    kind: UnitKind,
}

impl Unit {
    /// The SI pressure unit, `Pa`.
    pub fn pascal() -> Self {
        Self::known("Pa", Dimension::PRESSURE, 1.0)
    }

    /// The dimensionless unit, `1`.
    pub fn dimensionless() -> Self {
        Self::known("1", Dimension::NONE, 1.0)
    }

    /// The `unknown` unit.
    pub fn unknown() -> Self {
        Self {
            spelling: "unknown".to_string(),
            kind: UnitKind::Unknown,
        }
    }

    /// The `no_unit` unit.
    pub fn no_unit() -> Self {
        Self {
            spelling: "no_unit".to_string(),
            kind: UnitKind::NoUnit,
        }
    }

    fn known(spelling: &str, dimension: Dimension, scale: f64) -> Self {
        Self {
            spelling: spelling.to_string(),
            kind: UnitKind::Known { dimension, scale },
        }
    }

    /// Parse a unit spelling.
    ///
    /// Returns `Err(UnitError::Unrecognised)` for anything outside the
    /// catalog described in the [module documentation](self).
    pub fn parse(spelling: &str) -> Result<Self, UnitError> {
        let trimmed = spelling.trim();
        match trimmed {
            "" | "1" => return Ok(Self::known(trimmed, Dimension::NONE, 1.0)),
            "%" => return Ok(Self::known(trimmed, Dimension::NONE, 1.0e-2)),
            "unknown" => return Ok(Self::unknown()),
            "no_unit" => return Ok(Self::no_unit()),
            _ => {}
        }

        let lookup = PREFIXED_LONG_NAMES
            .iter()
            .find(|(long, _)| *long == trimmed)
            .map_or(trimmed, |(_, short)| *short);

        if let Some(base) = find_base(lookup) {
            return Ok(Self::known(trimmed, base.dimension, (base.scale)()));
        }

        for (prefix, factor) in PREFIXES {
            let Some(rest) = lookup.strip_prefix(prefix) else {
                continue;
            };
            if let Some(base) = BASE_UNITS
                .iter()
                .find(|b| b.prefixable && b.symbol == rest)
            {
                return Ok(Self::known(trimmed, base.dimension, (base.scale)() * factor));
            }
        }

        Err(UnitError::Unrecognised {
            spelling: spelling.to_string(),
        })
    }

    /// The spelling this unit was created from.
    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    /// Whether values in `self` can be converted to `other`.
    ///
    /// Requires identical base dimensions. `unknown` and `no_unit` are
    /// never convertible.
    pub fn is_convertible(&self, other: &Unit) -> bool {
        match (self.kind, other.kind) {
            (
                UnitKind::Known { dimension: a, .. },
                UnitKind::Known { dimension: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Whether this unit is convertible to [`Unit::pascal`].
    pub fn is_pressure(&self) -> bool {
        self.is_convertible(&Self::pascal())
    }

    /// Whether this unit is convertible to [`Unit::dimensionless`].
    pub fn is_dimensionless(&self) -> bool {
        self.is_convertible(&Self::dimensionless())
    }

    /// Returns `true` for the `unknown` unit.
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, UnitKind::Unknown)
    }
}

fn find_base(spelling: &str) -> Option<&'static BaseUnit> {
    BASE_UNITS
        .iter()
        .find(|b| b.symbol == spelling || b.long_names.contains(&spelling))
}

/// Relative tolerance for scale comparison; prefix products such as
/// `1e-3 * 1e5` are not exact in binary floating point.
fn scales_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1.0e-12 * a.abs().max(b.abs())
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (
                UnitKind::Known {
                    dimension: da,
                    scale: sa,
                },
                UnitKind::Known {
                    dimension: db,
                    scale: sb,
                },
            ) => da == db && scales_match(sa, sb),
            (UnitKind::Unknown, UnitKind::Unknown) => true,
            (UnitKind::NoUnit, UnitKind::NoUnit) => true,
            _ => false,
        }
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}
