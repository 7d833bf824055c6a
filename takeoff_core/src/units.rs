//! # Unit Types
//!
//! Lightweight newtype wrappers for the handful of units a takeoff uses, plus
//! the lenient parsers that turn typed field text into numbers.
//!
//! ## US Customary Units
//!
//! - Length: feet (ft), inches (in)
//! - Weight: pounds (lb)
//! - Area: square feet (sf)
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::units::{Feet, FeetInches, Inches};
//!
//! let length = FeetInches::new(20.0, 6.0);
//! assert_eq!(length.total_feet(), Feet(20.5));
//!
//! let inches: Inches = Feet(2.0).into();
//! assert_eq!(inches.0, 24.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Weight of a 1 ft² steel plate 1 inch thick, lb. The customary rounding
/// of 490 lb/ft³ carbon steel over 12 in/ft.
pub const PLATE_LB_PER_SF_PER_IN: f64 = 40.8;

// ============================================================================
// Length Units
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Feet> for Inches {
    fn from(ft: Feet) -> Self {
        Inches(ft.0 * 12.0)
    }
}

impl From<Inches> for Feet {
    fn from(inches: Inches) -> Self {
        Feet(inches.0 / 12.0)
    }
}

/// A member length entered as feet plus inches (e.g. 20'-6").
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeetInches {
    pub feet: f64,
    pub inches: f64,
}

impl FeetInches {
    pub fn new(feet: f64, inches: f64) -> Self {
        FeetInches { feet, inches }
    }

    /// `feet + inches / 12`
    pub fn total_feet(&self) -> Feet {
        Feet(self.feet) + Feet::from(Inches(self.inches))
    }
}

impl std::fmt::Display for FeetInches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'-{}\"", self.feet, self.inches)
    }
}

// ============================================================================
// Weight and Area Units
// ============================================================================

/// Weight in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pounds(pub f64);

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqFt(pub f64);

/// Area in square inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqIn(pub f64);

impl From<SqIn> for SqFt {
    fn from(sqin: SqIn) -> Self {
        SqFt(sqin.0 / 144.0)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(Inches);
impl_arithmetic!(Pounds);
impl_arithmetic!(SqFt);
impl_arithmetic!(SqIn);

// ============================================================================
// Lenient Parsing
// ============================================================================

/// Parse a typed number, coercing anything malformed to `0.0`.
///
/// Accepts surrounding whitespace, thousands separators and a leading `$`.
/// Non-finite results (`inf`, `NaN`) also become `0.0`.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Replace a non-finite value with `0.0`.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parse an inch dimension written as a decimal, fraction or mixed number.
///
/// Recognised forms: `0.5`, `1/2`, `3/8"`, `1-1/4`, `1 1/4`, `PL3/4`, `3/4 in`.
/// Returns `None` when the text is not a dimension at all.
pub fn parse_inches(raw: &str) -> Option<f64> {
    let mut text = raw.trim().to_uppercase();
    if let Some(rest) = text.strip_prefix("PL") {
        text = rest.trim().to_string();
    }
    let text = text
        .trim_end_matches('"')
        .trim_end_matches("IN")
        .trim_end_matches('.')
        .trim();
    if text.is_empty() {
        return None;
    }

    // Mixed number: whole part separated from the fraction by '-' or ' '
    if let Some((whole, frac)) = text.split_once(['-', ' ']) {
        let whole: f64 = whole.trim().parse().ok()?;
        let frac = parse_fraction(frac.trim())?;
        return Some(whole + frac);
    }

    if text.contains('/') {
        return parse_fraction(text);
    }

    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_fraction(text: &str) -> Option<f64> {
    let (num, den) = text.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_factor_matches_steel_density() {
        assert!((PLATE_LB_PER_SF_PER_IN * 12.0 - 490.0).abs() < 1.0);
    }

    #[test]
    fn test_feet_to_inches() {
        let ft = Feet(10.0);
        let inches: Inches = ft.into();
        assert_eq!(inches.0, 120.0);
    }

    #[test]
    fn test_feet_inches_total() {
        let length = FeetInches::new(12.0, 9.0);
        assert!((length.total_feet().value() - 12.75).abs() < 1e-12);
        assert_eq!(length.to_string(), "12'-9\"");
    }

    #[test]
    fn test_arithmetic() {
        let a = Pounds(10.0);
        let b = Pounds(5.0);
        assert_eq!((a + b).0, 15.0);
        assert_eq!((a - b).0, 5.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_parse_number_coerces_garbage() {
        assert_eq!(parse_number("12.5"), 12.5);
        assert_eq!(parse_number("  7 "), 7.0);
        assert_eq!(parse_number("$1,250.00"), 1250.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_parse_inches_forms() {
        assert_eq!(parse_inches("0.5"), Some(0.5));
        assert_eq!(parse_inches("1/2"), Some(0.5));
        assert_eq!(parse_inches("3/8\""), Some(0.375));
        assert_eq!(parse_inches("1-1/4"), Some(1.25));
        assert_eq!(parse_inches("1 1/4"), Some(1.25));
        assert_eq!(parse_inches("PL3/4"), Some(0.75));
        assert_eq!(parse_inches("3/4 in"), Some(0.75));
        assert_eq!(parse_inches("1/0"), None);
        assert_eq!(parse_inches("thick"), None);
        assert_eq!(parse_inches(""), None);
    }

    #[test]
    fn test_serialization() {
        let ft = Feet(12.5);
        let json = serde_json::to_string(&ft).unwrap();
        assert_eq!(json, "12.5");

        let roundtrip: Feet = serde_json::from_str(&json).unwrap();
        assert_eq!(ft, roundtrip);
    }
}
