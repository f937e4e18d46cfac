use crate::error::{ResourceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed Kubernetes quantity, held in base units (cores, bytes, devices)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct ResourceQuantity(f64);

impl ResourceQuantity {
    /// Wrap a value already expressed in base units
    pub fn from_value(value: f64) -> Self {
        Self(value)
    }

    /// Parse a quantity string (e.g., "500m", "2", "1.5", "128Mi", "1e3")
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_for("quantity", s)
    }

    /// Parse a quantity string, naming the resource in any error
    pub fn parse_for(resource: &str, s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ResourceError::invalid_quantity(resource, s, "empty quantity"));
        }

        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let base: f64 = number.parse().map_err(|e: std::num::ParseFloatError| {
            ResourceError::invalid_quantity(resource, s, e.to_string())
        })?;

        let multiplier = suffix_multiplier(suffix).ok_or_else(|| {
            ResourceError::invalid_quantity(resource, s, format!("unknown suffix '{}'", suffix))
        })?;

        Ok(Self(base * multiplier))
    }

    /// Raw value in base units
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Whole units, rounded up (matches `Quantity.Value()` in Kubernetes)
    pub fn value(&self) -> f64 {
        ceil_tolerant(self.0)
    }

    /// Milli units, rounded up (matches `Quantity.MilliValue()` in Kubernetes)
    pub fn milli_value(&self) -> f64 {
        ceil_tolerant(self.0 * 1000.0)
    }
}

impl FromStr for ResourceQuantity {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<f64> for ResourceQuantity {
    fn from(value: f64) -> Self {
        Self::from_value(value)
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    const KI: f64 = 1024.0;

    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => KI,
        "Mi" => KI * KI,
        "Gi" => KI * KI * KI,
        "Ti" => KI * KI * KI * KI,
        "Pi" => KI * KI * KI * KI * KI,
        "Ei" => KI * KI * KI * KI * KI * KI,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => {
            // Decimal exponent: "1e3", "5E-1"
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let exponent: i32 = exponent.parse().ok()?;
            10f64.powi(exponent)
        }
    };

    Some(multiplier)
}

/// Round up, ignoring float noise left over from suffix scaling.
///
/// Scaling costs at most a few ULPs, so only offsets within that band of an
/// integer snap to it; any real fraction rounds up.
fn ceil_tolerant(v: f64) -> f64 {
    let nearest = v.round();
    if (v - nearest).abs() <= 4.0 * f64::EPSILON * v.abs() {
        nearest
    } else {
        v.ceil()
    }
}
