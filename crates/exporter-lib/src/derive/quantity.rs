//! Kubernetes resource quantity parsing
//!
//! Handles the decimal SI (`m`, `k`, `M`, ...), binary SI (`Ki`, `Mi`, ...)
//! and exponent (`1e3`) forms used in node capacity.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quantity '{0}'")]
pub struct QuantityError(pub String);

/// Parse a quantity string into its numeric value
pub fn parse_quantity(raw: &str) -> Result<f64, QuantityError> {
    let invalid = || QuantityError(raw.to_string());
    let s = raw.trim();

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    if number.is_empty() {
        return Err(invalid());
    }
    let value: f64 = number.parse().map_err(|_| invalid())?;

    let multiplier = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        exp if exp.starts_with(['e', 'E']) => {
            let power: i32 = exp[1..].parse().map_err(|_| invalid())?;
            10f64.powi(power)
        }
        _ => return Err(invalid()),
    };

    Ok(value * multiplier)
}

/// Integer value of a quantity, rounded up (`"3500m"` is 4)
pub fn quantity_value(raw: &str) -> Result<u64, QuantityError> {
    let value = parse_quantity(raw)?;
    if !value.is_finite() || value < 0.0 {
        return Err(QuantityError(raw.to_string()));
    }
    Ok(value.ceil() as u64)
}
