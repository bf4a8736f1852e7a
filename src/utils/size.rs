use crate::error::{AppError, Result};

const SUFFIXES: &str = "kmgtpezy";

/// Parses a byte count with an optional unit suffix.
///
/// Lowercase suffixes `k m g t p e z y` multiply by powers of 1000, their
/// uppercase forms by powers of 1024. The number may carry a fractional part
/// (`1.5G`); the result is truncated to whole bytes and saturates at
/// `u64::MAX`.
pub fn parse_size(arg: &str) -> Result<u64> {
    let invalid = || AppError::InvalidInput {
        message: format!(
            "Invalid size '{}': expected a number optionally followed by one of k, m, g, t, p, e, z, y (powers of 1000) or K, M, G, T, P, E, Z, Y (powers of 1024)",
            arg
        ),
    };

    let split = arg
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(arg.len());
    let (number, suffix) = arg.split_at(split);

    if number.is_empty() || !number.bytes().any(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let exponent = match suffix.chars().collect::<Vec<_>>().as_slice() {
        [] => None,
        [c] => {
            let pos = SUFFIXES.find(c.to_ascii_lowercase()).ok_or_else(invalid)?;
            let base: u64 = if c.is_ascii_uppercase() { 1024 } else { 1000 };
            Some((base, pos as u32 + 1))
        }
        _ => return Err(invalid()),
    };

    if number.contains('.') {
        let value: f64 = number.parse().map_err(|_| invalid())?;
        let factor = match exponent {
            Some((base, exp)) => (base as f64).powi(exp as i32),
            None => 1.0,
        };
        // `as` saturates for out-of-range floats.
        return Ok((value * factor) as u64);
    }

    let value: u64 = match number.parse() {
        Ok(value) => value,
        Err(_) => return Ok(u64::MAX),
    };

    let factor = match exponent {
        Some((base, exp)) => base.checked_pow(exp),
        None => Some(1),
    };

    Ok(factor
        .and_then(|f| value.checked_mul(f))
        .unwrap_or(u64::MAX))
}
