//! Unit normalization for subgraph amounts.
//!
//! The subgraph reports token amounts as decimal strings (`BigDecimal`) and
//! counters as integer strings (`BigInt`). Downstream consumers work with
//! fixed-point integers at the token's own precision, so every amount goes
//! through [`to_fixed`] before it lands in an output record.

use alloy_primitives::U256;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while converting subgraph strings into integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("not a decimal number: {0:?}")]
    Decimal(String),

    #[error("not an integer: {0:?}")]
    Integer(String),

    #[error("{value:?} does not fit at {decimals} decimals")]
    Overflow { value: String, decimals: u32 },

    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// Attach the record field the failing value came from.
    pub fn in_field(self, field: &'static str) -> Self {
        ConvertError::Field {
            field,
            source: Box::new(self),
        }
    }
}

/// Decimal precision for each amount role of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolDecimals {
    /// Precision of `amount0`
    pub token0: u32,
    /// Precision of `amount1`
    pub token1: u32,
    /// Precision of the USD-equivalent amount
    pub usd: u32,
}

impl PoolDecimals {
    pub const fn new(token0: u32, token1: u32, usd: u32) -> Self {
        Self { token0, token1, usd }
    }
}

impl Default for PoolDecimals {
    /// 18-decimal token0 against a 6-decimal stablecoin token1.
    fn default() -> Self {
        Self::new(18, 6, 6)
    }
}

/// Convert a decimal string into a fixed-point integer at `decimals` precision.
///
/// The value goes through `f64`, so the result is `round(f64(amount) * 10^decimals)`.
/// Digits beyond `f64` precision are lost.
pub fn to_fixed(amount: &str, decimals: u32) -> Result<i128, ConvertError> {
    let value: f64 = amount
        .trim()
        .parse()
        .map_err(|_| ConvertError::Decimal(amount.to_string()))?;

    if !value.is_finite() {
        return Err(ConvertError::Decimal(amount.to_string()));
    }

    let overflow = || ConvertError::Overflow {
        value: amount.to_string(),
        decimals,
    };

    let exponent = i32::try_from(decimals).map_err(|_| overflow())?;
    let scaled = (value * 10f64.powi(exponent)).round();

    // i128::MAX as f64 rounds up to 2^127; the bounds stay symmetric so results negate safely
    if !scaled.is_finite() || scaled <= i128::MIN as f64 || scaled >= i128::MAX as f64 {
        return Err(overflow());
    }

    Ok(scaled as i128)
}

/// Parse an integer string (`BigInt`, `Int`) into `T`.
pub fn parse_int<T: FromStr>(value: &str) -> Result<T, ConvertError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConvertError::Integer(value.to_string()))
}

/// Parse a non-negative base-10 integer of up to 256 bits.
pub fn parse_u256(value: &str) -> Result<U256, ConvertError> {
    U256::from_str_radix(value.trim(), 10).map_err(|_| ConvertError::Integer(value.to_string()))
}

/// Serde adapter writing a [`U256`] as a bare JSON integer.
///
/// `sqrtPriceX96` does not fit any primitive integer, and consumers of the
/// output files expect a number rather than a hex string.
pub mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(value.to_string()).map_err(ser::Error::custom)?;
        raw.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw: Box<RawValue> = Deserialize::deserialize(deserializer)?;
        let text = raw.get().trim().trim_matches('"');
        U256::from_str_radix(text, 10).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed_whole_and_fractional() {
        assert_eq!(to_fixed("1.5", 18).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(to_fixed("-3000.0", 6).unwrap(), -3_000_000_000);
        assert_eq!(to_fixed("3000", 6).unwrap(), 3_000_000_000);
        assert_eq!(to_fixed("0", 18).unwrap(), 0);
    }

    #[test]
    fn test_to_fixed_rounds_half_away_from_zero() {
        assert_eq!(to_fixed("2.5", 0).unwrap(), 3);
        assert_eq!(to_fixed("-2.5", 0).unwrap(), -3);
        assert_eq!(to_fixed("12.345678", 6).unwrap(), 12_345_678);
    }

    #[test]
    fn test_to_fixed_accepts_exponent_notation() {
        assert_eq!(to_fixed("1e-6", 6).unwrap(), 1);
        assert_eq!(to_fixed("2E3", 0).unwrap(), 2000);
    }

    #[test]
    fn test_to_fixed_is_deterministic() {
        let a = to_fixed("1234.56789012345", 18).unwrap();
        let b = to_fixed("1234.56789012345", 18).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_fixed_rejects_garbage() {
        assert_eq!(
            to_fixed("abc", 18),
            Err(ConvertError::Decimal("abc".to_string()))
        );
        assert!(to_fixed("", 6).is_err());
        assert!(to_fixed("inf", 6).is_err());
        assert!(to_fixed("NaN", 6).is_err());
    }

    #[test]
    fn test_to_fixed_overflow() {
        let err = to_fixed("1e30", 18).unwrap_err();
        assert!(matches!(err, ConvertError::Overflow { decimals: 18, .. }));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u64>("17000000").unwrap(), 17_000_000);
        assert_eq!(parse_int::<i32>("-201234").unwrap(), -201_234);
        assert!(parse_int::<u64>("12.5").is_err());
        assert!(parse_int::<u64>("-1").is_err());
    }

    #[test]
    fn test_parse_u256_beyond_u128() {
        let v = parse_u256("1461446703485210103287273052203988822378723970342").unwrap();
        assert!(v > U256::from(u128::MAX));
        assert!(parse_u256("0x10").is_err());
    }

    #[test]
    fn test_field_context_in_message() {
        let err = to_fixed("x", 6).unwrap_err().in_field("amount1");
        assert_eq!(err.to_string(), "field `amount1`: not a decimal number: \"x\"");
    }
}
