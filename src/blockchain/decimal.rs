//! Fixed-point decimals with 18 fractional digits (Cosmos `LegacyDec`).

use alloy::primitives::U256;
use std::fmt;
use std::str::FromStr;

/// Fractional digits carried by `LegacyDec`.
pub const DEC_PRECISION: usize = 18;

fn scale() -> U256 {
    U256::from(10u64).pow(U256::from(DEC_PRECISION))
}

/// Parse errors for decimal and integer amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid decimal '{0}'")]
    Invalid(String),
    #[error("'{0}' has more than 18 fractional digits")]
    TooPrecise(String),
    #[error("decimal overflow")]
    Overflow,
    #[error("division by zero")]
    DivisionByZero,
}

/// Non-negative fixed-point number, stored scaled by 10^18.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dec(U256);

impl Dec {
    pub const ZERO: Dec = Dec(U256::ZERO);

    pub fn from_integer(value: u64) -> Self {
        Dec(U256::from(value) * scale())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Wire form: the scaled integer, e.g. `1.5` -> `1500000000000000000`.
    pub fn to_chain_string(&self) -> String {
        self.0.to_string()
    }

    /// Convert a whole-unit amount to base units of a token with `decimals`.
    ///
    /// Fails when the amount has more fractional digits than the token.
    pub fn to_base_units(&self, decimals: u32) -> Result<String, DecimalError> {
        let decimals = decimals as usize;
        if decimals >= DEC_PRECISION {
            let factor = U256::from(10u64).pow(U256::from(decimals - DEC_PRECISION));
            let units = self.0.checked_mul(factor).ok_or(DecimalError::Overflow)?;
            return Ok(units.to_string());
        }
        let divisor = U256::from(10u64).pow(U256::from(DEC_PRECISION - decimals));
        if !(self.0 % divisor).is_zero() {
            return Err(DecimalError::TooPrecise(self.to_string()));
        }
        Ok((self.0 / divisor).to_string())
    }

    pub fn checked_mul(&self, other: &Dec) -> Result<Dec, DecimalError> {
        let product = self.0.checked_mul(other.0).ok_or(DecimalError::Overflow)?;
        Ok(Dec(product / scale()))
    }

    pub fn checked_div(&self, other: &Dec) -> Result<Dec, DecimalError> {
        if other.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        let numerator = self.0.checked_mul(scale()).ok_or(DecimalError::Overflow)?;
        Ok(Dec(numerator / other.0))
    }
}

impl FromStr for Dec {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };

        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(DecimalError::Invalid(s.to_string()));
        }
        if frac.len() > DEC_PRECISION {
            return Err(DecimalError::TooPrecise(s.to_string()));
        }

        let mut padded = String::with_capacity(whole.len() + DEC_PRECISION);
        padded.push_str(whole);
        padded.push_str(frac);
        padded.extend(std::iter::repeat('0').take(DEC_PRECISION - frac.len()));

        U256::from_str_radix(&padded, 10)
            .map(Dec)
            .map_err(|_| DecimalError::Overflow)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / scale();
        let frac = self.0 % scale();
        if frac.is_zero() {
            return write!(f, "{}", whole);
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = DEC_PRECISION);
        write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
    }
}

/// Validate a base-unit integer amount (coin amounts are never fractional).
pub fn parse_base_units(amount: &str) -> Result<String, DecimalError> {
    let amount = amount.trim();
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return Err(DecimalError::Invalid(amount.to_string()));
    }
    let value = U256::from_str_radix(amount, 10).map_err(|_| DecimalError::Overflow)?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_chain_string() {
        let dec: Dec = "1.5".parse().unwrap();
        assert_eq!(dec.to_chain_string(), "1500000000000000000");
        assert_eq!(".25".parse::<Dec>().unwrap().to_string(), "0.25");
        assert_eq!("3".parse::<Dec>().unwrap(), Dec::from_integer(3));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!("-1".parse::<Dec>(), Err(DecimalError::Invalid(_))));
        assert!(matches!("1.2.3".parse::<Dec>(), Err(DecimalError::Invalid(_))));
        assert!(matches!(".".parse::<Dec>(), Err(DecimalError::Invalid(_))));
        assert!(matches!(
            "0.0000000000000000001".parse::<Dec>(),
            Err(DecimalError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_margin_arithmetic() {
        let price: Dec = "25.5".parse().unwrap();
        let quantity: Dec = "2".parse().unwrap();
        let leverage: Dec = "3".parse().unwrap();
        let margin = price.checked_mul(&quantity).unwrap().checked_div(&leverage).unwrap();
        assert_eq!(margin.to_string(), "17");
        assert_eq!(price.checked_div(&Dec::ZERO), Err(DecimalError::DivisionByZero));
    }

    #[test]
    fn test_whole_units_to_base_units() {
        let amount: Dec = "1.5".parse().unwrap();
        assert_eq!(amount.to_base_units(18).unwrap(), "1500000000000000000");
        assert_eq!(amount.to_base_units(6).unwrap(), "1500000");
        assert_eq!(Dec::from_integer(2).to_base_units(0).unwrap(), "2");
        assert!(matches!(
            "0.0000001".parse::<Dec>().unwrap().to_base_units(6),
            Err(DecimalError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!(parse_base_units(" 1000 ").unwrap(), "1000");
        assert_eq!(parse_base_units("007").unwrap(), "7");
        assert!(parse_base_units("1.5").is_err());
        assert!(parse_base_units("").is_err());
    }
}
