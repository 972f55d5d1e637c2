use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A resource quantity as the API server encodes it: `"4"`, `"500m"`, `"8Gi"`,
/// `"1e3"`. The original text is kept so that an updated node is sent back
/// exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    raw: String,
    negative: bool,
    mantissa: u128,
    exp10: i32,
    exp2: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,
    #[error("invalid quantity {0:?}")]
    Invalid(String),
    #[error("quantity {0:?} is out of range")]
    Overflow(String),
}

pub const GIBI: u64 = 1 << 30;

impl Quantity {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whole units, rounded towards negative infinity.
    pub fn floor(&self) -> i64 {
        self.floor_div(1)
    }

    /// `floor(value / divisor)`, saturating at the bounds of `i64`.
    pub fn floor_div(&self, divisor: u64) -> i64 {
        if self.mantissa == 0 {
            return 0;
        }
        let divisor = u128::from(divisor.max(1));

        let numerator = self
            .mantissa
            .checked_mul(1u128 << self.exp2)
            .and_then(|n| {
                if self.exp10 > 0 {
                    n.checked_mul(10u128.checked_pow(self.exp10 as u32)?)
                } else {
                    Some(n)
                }
            });
        let denominator = if self.exp10 < 0 {
            10u128
                .checked_pow(self.exp10.unsigned_abs())
                .and_then(|d| d.checked_mul(divisor))
        } else {
            Some(divisor)
        };

        let (quotient, exact) = match (numerator, denominator) {
            (None, _) => (u128::MAX, true),
            (Some(n), None) => (0, n == 0),
            (Some(n), Some(d)) => (n / d, n % d == 0),
        };

        if self.negative && self.mantissa != 0 {
            let magnitude = if exact { quotient } else { quotient.saturating_add(1) };
            i64::try_from(magnitude).map(|m| -m).unwrap_or(i64::MIN)
        } else {
            i64::try_from(quotient).unwrap_or(i64::MAX)
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }
        let invalid = || QuantityError::Invalid(s.to_string());

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let mut parts = number.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(invalid());
        }

        let mut mantissa: u128 = 0;
        for digit in whole.bytes().chain(fraction.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(digit - b'0')))
                .ok_or_else(|| QuantityError::Overflow(s.to_string()))?;
        }
        let mut exp10 = -(fraction.len() as i32);
        let mut exp2 = 0;

        match suffix {
            "" => {}
            "n" => exp10 -= 9,
            "u" => exp10 -= 6,
            "m" => exp10 -= 3,
            "k" => exp10 += 3,
            "M" => exp10 += 6,
            "G" => exp10 += 9,
            "T" => exp10 += 12,
            "P" => exp10 += 15,
            "E" => exp10 += 18,
            "Ki" => exp2 = 10,
            "Mi" => exp2 = 20,
            "Gi" => exp2 = 30,
            "Ti" => exp2 = 40,
            "Pi" => exp2 = 50,
            "Ei" => exp2 = 60,
            other if other.starts_with(['e', 'E']) => {
                let exponent: i32 = other[1..].parse().map_err(|_| invalid())?;
                exp10 = exp10.checked_add(exponent).ok_or_else(invalid)?;
            }
            _ => return Err(invalid()),
        }

        Ok(Quantity {
            raw: s.to_string(),
            negative,
            mantissa,
            exp10,
            exp2,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
