use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// A single scalar held in a record field.
///
/// Numbers exist in two shapes: exact fixed-point decimals and machine
/// integers. Integer to decimal promotion is implicit; all decimal math is
/// exact (never binary floating point).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Decimal(BigDecimal),
    Integer(i64),
    Text(String),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    #[error("division by zero")]
    ZeroDivide,
    #[error("cannot interpret {0:?} as a number")]
    NotNumeric(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, promoting integers and parsing numeric
    /// text. Returns `None` for null and non-numeric text.
    pub fn as_number(&self) -> Option<BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d.clone()),
            Value::Integer(i) => Some(BigDecimal::from(*i)),
            Value::Text(s) => BigDecimal::from_str(s.trim()).ok(),
            Value::Null => None,
        }
    }

    /// Number of fractional digits carried by the value; zero for integers
    /// and anything non-numeric.
    pub fn scale(&self) -> u32 {
        match self {
            Value::Decimal(d) => d.fractional_digit_count().max(0) as u32,
            _ => 0,
        }
    }

    /// Total comparison used by COMPARE/TEST: two texts compare
    /// lexicographically, numeric operands numerically (after promotion),
    /// and mixed operands numerically when both sides coerce, falling back
    /// to their text forms.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.coerced_text().cmp(&other.coerced_text()),
            },
        }
    }

    fn coerced_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Null => String::new(),
        }
    }

    /// Printer normalization: decimals at two fractional digits, text
    /// uppercased, null rendered empty.
    pub fn printer_form(&self) -> String {
        match self {
            Value::Decimal(d) => {
                d.with_scale_round(2, RoundingMode::HalfEven).to_string()
            }
            Value::Integer(i) => i.to_string(),
            Value::Text(s) => s.to_uppercase(),
            Value::Null => String::new(),
        }
    }
}

/// Value equality after numeric normalization: `Integer(10)` equals
/// `Decimal(10.00)`, but text never equals a number.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(d), Value::Integer(i))
            | (Value::Integer(i), Value::Decimal(d)) => *d == BigDecimal::from(*i),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

fn numeric(value: &Value) -> Result<BigDecimal, NumericError> {
    value
        .as_number()
        .ok_or_else(|| NumericError::NotNumeric(value.coerced_text()))
}

/// ADD a TO b. Integer operands stay integer while the sum fits in i64.
pub fn add(a: &Value, b: &Value) -> Result<Value, NumericError> {
    if let (Value::Integer(x), Value::Integer(y)) = (a, b)
        && let Some(sum) = x.checked_add(*y)
    {
        return Ok(Value::Integer(sum));
    }
    Ok(Value::Decimal(numeric(a)? + numeric(b)?))
}

/// SUBTRACT a FROM b, i.e. `b - a`.
pub fn subtract(a: &Value, b: &Value) -> Result<Value, NumericError> {
    if let (Value::Integer(x), Value::Integer(y)) = (a, b)
        && let Some(difference) = y.checked_sub(*x)
    {
        return Ok(Value::Integer(difference));
    }
    Ok(Value::Decimal(numeric(b)? - numeric(a)?))
}

/// MULTIPLY a BY b. The product of two exact decimals is exact; scales add.
pub fn multiply(a: &Value, b: &Value) -> Result<Value, NumericError> {
    if let (Value::Integer(x), Value::Integer(y)) = (a, b)
        && let Some(product) = x.checked_mul(*y)
    {
        return Ok(Value::Integer(product));
    }
    Ok(Value::Decimal(numeric(a)? * numeric(b)?))
}

/// DIVIDE a BY b. The quotient is rounded half-to-even to the larger of the
/// operands' scales, never below `scale_floor`.
pub fn divide(a: &Value, b: &Value, scale_floor: u32) -> Result<Value, NumericError> {
    let dividend = numeric(a)?;
    let divisor = numeric(b)?;
    if divisor.is_zero() {
        return Err(NumericError::ZeroDivide);
    }
    let scale = a.scale().max(b.scale()).max(scale_floor);
    let quotient = &dividend / &divisor;
    Ok(Value::Decimal(
        quotient.with_scale_round(scale as i64, RoundingMode::HalfEven),
    ))
}
