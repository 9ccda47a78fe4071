use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One end of an interval, the variant order gives `-inf < n < +inf`
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum Bound {
    NegativeInfinity,
    Value(i64),
    PositiveInfinity,
}

impl Bound {
    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    fn signum(&self) -> i64 {
        match self {
            Self::NegativeInfinity => -1,
            Self::Value(v) => v.signum(),
            Self::PositiveInfinity => 1,
        }
    }

    fn infinity(sign: i64) -> Self {
        if sign < 0 {
            Self::NegativeInfinity
        } else {
            Self::PositiveInfinity
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::NegativeInfinity => Self::PositiveInfinity,
            Self::PositiveInfinity => Self::NegativeInfinity,
            Self::Value(v) => v.checked_neg().map_or(Self::PositiveInfinity, Self::Value),
        }
    }

    pub fn add(&self, other: &Self) -> EngineResult<Self> {
        let result = match (self, other) {
            (Self::NegativeInfinity, Self::PositiveInfinity)
            | (Self::PositiveInfinity, Self::NegativeInfinity) => {
                return Err(EngineError::UndefinedArithmetic(format!(
                    "{} + {}",
                    self, other
                )));
            }
            (Self::NegativeInfinity, _) | (_, Self::NegativeInfinity) => Self::NegativeInfinity,
            (Self::PositiveInfinity, _) | (_, Self::PositiveInfinity) => Self::PositiveInfinity,
            (Self::Value(a), Self::Value(b)) => a
                .checked_add(*b)
                .map_or_else(|| Self::infinity(b.signum()), Self::Value),
        };
        Ok(result)
    }

    pub fn sub(&self, other: &Self) -> EngineResult<Self> {
        let result = match (self, other) {
            (Self::NegativeInfinity, Self::NegativeInfinity)
            | (Self::PositiveInfinity, Self::PositiveInfinity) => {
                return Err(EngineError::UndefinedArithmetic(format!(
                    "{} - {}",
                    self, other
                )));
            }
            (Self::PositiveInfinity, _) | (_, Self::NegativeInfinity) => Self::PositiveInfinity,
            (Self::NegativeInfinity, _) | (_, Self::PositiveInfinity) => Self::NegativeInfinity,
            (Self::Value(a), Self::Value(b)) => a
                .checked_sub(*b)
                .map_or_else(|| Self::infinity(-b.signum()), Self::Value),
        };
        Ok(result)
    }

    /// Multiplication, an infinity times zero is zero
    pub fn mul(&self, other: &Self) -> Self {
        let sign = self.signum() * other.signum();
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a
                .checked_mul(*b)
                .map_or_else(|| Self::infinity(sign), Self::Value),
            _ if sign == 0 => Self::Value(0),
            _ => Self::infinity(sign),
        }
    }

    /// Division truncating towards zero
    pub fn div(&self, other: &Self) -> EngineResult<Self> {
        let result = match (self, other) {
            (_, Self::Value(0)) => {
                return Err(EngineError::UndefinedArithmetic(format!(
                    "{} / 0",
                    self
                )));
            }
            (Self::Value(a), Self::Value(b)) => a
                .checked_div(*b)
                .map_or(Self::PositiveInfinity, Self::Value),
            (Self::Value(_), _) => Self::Value(0),
            (_, Self::Value(b)) => Self::infinity(self.signum() * b.signum()),
            _ => {
                return Err(EngineError::UndefinedArithmetic(format!(
                    "{} / {}",
                    self, other
                )));
            }
        };
        Ok(result)
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeInfinity => write!(f, "-inf"),
            Self::Value(v) => write!(f, "{}", v),
            Self::PositiveInfinity => write!(f, "+inf"),
        }
    }
}
