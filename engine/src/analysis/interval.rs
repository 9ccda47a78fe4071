use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::bound::Bound;
use crate::analysis::generic::AbstractDomain;
use crate::error::EngineResult;

/// An element of the interval lattice
///
/// `Bottom` denotes "no value" (unreachable or not yet computed) and a
/// `Bounded` interval with both ends infinite is the top element.
#[derive(Eq, PartialEq, Hash, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum LatticeInterval {
    Bottom,
    Bounded { lower: Bound, upper: Bound },
}

impl LatticeInterval {
    /// Build an interval from two bounds given in either order
    pub fn new(a: Bound, b: Bound) -> Self {
        if a <= b {
            Self::Bounded { lower: a, upper: b }
        } else {
            Self::Bounded { lower: b, upper: a }
        }
    }

    pub fn range(a: i64, b: i64) -> Self {
        Self::new(Bound::Value(a), Bound::Value(b))
    }

    pub fn constant(value: i64) -> Self {
        Self::range(value, value)
    }

    pub fn top() -> Self {
        Self::Bounded {
            lower: Bound::NegativeInfinity,
            upper: Bound::PositiveInfinity,
        }
    }

    /// `[value, +inf]`
    pub fn at_least(value: i64) -> Self {
        Self::Bounded {
            lower: Bound::Value(value),
            upper: Bound::PositiveInfinity,
        }
    }

    /// `[-inf, value]`
    pub fn at_most(value: i64) -> Self {
        Self::Bounded {
            lower: Bound::NegativeInfinity,
            upper: Bound::Value(value),
        }
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    pub fn is_top(&self) -> bool {
        *self == Self::top()
    }

    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Bottom => true,
            Self::Bounded { lower, upper } => lower <= upper,
        }
    }

    pub fn bounds(&self) -> Option<(Bound, Bound)> {
        match self {
            Self::Bottom => None,
            Self::Bounded { lower, upper } => Some((*lower, *upper)),
        }
    }

    /// The single value this interval admits, if any
    pub fn as_constant(&self) -> Option<i64> {
        match self.bounds()? {
            (Bound::Value(l), Bound::Value(u)) if l == u => Some(l),
            _ => None,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        match self {
            Self::Bottom => false,
            Self::Bounded { lower, upper } => {
                *lower <= Bound::Value(value) && Bound::Value(value) <= *upper
            }
        }
    }

    /// Whether every value of `self` is also admitted by `other`
    pub fn is_within(&self, other: &Self) -> bool {
        matches!(
            self.partial_order(other),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// Comparison by overlap: intersecting intervals compare `Equal`,
    /// otherwise the interval lying entirely below is `Less`
    pub fn overlap_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bottom, Self::Bottom) => Ordering::Equal,
            (Self::Bottom, _) => Ordering::Less,
            (_, Self::Bottom) => Ordering::Greater,
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => {
                if l1 > u2 {
                    Ordering::Greater
                } else if u1 < l2 {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            }
        }
    }

    /// Least upper bound, `Bottom` is the identity
    pub fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, _) => *other,
            (_, Self::Bottom) => *self,
            _ if !self.is_well_formed() || !other.is_well_formed() => {
                warn!("unable to join {} and {}, assuming top", self, other);
                Self::top()
            }
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => Self::Bounded {
                lower: *l1.min(l2),
                upper: *u1.max(u2),
            },
        }
    }

    /// Intersection, `Bottom` on one side yields the other side
    pub fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Bottom, _) => *other,
            (_, Self::Bottom) => *self,
            _ if !self.is_well_formed() || !other.is_well_formed() => {
                warn!("unable to meet {} and {}, assuming top", self, other);
                Self::top()
            }
            _ if self.overlap_cmp(other) != Ordering::Equal => Self::Bottom,
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => Self::Bounded {
                lower: *l1.max(l2),
                upper: *u1.min(u2),
            },
        }
    }

    /// Restrict the values to `range`, unreachable stays unreachable
    pub fn restrict(&self, range: &Self) -> Self {
        match (self, range) {
            (Self::Bottom, _) | (_, Self::Bottom) => Self::Bottom,
            _ => self.meet(range),
        }
    }

    /// Widen `self` (the previous value) with `current`
    pub fn widen(&self, current: &Self) -> Self {
        match (self, current) {
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => Self::Bounded {
                lower: if l2 < l1 {
                    Bound::NegativeInfinity
                } else {
                    *l1
                },
                upper: if u2 > u1 {
                    Bound::PositiveInfinity
                } else {
                    *u1
                },
            },
            (Self::Bottom, _) => *current,
            (_, Self::Bottom) => *self,
        }
    }

    /// Narrow `self` (the previous value) with `current`, only infinite
    /// bounds of the previous value are replaced
    pub fn narrow(&self, current: &Self) -> Self {
        match (self, current) {
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => {
                let lower = if *l1 == Bound::NegativeInfinity {
                    *l2
                } else {
                    *l1
                };
                let upper = if *u1 == Bound::PositiveInfinity {
                    *u2
                } else {
                    *u1
                };
                if lower > upper {
                    Self::Bottom
                } else {
                    Self::Bounded { lower, upper }
                }
            }
            _ => Self::Bottom,
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::Bottom => Self::Bottom,
            Self::Bounded { lower, upper } => Self::Bounded {
                lower: upper.neg(),
                upper: lower.neg(),
            },
        }
    }

    pub fn add(&self, other: &Self) -> EngineResult<Self> {
        match (self.bounds(), other.bounds()) {
            (Some((l1, u1)), Some((l2, u2))) => Ok(Self::Bounded {
                lower: l1.add(&l2)?,
                upper: u1.add(&u2)?,
            }),
            _ => Ok(Self::Bottom),
        }
    }

    pub fn sub(&self, other: &Self) -> EngineResult<Self> {
        match (self.bounds(), other.bounds()) {
            (Some((l1, u1)), Some((l2, u2))) => Ok(Self::Bounded {
                lower: l1.sub(&u2)?,
                upper: u1.sub(&l2)?,
            }),
            _ => Ok(Self::Bottom),
        }
    }

    pub fn mul(&self, other: &Self) -> Self {
        match (self.bounds(), other.bounds()) {
            (Some((l1, u1)), Some((l2, u2))) => {
                let candidates = [l1.mul(&l2), l1.mul(&u2), u1.mul(&l2), u1.mul(&u2)];
                Self::hull(&candidates)
            }
            _ => Self::Bottom,
        }
    }

    /// Truncating division, a divisor admitting zero yields top
    pub fn div(&self, other: &Self) -> EngineResult<Self> {
        match (self.bounds(), other.bounds()) {
            (Some((l1, u1)), Some((l2, u2))) => {
                if other.contains(0) {
                    return Ok(Self::top());
                }
                let candidates = [l1.div(&l2)?, l1.div(&u2)?, u1.div(&l2)?, u1.div(&u2)?];
                Ok(Self::hull(&candidates))
            }
            _ => Ok(Self::Bottom),
        }
    }

    /// Remainder with the sign of the dividend, a divisor admitting zero yields top
    pub fn rem(&self, other: &Self) -> Self {
        let (Some((l1, u1)), Some((l2, u2))) = (self.bounds(), other.bounds()) else {
            return Self::Bottom;
        };
        if other.contains(0) {
            return Self::top();
        }
        if let (Some(a), Some(b)) = (self.as_constant(), other.as_constant()) {
            return Self::constant(a.checked_rem(b).unwrap_or(0));
        }

        // largest magnitude a remainder can take
        let magnitude = |b: Bound| match b {
            Bound::Value(v) => v
                .checked_abs()
                .map_or(Bound::PositiveInfinity, |a| Bound::Value(a - 1)),
            _ => Bound::PositiveInfinity,
        };
        let limit = magnitude(l2).max(magnitude(u2));

        let zero = Bound::Value(0);
        let lower = if l1 >= zero { zero } else { l1.max(limit.neg()) };
        let upper = if u1 <= zero { zero } else { u1.min(limit) };
        Self::Bounded { lower, upper }
    }

    fn hull(candidates: &[Bound]) -> Self {
        let lower = candidates.iter().min().copied();
        let upper = candidates.iter().max().copied();
        match (lower, upper) {
            (Some(lower), Some(upper)) => Self::Bounded { lower, upper },
            _ => Self::Bottom,
        }
    }
}

impl AbstractDomain for LatticeInterval {
    fn join(&self, other: &Self) -> Self {
        LatticeInterval::join(self, other)
    }

    fn meet(&self, other: &Self) -> Self {
        LatticeInterval::meet(self, other)
    }

    fn widen(&self, other: &Self) -> Self {
        LatticeInterval::widen(self, other)
    }

    fn narrow(&self, other: &Self) -> Self {
        LatticeInterval::narrow(self, other)
    }

    /// Ordered by containment, disjoint or malformed intervals are incomparable
    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bottom, Self::Bottom) => Some(Ordering::Equal),
            (Self::Bottom, _) => Some(Ordering::Less),
            (_, Self::Bottom) => Some(Ordering::Greater),
            _ if !self.is_well_formed() || !other.is_well_formed() => None,
            (
                Self::Bounded {
                    lower: l1,
                    upper: u1,
                },
                Self::Bounded {
                    lower: l2,
                    upper: u2,
                },
            ) => {
                if l1 == l2 && u1 == u2 {
                    Some(Ordering::Equal)
                } else if l1 >= l2 && u1 <= u2 {
                    Some(Ordering::Less)
                } else if l1 <= l2 && u1 >= u2 {
                    Some(Ordering::Greater)
                } else {
                    None
                }
            }
        }
    }

    fn bottom() -> Self {
        Self::Bottom
    }
}

impl Display for LatticeInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bottom => write!(f, "BOTTOM"),
            Self::Bounded { lower, upper } => write!(f, "[{}, {}]", lower, upper),
        }
    }
}
