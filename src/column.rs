use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Paid in earlier progress payments
    Previous,
    /// This progress payment
    Current,
    /// Cumulative to date
    General,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Previous, Period::Current, Period::General];
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Period::Previous => "previous",
            Period::Current => "current",
            Period::General => "general",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct ColumnParts {
    #[serde(default)]
    previous: f64,
    #[serde(default)]
    current: f64,
}

/// A previous / current / general triple.
///
/// `general` is always `previous + current`. It is derived in the constructor
/// and has no setter, so every arithmetic operation re-derives it from the
/// two period columns instead of combining generals independently. A
/// `general` present in serialized input is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColumnParts")]
pub struct PeriodColumnValue {
    previous: f64,
    current: f64,
    general: f64,
}

impl From<ColumnParts> for PeriodColumnValue {
    fn from(parts: ColumnParts) -> Self {
        Self::new(parts.previous, parts.current)
    }
}

impl PeriodColumnValue {
    pub fn new(previous: f64, current: f64) -> Self {
        Self {
            previous,
            current,
            general: previous + current,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn general(&self) -> f64 {
        self.general
    }

    pub fn get(&self, period: Period) -> f64 {
        match period {
            Period::Previous => self.previous,
            Period::Current => self.current,
            Period::General => self.general,
        }
    }

    /// Applies `f` to the previous and current columns; general follows.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.previous), f(self.current))
    }
}

impl Add for PeriodColumnValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.previous + rhs.previous, self.current + rhs.current)
    }
}

impl Sub for PeriodColumnValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.previous - rhs.previous, self.current - rhs.current)
    }
}

impl Neg for PeriodColumnValue {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.previous, -self.current)
    }
}

impl Mul<f64> for PeriodColumnValue {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

impl Sum for PeriodColumnValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a PeriodColumnValue> for PeriodColumnValue {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, v| acc + *v)
    }
}
