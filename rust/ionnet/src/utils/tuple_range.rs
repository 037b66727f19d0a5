use std::ops::{
    Add,
    Neg,
    Sub,
};

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TupleRangeError {
    #[error("Expected an ordered range, got start > end")]
    ExpectedOrderedRange,
}

/// Closed interval `[start, end]`.
///
/// ```
/// use ionnet::utils::TupleRange;
///
/// let range = TupleRange::try_new(299.9, 300.1).unwrap();
/// assert!(range.contains(300.0));
/// assert!(TupleRange::try_new(1.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

impl<T: Copy + PartialOrd> TupleRange<T> {
    pub fn try_new(start: T, end: T) -> Result<Self, TupleRangeError> {
        if start > end {
            return Err(TupleRangeError::ExpectedOrderedRange);
        }
        Ok(Self(start, end))
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn contains(&self, value: T) -> bool {
        self.0 <= value && value <= self.1
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.0 <= other.1 && other.0 <= self.1
    }
}

impl<T> TupleRange<T>
where
    T: Copy + PartialOrd + Default + Add<Output = T> + Sub<Output = T> + Neg<Output = T>,
{
    /// Builds `[center - lower, center + upper]`, both offsets taken as absolute values.
    pub fn around(center: T, lower: T, upper: T) -> Self {
        let abs = |x: T| if x < T::default() { -x } else { x };
        Self(center - abs(lower), center + abs(upper))
    }
}

impl<T: Copy + PartialOrd> TryFrom<(T, T)> for TupleRange<T> {
    type Error = TupleRangeError;

    fn try_from(value: (T, T)) -> Result<Self, Self::Error> {
        Self::try_new(value.0, value.1)
    }
}

/// A restriction that can be switched off entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionallyRestricted<T: Copy> {
    Restricted(T),
    Unrestricted,
}

impl<T: Copy> OptionallyRestricted<T> {
    pub fn to_option(&self) -> Option<T> {
        match self {
            OptionallyRestricted::Restricted(x) => Some(*x),
            OptionallyRestricted::Unrestricted => None,
        }
    }

    pub fn map<T2: Copy>(self, f: impl FnOnce(T) -> T2) -> OptionallyRestricted<T2> {
        match self {
            OptionallyRestricted::Restricted(x) => OptionallyRestricted::Restricted(f(x)),
            OptionallyRestricted::Unrestricted => OptionallyRestricted::Unrestricted,
        }
    }

    pub fn is_unrestricted_or(&self, f: impl FnOnce(&T) -> bool) -> bool {
        match self {
            OptionallyRestricted::Restricted(x) => f(x),
            OptionallyRestricted::Unrestricted => true,
        }
    }
}
