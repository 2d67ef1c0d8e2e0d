use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// An exact fraction, kept unreduced.
///
/// Equality compares numerator and denominator pairwise, so `5/3` and
/// `10/6` are different values.
///
/// # Example
///
/// ```rust
/// use pixmeta::Rational;
///
/// let r = Rational::new(5, 3).unwrap();
/// assert_eq!(r.to_string(), "5/3");
/// assert_ne!(r, Rational::new(10, 6).unwrap());
/// assert!(Rational::new(1, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Create a fraction. Fails if the denominator is zero.
    pub fn new(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(Error::conversion(
                "Rational",
                format!("{numerator}/{denominator}"),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// True if either component is negative.
    pub fn is_negative(&self) -> bool {
        self.numerator < 0 || self.denominator < 0
    }

    /// Approximate decimal value.
    pub fn to_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
