//! This module defines various unit types and their conversions.
//!
//! Investments are made in whole "blocks", so most technology parameters are expressed per block.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

/// Represents a dimensionless quantity (rates, efficiencies, loss and decay factors).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Deserialize,
    Serialize,
    derive_more::Add,
    derive_more::Sub,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Raise to a real-valued power
    pub fn powf(self, exponent: f64) -> Self {
        Dimensionless(self.0.powf(exponent))
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

/// Common behaviour for unit types
pub trait UnitType: Copy {
    /// Create a new value of this unit from a raw f64
    fn new(value: f64) -> Self;

    /// Get the raw f64 value
    fn value(self) -> f64;
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Deserialize,
            Serialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl UnitType for $name {
            fn new(value: f64) -> Self {
                Self(value)
            }

            fn value(self) -> f64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Money);
unit_struct!(Energy);
unit_struct!(Blocks);

// Derived quantities
unit_struct!(MoneyPerBlock);
unit_struct!(EnergyPerBlock);

// Multiplication rules
impl_mul!(MoneyPerBlock, Blocks, Money);
impl_mul!(EnergyPerBlock, Blocks, Energy);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_block_multiplication() {
        let capacity = EnergyPerBlock(20.0) * Blocks(3.0);
        assert_eq!(capacity, Energy(60.0));

        let cost = Blocks(2.0) * MoneyPerBlock(12.5);
        assert_eq!(cost, Money(25.0));
    }

    #[test]
    fn test_dimensionless_powf() {
        let factor = Dimensionless(1.1).powf(2.0);
        assert_approx_eq!(f64, factor.value(), 1.21, epsilon = 1e-12);

        // Negative exponents are allowed (periods before the reference period)
        let factor = Dimensionless(2.0).powf(-1.0);
        assert_approx_eq!(f64, factor.value(), 0.5);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money(1.0), Money(2.5)].into_iter().sum();
        assert_eq!(total, Money(3.5));
    }
}
