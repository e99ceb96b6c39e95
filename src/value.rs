/*
 * Copyright (c) 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

//! Numeric types for capacities, flows and costs.

use crate::num::traits::{Bounded, NumAssign, NumCast, Signed};

use std::fmt::{Debug, Display};

/// A numeric type usable for capacities, flows and costs.
///
/// Flows are signed because each residual arc pair stores a single flow
/// value whose reverse view is its negation.
pub trait FlowNum: NumAssign + NumCast + Signed + Bounded + PartialOrd + Copy + Debug + Display {
    /// Return `true` if the value stands for an unbounded capacity.
    ///
    /// This is only possible for floating point types (`inf`).
    fn is_unbounded(&self) -> bool;

    /// Return `self + rhs`, or `None` if the sum is not representable.
    fn checked_plus(self, rhs: Self) -> Option<Self>;

    /// Return `self * rhs`, or `None` if the product is not representable.
    fn checked_times(self, rhs: Self) -> Option<Self>;
}

macro_rules! integral_flownum {
    ($($t:ty),*) => {
        $(
            impl FlowNum for $t {
                fn is_unbounded(&self) -> bool {
                    false
                }

                fn checked_plus(self, rhs: Self) -> Option<Self> {
                    self.checked_add(rhs)
                }

                fn checked_times(self, rhs: Self) -> Option<Self> {
                    self.checked_mul(rhs)
                }
            }
        )*
    };
}

integral_flownum!(i16, i32, i64, i128, isize);

impl FlowNum for f32 {
    fn is_unbounded(&self) -> bool {
        self.is_infinite()
    }

    fn checked_plus(self, rhs: Self) -> Option<Self> {
        Some(self + rhs).filter(|x| x.is_finite())
    }

    fn checked_times(self, rhs: Self) -> Option<Self> {
        Some(self * rhs).filter(|x| x.is_finite())
    }
}

impl FlowNum for f64 {
    fn is_unbounded(&self) -> bool {
        self.is_infinite()
    }

    fn checked_plus(self, rhs: Self) -> Option<Self> {
        Some(self + rhs).filter(|x| x.is_finite())
    }

    fn checked_times(self, rhs: Self) -> Option<Self> {
        Some(self * rhs).filter(|x| x.is_finite())
    }
}

/// The smaller of two values.
pub(crate) fn min<F: PartialOrd>(a: F, b: F) -> F {
    if b < a {
        b
    } else {
        a
    }
}

/// Return `x + y`, or the largest value of `F` on overflow.
pub(crate) fn saturating_add<F: FlowNum>(x: F, y: F) -> F {
    x.checked_plus(y).unwrap_or_else(F::max_value)
}

/// Return `x * y`, or the largest value of `F` on overflow.
pub(crate) fn saturating_mul<F: FlowNum>(x: F, y: F) -> F {
    x.checked_times(y).unwrap_or_else(F::max_value)
}

/// Return `3 * x`, or `1` if `x` is zero.
///
/// The result saturates at the largest value of `F`.
pub(crate) fn triple_or_one<F: FlowNum>(x: F) -> F {
    if x.is_zero() {
        F::one()
    } else {
        saturating_add(saturating_add(x, x), x)
    }
}

/// Return the finite stand-in for unbounded capacities.
///
/// `total` is the sum of the finite capacities, `mass` the sum of all
/// finite arc capacities and `count` the number of unbounded arcs. The
/// result is `triple_or_one(total)`, lowered if necessary so that `mass`
/// plus `count` times the result is still representable. Returns `None`
/// if no value larger than `total` fits.
pub(crate) fn stand_in_for_infinity<F: FlowNum>(total: F, mass: F, count: usize) -> Option<F> {
    let lower = total.checked_plus(F::one())?;
    let mut inf = triple_or_one(total);
    if count > 0 {
        let room = (F::max_value() - mass) / <F as NumCast>::from(count)?;
        inf = min(inf, room);
    }
    if inf < lower {
        None
    } else {
        Some(inf)
    }
}

/// Compare two values with a relative tolerance of `1e-9`.
///
/// Integer values are compared exactly.
pub fn approx_eq<F: FlowNum>(a: F, b: F) -> bool {
    if a == b {
        return true;
    }
    match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) => (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded() {
        assert!(f64::INFINITY.is_unbounded());
        assert!(!1e300f64.is_unbounded());
        assert!(!i64::max_value().is_unbounded());
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(!approx_eq(1.0, 1.001));
        assert!(approx_eq(3, 3));
        assert!(!approx_eq(3, 4));
    }

    #[test]
    fn test_triple_or_one() {
        assert_eq!(triple_or_one(0), 1);
        assert_eq!(triple_or_one(5), 15);
        assert_eq!(triple_or_one(0.5), 1.5);
        assert_eq!(triple_or_one(i32::max_value() / 2), i32::max_value());
    }

    #[test]
    fn test_saturating() {
        assert_eq!(saturating_add(i16::max_value(), 1), i16::max_value());
        assert_eq!(saturating_add(2i16, 3), 5);
        assert_eq!(saturating_mul(1_000_000_000i32, 3), i32::max_value());
        assert_eq!(saturating_mul(4i32, 3), 12);
        assert_eq!(1e308f64.checked_plus(1e308), None);
        assert_eq!(2.0f64.checked_times(1.5), Some(3.0));
    }

    #[test]
    fn test_stand_in_for_infinity() {
        assert_eq!(stand_in_for_infinity(10i32, 10, 1), Some(30));
        assert_eq!(stand_in_for_infinity(0i32, 0, 2), Some(1));
        // 3e9 does not fit, the arcs leave room for 1_147_483_647
        assert_eq!(
            stand_in_for_infinity(1_000_000_000i32, 1_000_000_000, 1),
            Some(1_147_483_647)
        );
        // two unbounded arcs do not fit beside the finite ones
        assert_eq!(stand_in_for_infinity(1_000_000_000i32, 1_000_000_000, 2), None);
        assert_eq!(stand_in_for_infinity(i32::max_value(), i32::max_value(), 0), None);
        assert_eq!(stand_in_for_infinity(1.5f64, 3.0, 2), Some(4.5));
    }
}
