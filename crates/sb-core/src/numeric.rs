use crate::SbError;

/// Floating point type used for levels (L), flows (L/s) and times (s).
pub type Real = f64;

/// Absolute/relative tolerance pair for float comparisons.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SbError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SbError::NonFinite { what, value: v })
    }
}

/// True when `v` lies in `[lo - slack, hi + slack]`. NaN is never in range.
pub fn within(v: Real, lo: Real, hi: Real, slack: Real) -> bool {
    v.is_finite() && v >= lo - slack && v <= hi + slack
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nearly_equal_is_symmetric(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            let tol = Tolerances::default();
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, tol));
        }

        #[test]
        fn within_accepts_the_closed_interval(
            lo in -100.0_f64..100.0,
            width in 0.0_f64..100.0,
            t in 0.0_f64..=1.0,
        ) {
            let hi = lo + width;
            prop_assert!(within(lo + t * width, lo, hi, 0.0));
        }
    }
}
