//! Tolerance-relaxed comparisons for `fuzzy` bounds.
//!
//! The tolerance is relative: a bound `b` is widened by `|b| * epsilon` in
//! the direction that makes the comparison easier to satisfy.

/// Moves `value` towards negative infinity by a fraction `epsilon` of its
/// magnitude.
pub fn fuzz_down(value: f64, epsilon: f64) -> f64 {
    if value >= 0.0 {
        value * (1.0 - epsilon)
    } else {
        value * (1.0 + epsilon)
    }
}

/// Moves `value` towards positive infinity by a fraction `epsilon` of its
/// magnitude.
pub fn fuzz_up(value: f64, epsilon: f64) -> f64 {
    if value >= 0.0 {
        value * (1.0 + epsilon)
    } else {
        value * (1.0 - epsilon)
    }
}

/// `a >= b`, allowing `a` to fall short of `b` by the tolerance.
pub fn fuzzy_greater_than(a: f64, b: f64, epsilon: f64) -> bool {
    a >= b || a >= fuzz_down(b, epsilon)
}

/// `a <= b`, allowing `a` to overshoot `b` by the tolerance.
pub fn fuzzy_less_than(a: f64, b: f64, epsilon: f64) -> bool {
    a <= b || a <= fuzz_up(b, epsilon)
}
