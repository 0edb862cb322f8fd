//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Get the counter-clockwise angular sweep from `start` to `end` in radians, in the range
/// [0, 2pi).
pub fn ccw_sweep<T>(start: T, end: T) -> T
where
    T: Float
{
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    rem_euclid(end - start, tau_t)
}

/// Returns true if `angle` lies on the counter-clockwise sweep from `start` to `end`, all in
/// radians.
pub fn in_ccw_sweep<T>(angle: T, start: T, end: T) -> bool
where
    T: Float
{
    ccw_sweep(start, angle) <= ccw_sweep(start, end)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
/// This result is not an element of the function's codomain, but it is the
/// closest floating point number in the real numbers and thus fulfills the
/// property `self == self.div_euclid(rhs) * rhs + self.rem_euclid(rhs)`
/// approximatively.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ccw_sweep() {
        const PI: f64 = std::f64::consts::PI;

        assert!((ccw_sweep(0f64, PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((ccw_sweep(PI / 2.0, 0f64) - 1.5 * PI).abs() < 1e-12);
        assert!((ccw_sweep(-PI / 2.0, PI / 2.0) - PI).abs() < 1e-12);

        // Sweep from 170 deg to -170 deg passes through 180 deg, not 0 deg
        let start = 170f64.to_radians();
        let end = (-170f64).to_radians();
        assert!(in_ccw_sweep(PI, start, end));
        assert!(!in_ccw_sweep(0f64, start, end));
    }
}
