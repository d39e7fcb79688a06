//! Sampling helpers shared by the evolutionary operators.
//!
//! Everything is generic over [`rand::Rng`], so the driver can plug any
//! seedable generator and runs stay reproducible from the seed alone.

use rand::Rng;

/// Samples from a geometric distribution with success probability `p`
/// (inverse-CDF method). The result is at least 1, so it can be used
/// directly as a gap between mutated positions.
#[inline]
pub fn geometric<R: Rng>(rng: &mut R, p: f64) -> usize {
    debug_assert!(p > 0.0 && p <= 1.0, "p must be in (0, 1]");
    let u: f64 = rng.random(); // in [0, 1)
    1 + (f64::ln_1p(-u) / f64::ln_1p(-p)) as usize
}

/// Chooses two distinct indices uniformly from `0..bound`.
///
/// # Panics
/// Panics in debug builds if `bound < 2`.
#[inline]
pub fn choose_two<R: Rng>(rng: &mut R, bound: usize) -> (usize, usize) {
    debug_assert!(bound > 1, "need at least two elements to choose from");
    if bound == 2 {
        let a = rng.random_range(0..2);
        return (a, 1 - a);
    }
    let a = rng.random_range(0..bound);
    let mut b = rng.random_range(0..bound);
    while b == a {
        b = rng.random_range(0..bound);
    }
    (a, b)
}
