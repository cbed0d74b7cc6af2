//! Standard breaker ratings.
//!
//! Nominal currents (In) of commercially available circuit breakers, in
//! ascending order. Selection always picks the smallest rating that is at
//! least the design current.

/// Standard breaker ratings in amperes, ascending.
pub const STANDARD_BREAKER_RATINGS_A: [f64; 24] = [
    6.0, 10.0, 16.0, 20.0, 25.0, 32.0, 40.0, 50.0, 63.0, 70.0, 80.0, 90.0, 100.0, 125.0, 150.0,
    175.0, 200.0, 225.0, 250.0, 300.0, 350.0, 400.0, 500.0, 630.0,
];

/// Largest tabulated breaker rating.
pub fn largest_rating_a() -> f64 {
    STANDARD_BREAKER_RATINGS_A[STANDARD_BREAKER_RATINGS_A.len() - 1]
}

/// Smallest standard rating `>= design_current_a`.
///
/// Returns `None` when the design current exceeds the largest rating or is
/// not a number.
///
/// ```rust
/// use quadro_core::tables::select_breaker;
///
/// assert_eq!(select_breaker(6.82), Some(10.0));
/// assert_eq!(select_breaker(10.0), Some(10.0));
/// assert_eq!(select_breaker(700.0), None);
/// ```
pub fn select_breaker(design_current_a: f64) -> Option<f64> {
    STANDARD_BREAKER_RATINGS_A
        .iter()
        .copied()
        .find(|&rating| rating >= design_current_a)
}
