//! Accuracy scoring.
//!
//! The score falls linearly from 100 at an exact match to 0 when the
//! distance reaches the full slider range: `clamp(1 - diff / range, 0, 1) * 100`.

/// Absolute distance between `current` and `target`.
pub fn diff(current: f64, target: f64) -> f64 {
    (current - target).abs()
}

/// Accuracy in `[0, 100]` for `current` against `target` on `[min, max]`.
///
/// `max > min` is a configuration invariant checked at load time.
pub fn score(current: f64, target: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    debug_assert!(range > 0.0, "slider range must be positive");
    let normalized = (1.0 - diff(current, target) / range).clamp(0.0, 1.0);
    normalized * 100.0
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_100() {
        for x in [0.0, 1.0, 3000.0, 11_999.0, 12_000.0] {
            assert_eq!(score(x, x, 0.0, 12_000.0), 100.0);
        }
    }

    #[test]
    fn reference_example() {
        assert_eq!(diff(3050.0, 3000.0), 50.0);
        let s = score(3050.0, 3000.0, 0.0, 12_000.0);
        assert!((s - 99.583_333).abs() < 1e-4, "got {s}");
    }

    #[test]
    fn full_range_or_more_scores_zero() {
        assert_eq!(score(0.0, 12_000.0, 0.0, 12_000.0), 0.0);
        assert_eq!(score(-5000.0, 12_000.0, 0.0, 12_000.0), 0.0);
    }

    #[test]
    fn monotonically_non_increasing_in_distance() {
        let target = 6000.0;
        let mut previous = f64::INFINITY;
        for d in (0..=14_000).step_by(250) {
            let s = score(target + f64::from(d), target, 0.0, 12_000.0);
            assert!(s <= previous, "score rose at distance {d}");
            assert!((0.0..=100.0).contains(&s));
            previous = s;
        }
    }

    #[test]
    fn direction_does_not_matter() {
        assert_eq!(
            score(2500.0, 3000.0, 0.0, 12_000.0),
            score(3500.0, 3000.0, 0.0, 12_000.0)
        );
    }
}
