/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

/// Largest value, or `None` for empty input.
pub fn max(values: &[i64]) -> Option<i64> {
    values.iter().copied().max()
}

/// Smallest value, or `None` for empty input.
pub fn min(values: &[i64]) -> Option<i64> {
    values.iter().copied().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_of_integers_is_fractional() {
        assert_eq!(mean(&[5, 7]), 6.0);
        assert_eq!(mean(&[1, 2]), 1.5);
        assert_eq!(mean(&[-9, 9]), 0.0);
    }

    #[test]
    fn test_max_min() {
        assert_eq!(max(&[3, -9, 12]), Some(12));
        assert_eq!(min(&[3, -9, 12]), Some(-9));
        assert_eq!(max(&[]), None);
    }
}
