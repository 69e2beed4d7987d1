/// Day labels for day indices 0..=6.
pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn day_label(day: u8) -> &'static str {
    DAY_LABELS[usize::from(day) % 7]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_of_five_and_seven() {
        assert_eq!(round2(mean(&[5.0, 7.0])), 6.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(10.0), 10.0);
    }

    #[test]
    fn test_day_label_wraps() {
        assert_eq!(day_label(0), "Mon");
        assert_eq!(day_label(6), "Sun");
        assert_eq!(day_label(7), "Mon");
    }
}
