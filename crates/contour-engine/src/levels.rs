//! Geometric iso-level progressions.

/// Build `count` contour levels starting at `base`, each one `multiplier`
/// times the previous.
///
/// Inputs are not validated: a non-positive multiplier or zero count simply
/// produces whatever the recurrence yields (an empty vector for `count == 0`).
pub fn levels(base: f64, multiplier: f64, count: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(count);
    let mut level = base;
    for _ in 0..count {
        out.push(level);
        level *= multiplier;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_geometric() {
        let lv = levels(1.0, 2.0, 5);
        assert_eq!(lv, vec![1.0, 2.0, 4.0, 8.0, 16.0]);
    }

    #[test]
    fn test_levels_power_law() {
        let base = 0.37;
        let mult = 1.2;
        let lv = levels(base, mult, 20);
        for (k, level) in lv.iter().enumerate() {
            let expected = base * mult.powi(k as i32);
            assert!((level - expected).abs() <= expected.abs() * 1e-12);
        }
    }

    #[test]
    fn test_levels_single_and_empty() {
        assert_eq!(levels(3.5, 1.4, 1), vec![3.5]);
        assert!(levels(3.5, 1.4, 0).is_empty());
    }
}
