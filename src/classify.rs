// classify.rs
//
// Equal-interval classification for the choropleth.

/// Regions with fewer features than this get one class less.
pub const SMALL_REGION_THRESHOLD: usize = 8;

/// Class count for a region: 4 for small samples, else 5.
pub fn class_count_for(feature_count: usize) -> usize {
    if feature_count < SMALL_REGION_THRESHOLD {
        4
    } else {
        5
    }
}

/// Break points of an equal-interval classification.
///
/// `breaks` has `class_count + 1` entries, starts at `min` and ends at `max`.
/// When every observed value is equal, `max` is `min + 1` so the range never
/// has zero width.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub min: f64,
    pub max: f64,
    pub class_count: usize,
    pub breaks: Vec<f64>,
}

impl Classification {
    /// Class of `value` against this classification's (already widened) range.
    pub fn class_index(&self, value: f64) -> usize {
        class_index_for(value, self.min, self.max, self.class_count)
    }

    /// Lower and upper bound of class `index`.
    pub fn class_range(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.breaks.get(index)?, *self.breaks.get(index + 1)?))
    }
}

/// Computes equal-interval breaks over the finite values in `values`.
///
/// Returns `None` when no finite value exists; callers render such a region
/// as "no data" instead of classifying it.
pub fn compute_breaks<I>(values: I, class_count: usize) -> Option<Classification>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let class_count = class_count.max(1);
    let (min, mut max) = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    if max == min {
        max = min + 1.0;
    }

    // Interpolate rather than step so `max - min` never has to be finite.
    let mut breaks: Vec<f64> = (0..class_count)
        .map(|i| {
            let t = i as f64 / class_count as f64;
            min * (1.0 - t) + max * t
        })
        .collect();
    // Pin the top to max exactly.
    breaks.push(max);

    Some(Classification {
        min,
        max,
        class_count,
        breaks,
    })
}

/// Maps `value` to a class in `0..class_count`.
///
/// `max` must be greater than `min`; widen it first when they are equal.
pub fn class_index_for(value: f64, min: f64, max: f64, class_count: usize) -> usize {
    if class_count == 0 || !value.is_finite() {
        return 0;
    }
    // Halved operands keep the span finite across the whole f64 range.
    let span = max / 2.0 - min / 2.0;
    if !span.is_finite() || span <= 0.0 {
        return 0;
    }
    let t = ((value / 2.0 - min / 2.0) / span).clamp(0.0, 1.0);
    ((t * class_count as f64).floor() as usize).min(class_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn breaks_span_min_to_max() {
        let values = [Some(0.2), None, Some(0.6), Some(f64::NAN), Some(1.0)];
        let c = compute_breaks(values, 4).unwrap();
        assert_eq!(c.breaks.len(), 5);
        assert_relative_eq!(c.breaks[0], 0.2);
        assert_relative_eq!(c.breaks[1], 0.4);
        assert_relative_eq!(c.breaks[2], 0.6);
        assert_eq!(c.breaks[4], 1.0);
        assert!(c.breaks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn constant_values_widen_by_one() {
        let c = compute_breaks([Some(3.0), Some(3.0)], 5).unwrap();
        assert_eq!(c.min, 3.0);
        assert_eq!(c.max, 4.0);
        assert_eq!(c.breaks.first(), Some(&3.0));
        assert_eq!(c.breaks.last(), Some(&4.0));
        assert_eq!(c.class_index(3.0), 0);
    }

    #[test]
    fn extreme_range_stays_ordered() {
        let (min, max) = (-1.7e308, 1.7e308);
        let c = compute_breaks([Some(min), Some(0.0), Some(max)], 5).unwrap();
        assert_eq!(c.breaks[0], min);
        assert_eq!(c.breaks[5], max);
        assert!(c.breaks.iter().all(|b| b.is_finite()));
        assert!(c.breaks.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(class_index_for(max, min, max, 5), 4);
        assert_eq!(class_index_for(min, min, max, 5), 0);
        assert_eq!(c.class_index(0.0), 2);
    }

    #[test]
    fn no_valid_values_means_no_classification() {
        assert!(compute_breaks([None, Some(f64::NAN)], 5).is_none());
        assert!(compute_breaks(Vec::<Option<f64>>::new(), 5).is_none());
    }

    #[test]
    fn max_lands_in_last_class() {
        for n in [4, 5] {
            assert_eq!(class_index_for(10.0, 0.0, 10.0, n), n - 1);
            assert_eq!(class_index_for(0.0, 0.0, 10.0, n), 0);
        }
        assert_eq!(class_index_for(4.99, 0.0, 10.0, 5), 2);
        assert_eq!(class_index_for(5.0, 0.0, 10.0, 4), 2);
    }

    #[test]
    fn indices_stay_in_range() {
        let (min, max) = (-2.5, 7.25);
        for n in [4, 5] {
            for i in 0..=200 {
                let v = min + (max - min) * i as f64 / 200.0;
                assert!(class_index_for(v, min, max, n) < n);
            }
            assert_eq!(class_index_for(-100.0, min, max, n), 0);
            assert_eq!(class_index_for(100.0, min, max, n), n - 1);
        }
    }

    #[test]
    fn class_count_policy() {
        assert_eq!(class_count_for(0), 4);
        assert_eq!(class_count_for(7), 4);
        assert_eq!(class_count_for(8), 5);
        assert_eq!(class_count_for(40), 5);
    }
}
