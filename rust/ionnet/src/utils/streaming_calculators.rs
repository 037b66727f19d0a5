use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamingAggregatorError {
    NotEnoughData,
}

type Result<T> = std::result::Result<T, StreamingAggregatorError>;

/// Weighted running mean with the observed extremes.
///
/// Starts empty; every value is folded in with [`RunningStatsCalculator::add`],
/// so the mean of unit-weight values equals their arithmetic mean up to
/// floating point rounding.
///
/// # Example
///
/// ```
/// use ionnet::utils::streaming_calculators::RunningStatsCalculator;
///
/// let mut calc = RunningStatsCalculator::default();
/// assert!(calc.mean().is_err());
/// for v in [0.0, 10.0, 0.0, 10.0] {
///     calc.add(1.0, v);
/// }
/// assert_eq!(calc.mean().unwrap(), 5.0);
/// assert_eq!(calc.max().unwrap(), 10.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStatsCalculator {
    weight: f64,
    mean_n: f64,
    min: f64,
    max: f64,
}

impl RunningStatsCalculator {
    /// Add a new value to the running stats calculator.
    ///
    /// Values with a non-positive weight are ignored.
    pub fn add(&mut self, weight: f64, value: f64) {
        if weight <= 0. {
            return;
        }
        if self.weight == 0. {
            self.weight = weight;
            self.mean_n = value;
            self.min = value;
            self.max = value;
            return;
        }

        self.weight += weight;
        let delta = value - self.mean_n;
        self.mean_n += delta * (weight / self.weight);

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        // Rounding can push the mean a hair outside the observed values.
        self.mean_n = self.mean_n.min(self.max).max(self.min);
    }

    pub fn mean(&self) -> Result<f64> {
        if self.weight == 0. {
            return Err(StreamingAggregatorError::NotEnoughData);
        }
        Ok(self.mean_n)
    }

    pub fn min(&self) -> Result<f64> {
        if self.weight == 0. {
            return Err(StreamingAggregatorError::NotEnoughData);
        }
        Ok(self.min)
    }

    pub fn max(&self) -> Result<f64> {
        if self.weight == 0. {
            return Err(StreamingAggregatorError::NotEnoughData);
        }
        Ok(self.max)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl AddAssign for RunningStatsCalculator {
    fn add_assign(&mut self, other: Self) {
        if other.weight == 0. {
            return;
        }
        let (min, max) = (other.min, other.max);
        self.add(other.weight, other.mean_n);
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anscombe's quartet, both sets have a real mean of 7.5
    const ANSCOMBE_3: [f64; 11] = [
        7.46, 6.77, 12.74, 7.11, 7.81, 8.84, 6.08, 5.39, 8.15, 6.42, 5.73,
    ];
    const ANSCOMBE_4: [f64; 11] = [
        6.58, 5.76, 7.71, 8.84, 8.47, 7.04, 5.25, 12.5, 5.56, 7.91, 6.89,
    ];

    #[test]
    fn test_running_stats_calculator_anscombe() {
        for data in [ANSCOMBE_3, ANSCOMBE_4] {
            let mut calc = RunningStatsCalculator::default();
            for val in data.iter() {
                calc.add(1., *val);
            }
            let expected = data.iter().sum::<f64>() / data.len() as f64;
            assert!((calc.mean().unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weighted_mean() {
        let mut calc = RunningStatsCalculator::default();
        calc.add(3., 1.0);
        calc.add(1., 5.0);
        assert!((calc.mean().unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(calc.min().unwrap(), 1.0);
        assert_eq!(calc.weight(), 4.0);
    }

    #[test]
    fn test_add_assign_merges() {
        let mut a = RunningStatsCalculator::default();
        a.add(1., 1.0);
        let mut b = RunningStatsCalculator::default();
        b.add(1., 3.0);
        b.add(1., 5.0);
        a += b;
        assert!((a.mean().unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(a.max().unwrap(), 5.0);
    }
}
