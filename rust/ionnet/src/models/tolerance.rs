use serde::{
    Deserialize,
    Serialize,
};

use crate::utils::{
    OptionallyRestricted,
    TupleRange,
};
use OptionallyRestricted::{
    Restricted,
    Unrestricted,
};

/// Anything that can tell whether two masses are "the same".
pub trait MzToleranceCheck {
    fn check_within_tolerance(&self, a: f64, b: f64) -> bool;
}

/// Tolerance settings for matching rows and ion types.
///
/// Example:
/// ```
/// use ionnet::models::tolerance::Tolerance;
///
/// let tolerance = Tolerance::default();
/// assert!(tolerance.rt_range(5.0).to_option().is_some());
/// ```
///
/// Ranges are symmetric and defined with positive values: an absolute m/z
/// tolerance of 0.01 on 300.0 covers `[299.99, 300.01]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tolerance {
    pub ms: MzTolerance,
    #[serde(default)]
    pub rt: RtTolerance,
}

/// Symmetric m/z tolerance.
///
/// `AbsoluteOrPpm` takes the wider of the two windows at the given value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MzTolerance {
    #[serde(rename = "da")]
    Absolute(f64),
    #[serde(rename = "ppm")]
    Ppm(f64),
    #[serde(rename = "da_or_ppm")]
    AbsoluteOrPpm { da: f64, ppm: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub enum RtTolerance {
    #[serde(rename = "minutes")]
    Minutes(f32),
    #[serde(rename = "percent")]
    Pct(f32),
    #[default]
    Unrestricted,
}

impl Default for MzTolerance {
    fn default() -> Self {
        MzTolerance::AbsoluteOrPpm { da: 0.002, ppm: 5.0 }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            ms: MzTolerance::default(),
            rt: RtTolerance::Minutes(0.1),
        }
    }
}

impl MzTolerance {
    /// Half width of the window around `mz`.
    pub fn window(&self, mz: f64) -> f64 {
        match self {
            MzTolerance::Absolute(da) => da.abs(),
            MzTolerance::Ppm(ppm) => (mz * ppm / 1e6).abs(),
            MzTolerance::AbsoluteOrPpm { da, ppm } => da.abs().max((mz * ppm / 1e6).abs()),
        }
    }

    /// ```
    /// use ionnet::models::tolerance::MzTolerance;
    ///
    /// let tol = MzTolerance::Ppm(20.0);
    /// let range = tol.mz_range(500.0);
    /// // For 500 Da at 20 ppm: ±0.01 Da
    /// assert!((range.start() - 499.99).abs() < 1e-9);
    /// assert!((range.end() - 500.01).abs() < 1e-9);
    /// ```
    pub fn mz_range(&self, mz: f64) -> TupleRange<f64> {
        let window = self.window(mz);
        TupleRange::around(mz, window, window)
    }
}

impl MzToleranceCheck for MzTolerance {
    fn check_within_tolerance(&self, a: f64, b: f64) -> bool {
        self.mz_range(a).contains(b)
    }
}

impl RtTolerance {
    pub fn rt_range(&self, rt: f32) -> OptionallyRestricted<TupleRange<f32>> {
        match self {
            RtTolerance::Minutes(minutes) => Restricted(TupleRange::around(rt, *minutes, *minutes)),
            RtTolerance::Pct(pct) => {
                let width = rt * pct / 100.0;
                Restricted(TupleRange::around(rt, width, width))
            }
            RtTolerance::Unrestricted => Unrestricted,
        }
    }

    pub fn check_within_tolerance(&self, a: f32, b: f32) -> bool {
        self.rt_range(a).is_unrestricted_or(|r| r.contains(b))
    }
}

impl Tolerance {
    pub fn mz_range(&self, mz: f64) -> TupleRange<f64> {
        self.ms.mz_range(mz)
    }

    pub fn rt_range(&self, rt: f32) -> OptionallyRestricted<TupleRange<f32>> {
        self.rt.rt_range(rt)
    }
}

impl MzToleranceCheck for Tolerance {
    fn check_within_tolerance(&self, a: f64, b: f64) -> bool {
        self.ms.check_within_tolerance(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_or_ppm_takes_wider_window() {
        let tol = MzTolerance::AbsoluteOrPpm { da: 0.002, ppm: 5.0 };
        // 5 ppm of 100 is 0.0005, absolute wins
        assert!((tol.window(100.0) - 0.002).abs() < 1e-12);
        // 5 ppm of 1000 is 0.005, ppm wins
        assert!((tol.window(1000.0) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_check_within_tolerance() {
        let tol = MzTolerance::Absolute(0.001);
        assert!(tol.check_within_tolerance(299.092724, 299.092682));
        assert!(!tol.check_within_tolerance(299.0927, 299.0947));
    }

    #[test]
    fn test_rt_tolerance() {
        assert!(RtTolerance::Minutes(0.1).check_within_tolerance(5.0, 5.05));
        assert!(!RtTolerance::Minutes(0.1).check_within_tolerance(5.0, 5.5));
        assert!(RtTolerance::Unrestricted.check_within_tolerance(5.0, 50.0));
    }

    #[test]
    fn test_tolerance_json_layout() {
        let json = r#"{"ms": {"da_or_ppm": {"da": 0.002, "ppm": 5.0}}, "rt": {"minutes": 0.2}}"#;
        let tol: Tolerance = serde_json::from_str(json).unwrap();
        assert_eq!(tol.ms, MzTolerance::AbsoluteOrPpm { da: 0.002, ppm: 5.0 });
        assert_eq!(tol.rt, RtTolerance::Minutes(0.2));

        let no_rt: Tolerance = serde_json::from_str(r#"{"ms": {"ppm": 10.0}}"#).unwrap();
        assert_eq!(no_rt.rt, RtTolerance::Unrestricted);
    }
}
