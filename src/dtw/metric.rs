use crate::error::{Result, SignatureError};
use std::fmt;
use std::str::FromStr;

/// Distance between two descriptor vectors of equal length.
///
/// Every variant is symmetric and non-negative, which is what makes the
/// resulting DTW distance symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointMetric {
    #[default]
    Euclidean,
    SquaredEuclidean,
    /// Sum of absolute differences (city block).
    Manhattan,
    Chebyshev,
}

impl PointMetric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "sqeuclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
        }
    }

    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        let diffs = a.iter().zip(b).map(|(x, y)| x - y);
        match self {
            Self::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Self::SquaredEuclidean => diffs.map(|d| d * d).sum(),
            Self::Manhattan => diffs.map(f64::abs).sum(),
            Self::Chebyshev => diffs.map(f64::abs).fold(0.0, f64::max),
        }
    }
}

impl fmt::Display for PointMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PointMetric {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "sqeuclidean" => Ok(Self::SquaredEuclidean),
            "manhattan" | "cityblock" => Ok(Self::Manhattan),
            "chebyshev" => Ok(Self::Chebyshev),
            other => Err(SignatureError::Configuration(format!("unsupported point metric: {other}"))),
        }
    }
}
