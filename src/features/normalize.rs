//! Feature normalization.
//!
//! A [`Normalizer`] is fitted once on the genuine reference set and then
//! applied unchanged to every reference and every query, so training and
//! verification always see the same scaling.

use crate::error::{Result, SignatureError};
use crate::features::FeatureVector;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationPolicy {
    /// Scale each vector to unit L2 norm.
    #[default]
    PerVectorL2,
    /// Scale with the global `(min, max)` of the genuine reference set.
    BatchMinMax,
}

impl NormalizationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PerVectorL2 => "per-vector-l2",
            Self::BatchMinMax => "batch-min-max",
        }
    }
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NormalizationPolicy {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-vector-l2" | "l2" | "pervectorl2" => Ok(Self::PerVectorL2),
            "batch-min-max" | "minmax" | "min-max" | "batchminmax" => Ok(Self::BatchMinMax),
            other => Err(SignatureError::Configuration(format!(
                "unsupported normalization policy: {other}"
            ))),
        }
    }
}

/// A normalization policy with its fitted parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalizer {
    L2,
    MinMax { min: f64, max: f64 },
}

impl Normalizer {
    /// Fit `policy` on the genuine reference set.
    pub fn fit(policy: NormalizationPolicy, references: &[FeatureVector]) -> Result<Self> {
        match policy {
            NormalizationPolicy::PerVectorL2 => Ok(Self::L2),
            NormalizationPolicy::BatchMinMax => {
                let (min, max) = references
                    .iter()
                    .flat_map(|v| v.as_slice().iter().copied())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

                if !min.is_finite() || !max.is_finite() {
                    return Err(SignatureError::InsufficientData { required: 1, available: 0 });
                }
                if max <= min {
                    return Err(SignatureError::InvalidInput(format!(
                        "reference features are constant ({min}), min-max scaling is undefined"
                    )));
                }
                Ok(Self::MinMax { min, max })
            }
        }
    }

    pub fn policy(&self) -> NormalizationPolicy {
        match self {
            Self::L2 => NormalizationPolicy::PerVectorL2,
            Self::MinMax { .. } => NormalizationPolicy::BatchMinMax,
        }
    }

    pub fn apply(&self, vector: &FeatureVector) -> Result<FeatureVector> {
        if vector.is_empty() {
            return Err(SignatureError::InvalidInput("feature vector is empty".to_string()));
        }

        let values = match *self {
            Self::L2 => {
                let norm = vector.l2_norm();
                if norm == 0.0 || !norm.is_finite() {
                    return Err(SignatureError::InvalidInput(format!(
                        "cannot L2-normalize a vector with norm {norm}"
                    )));
                }
                vector.as_slice().iter().map(|v| v / norm).collect()
            }
            Self::MinMax { min, max } => {
                let range = max - min;
                vector.as_slice().iter().map(|v| (v - min) / range).collect()
            }
        };

        Ok(FeatureVector::new(values))
    }

    pub fn apply_all(&self, vectors: &[FeatureVector]) -> Result<Vec<FeatureVector>> {
        vectors.iter().map(|v| self.apply(v)).collect()
    }
}
