use crate::dtw::aligner::{DEFAULT_MAX_SEQUENCE_LEN, DEFAULT_SUBSEQUENCE_HALF_WIDTH};
use crate::dtw::descriptor::MAX_WINDOW_LEN;
use crate::dtw::{PointMetric, ShapeDescriptorKind};
use crate::error::{Result, SignatureError};
use crate::features::{NormalizationPolicy, ProjectionExtractor, DEFAULT_ANGLE_COUNT};
use crate::image::PreprocessConfig;
use crate::scoring::decision::{validate_threshold, DEFAULT_DECISION_THRESHOLD};

/// Every tunable of the verification pipeline.
///
/// The whole configuration is validated once, when a
/// [`SignatureVerifier`](crate::SignatureVerifier) is built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    /// Number of projection angles, evenly spaced over [0°, 180°).
    pub angle_count: usize,
    /// Half-width `w` of the `2w + 1` shape descriptor window.
    pub subsequence_half_width: usize,
    pub descriptor: ShapeDescriptorKind,
    pub metric: PointMetric,
    /// Ratios at or below this value are classified genuine.
    pub decision_threshold: f64,
    pub normalization: NormalizationPolicy,
    /// Optional Sakoe-Chiba band radius for the alignment.
    pub band: Option<usize>,
    /// Longest feature vector the aligner accepts.
    pub max_sequence_len: usize,
    pub preprocess: PreprocessConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            angle_count: DEFAULT_ANGLE_COUNT,
            subsequence_half_width: DEFAULT_SUBSEQUENCE_HALF_WIDTH,
            descriptor: ShapeDescriptorKind::Raw,
            metric: PointMetric::Euclidean,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            normalization: NormalizationPolicy::PerVectorL2,
            band: None,
            max_sequence_len: DEFAULT_MAX_SEQUENCE_LEN,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.angle_count == 0 {
            return Err(SignatureError::Configuration(
                "angle count must be at least 1".to_string(),
            ));
        }
        if self.max_sequence_len == 0 {
            return Err(SignatureError::Configuration(
                "maximum sequence length must be at least 1".to_string(),
            ));
        }
        let window_len = self
            .subsequence_half_width
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(1));
        match window_len {
            Some(window_len) if window_len <= self.max_sequence_len.min(MAX_WINDOW_LEN) => {}
            _ => {
                return Err(SignatureError::Configuration(format!(
                    "half-width {} gives a descriptor window above the {} sample limit",
                    self.subsequence_half_width,
                    self.max_sequence_len.min(MAX_WINDOW_LEN)
                )));
            }
        }
        self.descriptor.validate()?;
        validate_threshold(self.decision_threshold)?;
        self.preprocess.validate()?;

        let feature_len = self.feature_len();
        if feature_len > self.max_sequence_len {
            return Err(SignatureError::Configuration(format!(
                "{} angles on a {}x{} canvas give {} features, above the {} sample limit",
                self.angle_count,
                self.preprocess.canonical_width,
                self.preprocess.canonical_height,
                feature_len,
                self.max_sequence_len
            )));
        }
        Ok(())
    }

    /// Length of the feature vector of a canonical image.
    pub fn feature_len(&self) -> usize {
        self.angle_count
            * ProjectionExtractor::projection_len(self.preprocess.canonical_width, self.preprocess.canonical_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = VerifierConfig::default();
        config.validate().unwrap();
        assert_eq!(config.angle_count, 12);
        assert_eq!(config.subsequence_half_width, 15);
        assert_eq!(config.decision_threshold, 1.15);
        assert_eq!(config.feature_len(), 12 * 425);
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let cases = [
            VerifierConfig { angle_count: 0, ..VerifierConfig::default() },
            VerifierConfig { decision_threshold: -1.0, ..VerifierConfig::default() },
            VerifierConfig { descriptor: ShapeDescriptorKind::Dwt { levels: 0 }, ..VerifierConfig::default() },
            VerifierConfig { max_sequence_len: 1000, ..VerifierConfig::default() },
            VerifierConfig { subsequence_half_width: usize::MAX / 2, ..VerifierConfig::default() },
            VerifierConfig { subsequence_half_width: usize::MAX, ..VerifierConfig::default() },
            VerifierConfig { subsequence_half_width: 8192, ..VerifierConfig::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SignatureError::Configuration(_))),
                "{config:?}"
            );
        }
    }
}
