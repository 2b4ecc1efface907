// src/verifier.rs

//! Training and verification entry points.
//!
//! `train` turns genuine feature vectors into an immutable [`TrainingContext`];
//! `verify` scores a query against a context passed in explicitly. Contexts
//! are plain values: they can be shared by reference across threads and any
//! number of independent contexts can coexist.

use crate::config::VerifierConfig;
use crate::dtw::ShapeDtw;
use crate::error::{Result, SignatureError};
use crate::features::{FeatureVector, Normalizer, ProjectionExtractor};
use crate::image::loader::ImageData;
use crate::image::preprocess::{PreprocessedImage, Preprocessor};
use crate::scoring::{decide, Decision, ScoreAggregator};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Immutable result of training on a set of genuine signatures.
#[derive(Debug, Clone)]
pub struct TrainingContext {
    training_score: f64,
    genuine: Vec<FeatureVector>,
    normalizer: Normalizer,
    config: VerifierConfig,
}

impl TrainingContext {
    /// Mean pairwise distance among the genuine references.
    pub fn training_score(&self) -> f64 {
        self.training_score
    }

    /// Normalized genuine references, in training order.
    pub fn genuine_features(&self) -> &[FeatureVector] {
        &self.genuine
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn feature_len(&self) -> usize {
        self.genuine.first().map_or(0, FeatureVector::len)
    }
}

/// A training sample that could not be turned into features.
#[derive(Debug)]
pub struct SampleFailure {
    /// 1-based position in the training list.
    pub index: usize,
    pub path: PathBuf,
    pub error: SignatureError,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub context: TrainingContext,
    pub skipped: Vec<SampleFailure>,
}

#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    config: VerifierConfig,
    preprocessor: Preprocessor,
    extractor: ProjectionExtractor,
    aggregator: ScoreAggregator,
}

impl SignatureVerifier {
    pub fn new(config: VerifierConfig) -> Result<Self> {
        config.validate()?;

        let preprocessor = Preprocessor::new(config.preprocess.clone())?;
        let extractor = ProjectionExtractor::new(config.angle_count)?
            .with_canonical_size(config.preprocess.canonical_width, config.preprocess.canonical_height);
        let aligner = ShapeDtw::new(config.descriptor, config.metric, config.subsequence_half_width)?
            .with_band(config.band)
            .with_max_sequence_len(config.max_sequence_len);
        let aggregator = ScoreAggregator::new(aligner, config.normalization);

        info!(
            "Signature verifier ready: {} angles, {} descriptor (w = {}), {} metric, {} normalization, threshold {}",
            config.angle_count,
            config.descriptor,
            config.subsequence_half_width,
            config.metric,
            config.normalization,
            config.decision_threshold
        );

        Ok(Self {
            config,
            preprocessor,
            extractor,
            aggregator,
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    pub fn preprocess(&self, image: &ImageData) -> Result<PreprocessedImage> {
        self.preprocessor.process(image)
    }

    pub fn features_from_preprocessed(&self, image: &PreprocessedImage) -> Result<FeatureVector> {
        self.extractor.extract(image)
    }

    /// Preprocess a decoded image and extract its projection features.
    pub fn extract_features(&self, image: &ImageData) -> Result<FeatureVector> {
        let canonical = self.preprocess(image)?;
        self.features_from_preprocessed(&canonical)
    }

    pub fn features_from_path<P: AsRef<Path>>(&self, path: P) -> Result<FeatureVector> {
        let image = ImageData::from_file(path.as_ref())?;
        self.extract_features(&image)
    }

    pub fn features_from_bytes(&self, bytes: &[u8]) -> Result<FeatureVector> {
        let image = ImageData::from_bytes(bytes)?;
        self.extract_features(&image)
    }

    /// Build a training context from genuine feature vectors.
    pub fn train(&self, genuine: &[FeatureVector]) -> Result<TrainingContext> {
        if genuine.len() < 2 {
            return Err(SignatureError::InsufficientData {
                required: 2,
                available: genuine.len(),
            });
        }
        let feature_len = genuine[0].len();
        if let Some((i, v)) = genuine.iter().enumerate().find(|(_, v)| v.len() != feature_len) {
            return Err(SignatureError::InvalidInput(format!(
                "genuine feature vector {} has {} values, expected {}",
                i,
                v.len(),
                feature_len
            )));
        }

        let (normalizer, normalized) = self.aggregator.fit_references(genuine)?;
        let training_score = self.aggregator.mean_pairwise_distance(&normalized)?;
        info!(
            "Trained on {} genuine signatures ({} features each), training score {:.6}",
            normalized.len(),
            feature_len,
            training_score
        );

        Ok(TrainingContext {
            training_score,
            genuine: normalized,
            normalizer,
            config: self.config.clone(),
        })
    }

    /// Train from image files, skipping samples that fail to load or process.
    pub fn train_from_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<TrainingOutcome> {
        let mut features = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for (offset, path) in paths.iter().enumerate() {
            let index = offset + 1;
            let path = path.as_ref();
            match self.features_from_path(path) {
                Ok(feature) => {
                    debug!("training sample {} ({}) extracted", index, path.display());
                    features.push(feature);
                }
                Err(error) => {
                    warn!("Skipping training sample {} ({}): {}", index, path.display(), error);
                    skipped.push(SampleFailure {
                        index,
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }

        if features.len() < 2 {
            return Err(SignatureError::InsufficientData {
                required: 2,
                available: features.len(),
            });
        }

        let context = self.train(&features)?;
        Ok(TrainingOutcome { context, skipped })
    }

    /// Score `query` against `context` and classify it.
    pub fn verify(&self, context: &TrainingContext, query: &FeatureVector) -> Result<Decision> {
        if context.config != self.config {
            return Err(SignatureError::Configuration(
                "training context was built under a different configuration".to_string(),
            ));
        }
        if query.len() != context.feature_len() {
            return Err(SignatureError::InvalidInput(format!(
                "query has {} features, references have {}",
                query.len(),
                context.feature_len()
            )));
        }

        let query = context.normalizer.apply(query)?;
        let verification_score = self.aggregator.mean_distance_to(&query, &context.genuine)?;
        let decision = decide(verification_score, context.training_score, self.config.decision_threshold)?;
        debug!(
            "verification score {:.6} / training score {:.6} -> {}",
            verification_score, context.training_score, decision
        );
        Ok(decision)
    }

    pub fn verify_path<P: AsRef<Path>>(&self, context: &TrainingContext, path: P) -> Result<Decision> {
        let query = self.features_from_path(path)?;
        self.verify(context, &query)
    }
}
