//! Training and verification scores.
//!
//! Every pair (training) and every reference (verification) is aligned
//! independently. With the `rayon` feature the alignments run on the rayon
//! pool; distances are always collected in index order and summed
//! sequentially, so the scores do not depend on scheduling.

use crate::dtw::ShapeDtw;
use crate::error::{Result, SignatureError};
use crate::features::{FeatureVector, NormalizationPolicy, Normalizer};
use log::debug;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    aligner: ShapeDtw,
    normalization: NormalizationPolicy,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel: bool,
}

impl ScoreAggregator {
    pub fn new(aligner: ShapeDtw, normalization: NormalizationPolicy) -> Self {
        Self {
            aligner,
            normalization,
            parallel: true,
        }
    }

    /// Toggle the rayon pool (no effect without the `rayon` feature).
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn aligner(&self) -> &ShapeDtw {
        &self.aligner
    }

    pub fn normalization(&self) -> NormalizationPolicy {
        self.normalization
    }

    /// Fit the normalizer on `genuine` and normalize every reference with it.
    pub fn fit_references(&self, genuine: &[FeatureVector]) -> Result<(Normalizer, Vec<FeatureVector>)> {
        let normalizer = Normalizer::fit(self.normalization, genuine)?;
        let normalized = normalizer.apply_all(genuine)?;
        Ok((normalizer, normalized))
    }

    /// Mean shape-DTW distance over all unordered pairs of genuine signatures.
    pub fn compute_training_score(&self, genuine: &[FeatureVector]) -> Result<f64> {
        if genuine.len() < 2 {
            return Err(SignatureError::InsufficientData {
                required: 2,
                available: genuine.len(),
            });
        }
        let (_, normalized) = self.fit_references(genuine)?;
        self.mean_pairwise_distance(&normalized)
    }

    /// Mean shape-DTW distance from `query` to every genuine signature.
    pub fn compute_verification_score(&self, query: &FeatureVector, genuine: &[FeatureVector]) -> Result<f64> {
        if genuine.is_empty() {
            return Err(SignatureError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        let (normalizer, normalized) = self.fit_references(genuine)?;
        let query = normalizer.apply(query)?;
        self.mean_distance_to(&query, &normalized)
    }

    /// Mean pairwise distance over already-normalized vectors.
    pub fn mean_pairwise_distance(&self, normalized: &[FeatureVector]) -> Result<f64> {
        let k = normalized.len();
        if k < 2 {
            return Err(SignatureError::InsufficientData {
                required: 2,
                available: k,
            });
        }

        let pairs: Vec<(usize, usize)> = (0..k)
            .flat_map(|i| (i + 1..k).map(move |j| (i, j)))
            .collect();
        let distances = self.map_distances(&pairs, |&(i, j)| {
            self.aligner.distance(normalized[i].as_slice(), normalized[j].as_slice())
        })?;

        let mean = mean(&distances);
        debug!("mean pairwise distance over {} pairs: {:.6}", pairs.len(), mean);
        Ok(mean)
    }

    /// Mean distance from an already-normalized query to already-normalized references.
    pub fn mean_distance_to(&self, query: &FeatureVector, references: &[FeatureVector]) -> Result<f64> {
        if references.is_empty() {
            return Err(SignatureError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let distances = self.map_distances(references, |reference| {
            self.aligner.distance(query.as_slice(), reference.as_slice())
        })?;

        let mean = mean(&distances);
        debug!("mean distance to {} references: {:.6}", references.len(), mean);
        Ok(mean)
    }

    #[cfg(feature = "rayon")]
    fn map_distances<T, F>(&self, jobs: &[T], distance: F) -> Result<Vec<f64>>
    where
        T: Sync,
        F: Fn(&T) -> Result<f64> + Sync + Send,
    {
        if self.parallel {
            jobs.par_iter().map(distance).collect()
        } else {
            jobs.iter().map(distance).collect()
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn map_distances<T, F>(&self, jobs: &[T], distance: F) -> Result<Vec<f64>>
    where
        F: Fn(&T) -> Result<f64>,
    {
        jobs.iter().map(distance).collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
