//! Offline Signature Verification Library
//!
//! Decides whether a scanned signature is genuine or forged by comparing it
//! with a handful of genuine reference signatures of the same writer.
//!
//! ## Pipeline
//!
//! 1. **Canonicalisation** (`image::preprocess`)
//!    - Grayscale, histogram equalisation, ink inversion, crop to the ink
//!      bounding box, aspect-preserving resize onto a 300x150 canvas, median filter
//!
//! 2. **Projection features** (`features::projection`)
//!    - Discrete Radon transform at 12 angles over [0°, 180°)
//!    - Per-angle column profiles concatenated into one feature vector
//!
//! 3. **Shape-aware DTW** (`dtw`)
//!    - Every sample is described by its `2w + 1` neighbourhood (`dtw::descriptor`)
//!    - Dynamic time warping over descriptor distances (`dtw::aligner`)
//!
//! 4. **Scoring and decision** (`scoring`)
//!    - Training score: mean pairwise distance among the genuine references
//!    - Verification score: mean distance from the query to every reference
//!    - `Genuine` iff `verification / training <= threshold` (1.15 by default)
//!
//! ## Example
//!
//! ```no_run
//! use signature_verification::{SignatureVerifier, VerifierConfig};
//!
//! # fn main() -> signature_verification::Result<()> {
//! let verifier = SignatureVerifier::new(VerifierConfig::default())?;
//! let outcome = verifier.train_from_paths(&["ref1.png", "ref2.png", "ref3.png"])?;
//! let decision = verifier.verify_path(&outcome.context, "query.png")?;
//! println!("{decision}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dtw;
pub mod error;
pub mod features;
pub mod image;
pub mod scoring;
pub mod verifier;

pub use config::VerifierConfig;
pub use dtw::{DistanceResult, PointMetric, ShapeDescriptor, ShapeDescriptorKind, ShapeDtw, WarpingPath};
pub use error::{Result, SignatureError};
pub use features::{FeatureVector, NormalizationPolicy, Normalizer, ProjectionExtractor};
pub use crate::image::{ImageData, PreprocessConfig, PreprocessedImage, Preprocessor, SyntheticStroke};
pub use scoring::{Decision, Label, ScoreAggregator};
pub use verifier::{SampleFailure, SignatureVerifier, TrainingContext, TrainingOutcome};
