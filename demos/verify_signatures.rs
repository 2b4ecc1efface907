//! Batch driver: train on numbered genuine signatures, then verify every
//! numbered test signature until the first missing file.
//!
//! ```bash
//! cargo run --release --example verify_signatures -- \
//!     --train-prefix data/writer1/genuine --train-count 6 \
//!     --test-prefix data/writer1/test
//! ```
//!
//! Each test image produces one line: `{score};{Genuine|Forged}`. Test images
//! that cannot be read or hold no ink are reported on stderr and skipped.

use clap::Parser;
use signature_verification::image::{numbered_paths, save_debug_output, DebugOutputConfig, NumberedImages};
use signature_verification::{
    Decision, ImageData, NormalizationPolicy, PointMetric, ShapeDescriptorKind, SignatureVerifier,
    TrainingContext, VerifierConfig,
};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(about = "Verify signatures against numbered genuine references")]
struct Args {
    /// Path prefix of the genuine references, `{prefix}{i}.{ext}`
    #[arg(long)]
    train_prefix: String,

    /// Number of genuine references, read from index 1
    #[arg(long, default_value_t = 6)]
    train_count: usize,

    /// Path prefix of the signatures to verify
    #[arg(long)]
    test_prefix: String,

    #[arg(long, default_value = "png")]
    ext: String,

    #[arg(long, default_value_t = 1.15)]
    threshold: f64,

    #[arg(long, default_value_t = 12)]
    angles: usize,

    #[arg(long, default_value_t = 15)]
    half_width: usize,

    /// raw, paa, dwt, slope or derivative
    #[arg(long, default_value = "raw")]
    descriptor: ShapeDescriptorKind,

    /// euclidean, sqeuclidean, manhattan or chebyshev
    #[arg(long, default_value = "euclidean")]
    metric: PointMetric,

    /// per-vector-l2 or batch-min-max
    #[arg(long, default_value = "per-vector-l2")]
    normalization: NormalizationPolicy,

    /// Sakoe-Chiba band radius
    #[arg(long)]
    band: Option<usize>,

    /// Save every preprocessed test signature into this directory
    #[arg(long)]
    dump_dir: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = VerifierConfig {
        angle_count: args.angles,
        subsequence_half_width: args.half_width,
        descriptor: args.descriptor,
        metric: args.metric,
        decision_threshold: args.threshold,
        normalization: args.normalization,
        band: args.band,
        ..VerifierConfig::default()
    };
    let verifier = SignatureVerifier::new(config)?;
    let debug_output = DebugOutputConfig {
        enabled: args.dump_dir.is_some(),
        output_dir: args.dump_dir.clone(),
    };

    let start_time = Instant::now();
    let outcome = verifier.train_from_paths(&numbered_paths(&args.train_prefix, &args.ext, args.train_count))?;
    for failure in &outcome.skipped {
        eprintln!("skipped reference {} ({}): {}", failure.index, failure.path.display(), failure.error);
    }
    eprintln!(
        "training score {:.6} from {} references in {:.2?}",
        outcome.context.training_score(),
        outcome.context.genuine_features().len(),
        start_time.elapsed()
    );

    for (index, path) in NumberedImages::new(args.test_prefix.as_str(), args.ext.as_str()) {
        match verify_one(&verifier, &outcome.context, &path, index, &debug_output) {
            Ok(decision) => println!("{decision}"),
            Err(err) => eprintln!("skipped test signature {} ({}): {}", index, path.display(), err),
        }
    }

    Ok(())
}

fn verify_one(
    verifier: &SignatureVerifier,
    context: &TrainingContext,
    path: &Path,
    index: usize,
    debug_output: &DebugOutputConfig,
) -> signature_verification::Result<Decision> {
    let image = ImageData::from_file(path)?;
    let canonical = verifier.preprocess(&image)?;
    save_debug_output(&canonical, format!("test{index}.png"), "preprocessed", debug_output)?;

    let features = verifier.features_from_preprocessed(&canonical)?;
    verifier.verify(context, &features)
}
