use signature_verification::image::{numbered_paths, NumberedImages};
use signature_verification::{
    ImageData, Label, PreprocessConfig, SignatureError, SignatureVerifier, SyntheticStroke, VerifierConfig,
};
use std::path::{Path, PathBuf};

fn small_config() -> VerifierConfig {
    VerifierConfig {
        angle_count: 6,
        subsequence_half_width: 4,
        preprocess: PreprocessConfig {
            canonical_width: 60,
            canonical_height: 30,
            ..PreprocessConfig::default()
        },
        ..VerifierConfig::default()
    }
}

/// Write a scan-like PNG: dark ink on white paper.
fn write_scan(path: &Path, width: u32, height: u32, stroke: SyntheticStroke) {
    let ink = ImageData::synthetic_signature(width, height, stroke);
    let paper = ImageData::new(ink.data.iter().map(|v| 1.0 - v).collect(), width, height).unwrap();
    paper.save_to_file(path).unwrap();
}

fn write_training_set(dir: &Path) -> Vec<PathBuf> {
    let sizes = [(120, 60), (132, 64), (110, 56)];
    for (i, &(w, h)) in sizes.iter().enumerate() {
        write_scan(&dir.join(format!("genuine{}.png", i + 1)), w, h, SyntheticStroke::Loop);
    }
    numbered_paths(&format!("{}/genuine", dir.display()), "png", sizes.len())
}

#[test]
fn features_from_files_are_deterministic_and_fixed_length() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_training_set(dir.path());
    let verifier = SignatureVerifier::new(small_config()).unwrap();

    let a = verifier.features_from_path(&paths[0]).unwrap();
    let b = verifier.features_from_path(&paths[0]).unwrap();
    let c = verifier.features_from_path(&paths[1]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), small_config().feature_len());
    assert_eq!(c.len(), a.len());

    let bytes = std::fs::read(&paths[0]).unwrap();
    assert_eq!(verifier.features_from_bytes(&bytes).unwrap(), a);
}

#[test]
fn training_skips_unreadable_and_blank_samples() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_training_set(dir.path());

    let corrupt = dir.path().join("corrupt.png");
    std::fs::write(&corrupt, b"definitely not a png").unwrap();
    let blank = dir.path().join("blank.png");
    ImageData::new(vec![1.0; 40 * 20], 40, 20).unwrap().save_to_file(&blank).unwrap();
    paths.insert(1, corrupt.clone());
    paths.push(blank.clone());
    paths.push(dir.path().join("missing.png"));

    let verifier = SignatureVerifier::new(small_config()).unwrap();
    let outcome = verifier.train_from_paths(&paths).unwrap();

    assert_eq!(outcome.context.genuine_features().len(), 3);
    let skipped: Vec<(usize, &Path)> = outcome.skipped.iter().map(|s| (s.index, s.path.as_path())).collect();
    assert_eq!(skipped.len(), 3);
    assert_eq!(skipped[0], (2, corrupt.as_path()));
    assert_eq!(skipped[1], (5, blank.as_path()));
    assert!(matches!(outcome.skipped[0].error, SignatureError::ImageLoad { .. }));
    assert!(matches!(outcome.skipped[1].error, SignatureError::DegenerateImage(_)));
    assert!(matches!(outcome.skipped[2].error, SignatureError::ImageLoad { .. }));
}

#[test]
fn training_aborts_when_too_few_samples_survive() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    write_scan(&good, 120, 60, SyntheticStroke::Loop);
    let paths = vec![good, dir.path().join("missing.png")];

    let verifier = SignatureVerifier::new(small_config()).unwrap();
    let err = verifier.train_from_paths(&paths).unwrap_err();
    assert!(matches!(err, SignatureError::InsufficientData { required: 2, available: 1 }));
}

#[test]
fn verifies_numbered_test_images() {
    let dir = tempfile::tempdir().unwrap();
    let training = write_training_set(dir.path());

    // test1 repeats a reference, test2 is a different signature
    std::fs::copy(&training[1], dir.path().join("test1.png")).unwrap();
    write_scan(&dir.path().join("test2.png"), 120, 60, SyntheticStroke::Zigzag);
    write_scan(&dir.path().join("test4.png"), 120, 60, SyntheticStroke::Zigzag);

    let verifier = SignatureVerifier::new(small_config()).unwrap();
    let ctx = verifier.train_from_paths(&training).unwrap().context;

    let decisions: Vec<_> = NumberedImages::new(format!("{}/test", dir.path().display()), "png")
        .map(|(index, path)| (index, verifier.verify_path(&ctx, &path).unwrap()))
        .collect();

    assert_eq!(decisions.len(), 2, "iteration stops at the missing test3.png");
    assert_eq!(decisions[0].1.label, Label::Genuine);
    assert!(decisions[0].1.score < 1.0);
    assert_eq!(decisions[1].1.label, Label::Forged);

    let line = decisions[1].1.to_string();
    let (score, label) = line.split_once(';').unwrap();
    assert_eq!(label, "Forged");
    assert_eq!(score.split_once('.').unwrap().1.len(), 4);
}

#[test]
fn unreadable_test_image_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let training = write_training_set(dir.path());
    std::fs::copy(&training[0], dir.path().join("test1.png")).unwrap();
    std::fs::write(dir.path().join("test2.png"), b"truncated upload").unwrap();
    ImageData::new(vec![1.0; 40 * 20], 40, 20)
        .unwrap()
        .save_to_file(dir.path().join("test3.png"))
        .unwrap();
    write_scan(&dir.path().join("test4.png"), 120, 60, SyntheticStroke::Zigzag);

    let verifier = SignatureVerifier::new(small_config()).unwrap();
    let ctx = verifier.train_from_paths(&training).unwrap().context;

    let mut decided = Vec::new();
    let mut skipped = Vec::new();
    for (index, path) in NumberedImages::new(format!("{}/test", dir.path().display()), "png") {
        match verifier.verify_path(&ctx, &path) {
            Ok(decision) => decided.push((index, decision.label)),
            Err(err) => skipped.push((index, err)),
        }
    }

    assert_eq!(decided, vec![(1, Label::Genuine), (4, Label::Forged)]);
    assert_eq!(skipped.len(), 2);
    assert!(matches!(skipped[0], (2, SignatureError::ImageLoad { .. })));
    assert!(matches!(skipped[1], (3, SignatureError::DegenerateImage(_))));
}
