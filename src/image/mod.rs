pub mod loader;
pub mod preprocess;
pub mod sequence;

use std::path::Path;

/// Configuration for debug output of intermediate images
#[derive(Debug, Clone, Default)]
pub struct DebugOutputConfig {
    /// Whether debug output should be saved
    pub enabled: bool,
    /// Base directory for saving debug output
    pub output_dir: Option<String>,
}

/// Save an intermediate image (for instance a preprocessed signature) when enabled.
pub fn save_debug_output<P: AsRef<Path>>(
    image: &ImageData,
    filename: P,
    stage: &str,
    config: &DebugOutputConfig,
) -> crate::error::Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let path = match config.output_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)?;
            Path::new(dir).join(filename.as_ref())
        }
        None => filename.as_ref().to_path_buf(),
    };

    image.save_to_file(&path)?;
    log::info!(
        "Debug output saved: {} ({}x{}, stage: {})",
        path.display(),
        image.width,
        image.height,
        stage
    );

    Ok(())
}

pub use loader::{ImageData, SyntheticStroke};
pub use preprocess::{PreprocessConfig, PreprocessedImage, Preprocessor};
pub use sequence::{numbered_paths, NumberedImages};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_debug_output_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let img = ImageData::synthetic_signature(20, 10, SyntheticStroke::Wave);
        let config = DebugOutputConfig {
            enabled: false,
            output_dir: Some(dir.path().display().to_string()),
        };
        save_debug_output(&img, "out.png", "test", &config).unwrap();
        assert!(!dir.path().join("out.png").exists());
    }

    #[test]
    fn enabled_debug_output_round_trips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let img = ImageData::synthetic_signature(20, 10, SyntheticStroke::Zigzag);
        let config = DebugOutputConfig {
            enabled: true,
            output_dir: Some(dir.path().join("nested").display().to_string()),
        };
        save_debug_output(&img, "out.png", "test", &config).unwrap();

        let reloaded = ImageData::from_file(dir.path().join("nested/out.png")).unwrap();
        assert_eq!(reloaded, img);
    }
}
