//! Canonicalisation of scanned signatures.
//!
//! Steps, in order: ink inversion (so ink is bright and paper is 0),
//! background suppression, crop to the ink bounding box, optional histogram
//! equalisation of the ink pixels, aspect-preserving resize into the
//! canonical canvas with centred zero padding, optional 3x3 median filter.
//!
//! The ink mask is taken from the raw intensities: equalising first would
//! stretch faint paper noise above the ink threshold.

use crate::error::{Result, SignatureError};
use crate::image::loader::ImageData;
use image::imageops::{self, FilterType};
use image::GrayImage;
use log::debug;

pub const CANONICAL_WIDTH: u32 = 300;
pub const CANONICAL_HEIGHT: u32 = 150;
pub const DEFAULT_INK_THRESHOLD: f32 = 0.1;

/// Canonical image handed to the feature extractor: bright ink on a zero
/// background at the canonical canvas size.
pub type PreprocessedImage = ImageData;

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub canonical_width: u32,
    pub canonical_height: u32,
    /// Histogram equalisation of the cropped ink; the background stays 0.
    pub enhance_contrast: bool,
    /// 3x3 median filter on the final canvas.
    pub median_filter: bool,
    /// Scans carry dark ink on light paper and must be inverted.
    pub ink_is_dark: bool,
    /// Intensities at or below this (after inversion) count as background.
    pub ink_threshold: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            canonical_width: CANONICAL_WIDTH,
            canonical_height: CANONICAL_HEIGHT,
            enhance_contrast: true,
            median_filter: true,
            ink_is_dark: true,
            ink_threshold: DEFAULT_INK_THRESHOLD,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(SignatureError::Configuration(format!(
                "canonical size must be non-zero, got {}x{}",
                self.canonical_width, self.canonical_height
            )));
        }
        if !(0.0..1.0).contains(&self.ink_threshold) {
            return Err(SignatureError::Configuration(format!(
                "ink threshold must lie in [0, 1), got {}",
                self.ink_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn process(&self, image: &ImageData) -> Result<PreprocessedImage> {
        if image.width == 0 || image.height == 0 {
            return Err(SignatureError::DegenerateImage("image has no pixels".to_string()));
        }

        let mut gray = image.to_gray_image();
        if self.config.ink_is_dark {
            imageops::invert(&mut gray);
        }

        let threshold = (self.config.ink_threshold * 255.0).round() as u8;
        for pixel in gray.pixels_mut() {
            if pixel[0] <= threshold {
                pixel[0] = 0;
            }
        }

        let (x0, y0, x1, y1) = ink_bounds(&gray).ok_or_else(|| {
            SignatureError::DegenerateImage("no ink left after background suppression".to_string())
        })?;
        let mut cropped = imageops::crop_imm(&gray, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image();
        if self.config.enhance_contrast {
            cropped = equalize_ink(&cropped);
        }
        debug!(
            "cropped {}x{} signature to {}x{} at ({}, {})",
            image.width,
            image.height,
            cropped.width(),
            cropped.height(),
            x0,
            y0
        );

        let mut canvas = self.fit_to_canvas(&cropped);
        if self.config.median_filter {
            canvas = imageproc::filter::median_filter(&canvas, 1, 1);
        }

        let processed = ImageData::from_gray_image(&canvas);
        if processed.total_intensity() == 0.0 {
            return Err(SignatureError::DegenerateImage(
                "strokes vanished during resizing or filtering".to_string(),
            ));
        }
        Ok(processed)
    }

    /// Resize preserving the aspect ratio and centre on a zero canvas.
    fn fit_to_canvas(&self, cropped: &GrayImage) -> GrayImage {
        let (target_w, target_h) = (self.config.canonical_width, self.config.canonical_height);
        let (w, h) = cropped.dimensions();
        let scale = (target_w as f64 / w as f64).min(target_h as f64 / h as f64);
        let new_w = ((w as f64 * scale) as u32).clamp(1, target_w);
        let new_h = ((h as f64 * scale) as u32).clamp(1, target_h);

        let resized = imageops::resize(cropped, new_w, new_h, FilterType::Triangle);
        let mut canvas = GrayImage::new(target_w, target_h);
        let left = (target_w - new_w) / 2;
        let top = (target_h - new_h) / 2;
        imageops::overlay(&mut canvas, &resized, left as i64, top as i64);
        canvas
    }
}

/// Equalise the histogram while keeping every background pixel at 0 and
/// every ink pixel non-zero.
fn equalize_ink(cropped: &GrayImage) -> GrayImage {
    let mut equalized = imageproc::contrast::equalize_histogram(cropped);
    for (out, ink) in equalized.pixels_mut().zip(cropped.pixels()) {
        out[0] = if ink[0] == 0 { 0 } else { out[0].max(1) };
    }
    equalized
}

/// Inclusive bounding box `(x0, y0, x1, y1)` of non-zero pixels.
fn ink_bounds(gray: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    gray.enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .fold(None, |bounds, (x, y, _)| match bounds {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}
