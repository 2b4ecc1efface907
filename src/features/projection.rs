// src/features/projection.rs

//! Directional projection (discrete Radon transform) features.
//!
//! The image is treated as zero-padded and centred in a square of side
//! `S = ceil(sqrt(2) * max(width, height))`, so no ink leaves the frame under
//! rotation. For every angle the square is rotated about its centre with
//! bilinear interpolation and each column is summed, giving one profile of
//! length `S`. Profiles are concatenated in angle order.

use crate::error::{Result, SignatureError};
use crate::features::FeatureVector;
use crate::image::loader::ImageData;
use log::debug;

pub const DEFAULT_ANGLE_COUNT: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionExtractor {
    angles_deg: Vec<f64>,
    canonical_size: Option<(u32, u32)>,
}

impl ProjectionExtractor {
    /// `angle_count` angles evenly spaced over [0°, 180°).
    pub fn new(angle_count: usize) -> Result<Self> {
        if angle_count == 0 {
            return Err(SignatureError::Configuration(
                "at least one projection angle is required".to_string(),
            ));
        }
        let angles = (0..angle_count)
            .map(|k| 180.0 * k as f64 / angle_count as f64)
            .collect();
        Self::with_angles(angles)
    }

    /// Explicit projection angles in degrees, used in the given order.
    pub fn with_angles(angles_deg: Vec<f64>) -> Result<Self> {
        if angles_deg.is_empty() {
            return Err(SignatureError::Configuration(
                "at least one projection angle is required".to_string(),
            ));
        }
        if let Some(bad) = angles_deg.iter().find(|a| !a.is_finite()) {
            return Err(SignatureError::Configuration(format!("projection angle {bad} is not finite")));
        }
        Ok(Self {
            angles_deg,
            canonical_size: None,
        })
    }

    /// Reject images whose size differs from `(width, height)`.
    pub fn with_canonical_size(mut self, width: u32, height: u32) -> Self {
        self.canonical_size = Some((width, height));
        self
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles_deg
    }

    /// Length of one per-angle profile for a `width` x `height` image.
    pub fn projection_len(width: u32, height: u32) -> usize {
        (std::f64::consts::SQRT_2 * width.max(height) as f64).ceil() as usize
    }

    pub fn feature_len(&self, width: u32, height: u32) -> usize {
        self.angles_deg.len() * Self::projection_len(width, height)
    }

    pub fn extract(&self, image: &ImageData) -> Result<FeatureVector> {
        if let Some((w, h)) = self.canonical_size {
            if (image.width, image.height) != (w, h) {
                return Err(SignatureError::InvalidInput(format!(
                    "expected a {}x{} preprocessed image, got {}x{}",
                    w, h, image.width, image.height
                )));
            }
        }
        if image.width == 0 || image.height == 0 {
            return Err(SignatureError::DegenerateImage("image has no pixels".to_string()));
        }
        if image.data.len() != image.width as usize * image.height as usize {
            return Err(SignatureError::InvalidInput(format!(
                "{} pixels do not fill a {}x{} image",
                image.data.len(),
                image.width,
                image.height
            )));
        }
        if image.total_intensity() <= 0.0 {
            return Err(SignatureError::DegenerateImage(
                "image is all background".to_string(),
            ));
        }

        let side = Self::projection_len(image.width, image.height);
        let mut features = Vec::with_capacity(self.angles_deg.len() * side);
        for &angle in &self.angles_deg {
            features.extend(project(image, side, angle));
        }

        debug!(
            "extracted {} projection features ({} angles x {}) from {}x{} image",
            features.len(),
            self.angles_deg.len(),
            side,
            image.width,
            image.height
        );
        Ok(FeatureVector::new(features))
    }
}

/// Column sums of the padded image rotated by `angle_deg`.
fn project(image: &ImageData, side: usize, angle_deg: f64) -> Vec<f64> {
    let (sin_a, cos_a) = angle_deg.to_radians().sin_cos();
    let centre = (side as f64 - 1.0) / 2.0;
    let offset_x = ((side - image.width as usize) / 2) as f64;
    let offset_y = ((side - image.height as usize) / 2) as f64;

    (0..side)
        .map(|k| {
            let dx = k as f64 - centre;
            (0..side)
                .map(|y| {
                    let dy = y as f64 - centre;
                    let src_x = cos_a * dx + sin_a * dy + centre - offset_x;
                    let src_y = -sin_a * dx + cos_a * dy + centre - offset_y;
                    sample_bilinear(image, src_x, src_y)
                })
                .sum()
        })
        .collect()
}

/// Bilinear interpolation; samples outside the image are 0.
fn sample_bilinear(image: &ImageData, x: f64, y: f64) -> f64 {
    let (width, height) = (image.width as i64, image.height as i64);
    if x <= -1.0 || y <= -1.0 || x >= width as f64 || y >= height as f64 {
        return 0.0;
    }

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let at = |px: i64, py: i64| -> f64 {
        if px < 0 || py < 0 || px >= width || py >= height {
            0.0
        } else {
            image.data[(py * width + px) as usize] as f64
        }
    };

    let i0 = at(x0, y0) * (1.0 - fx) + at(x0 + 1, y0) * fx;
    let i1 = at(x0, y0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1) * fx;
    i0 * (1.0 - fy) + i1 * fy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::loader::SyntheticStroke;

    fn blob(width: u32, height: u32, pixels: &[(u32, u32, f32)]) -> ImageData {
        let mut data = vec![0.0; (width * height) as usize];
        for &(x, y, v) in pixels {
            data[(y * width + x) as usize] = v;
        }
        ImageData::new(data, width, height).unwrap()
    }

    #[test]
    fn default_angles_are_evenly_spaced_below_180() {
        let extractor = ProjectionExtractor::new(DEFAULT_ANGLE_COUNT).unwrap();
        assert_eq!(extractor.angles().len(), 12);
        assert_eq!(extractor.angles()[0], 0.0);
        assert_eq!(extractor.angles()[1], 15.0);
        assert_eq!(extractor.angles()[11], 165.0);
    }

    #[test]
    fn feature_length_is_angles_times_padded_side() {
        assert_eq!(ProjectionExtractor::projection_len(300, 150), 425);
        let extractor = ProjectionExtractor::new(4).unwrap();
        let image = ImageData::synthetic_signature(30, 15, SyntheticStroke::Loop);
        let features = extractor.extract(&image).unwrap();
        assert_eq!(features.len(), 4 * ProjectionExtractor::projection_len(30, 15));
        assert_eq!(features.len(), extractor.feature_len(30, 15));
    }

    #[test]
    fn zero_degrees_is_column_sums() {
        // 4x2 image, padded side = ceil(sqrt(2) * 4) = 6, offsets (1, 2)
        let image = blob(4, 2, &[(0, 0, 1.0), (0, 1, 0.5), (2, 1, 0.25)]);
        let extractor = ProjectionExtractor::with_angles(vec![0.0]).unwrap();
        let features = extractor.extract(&image).unwrap();
        let expected = [0.0, 1.5, 0.0, 0.25, 0.0, 0.0];
        for (got, want) in features.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{:?}", features.as_slice());
        }
    }

    #[test]
    fn projections_conserve_mass_for_centred_ink() {
        let image = ImageData::synthetic_signature(40, 20, SyntheticStroke::Wave);
        let total = image.total_intensity();
        let extractor = ProjectionExtractor::new(12).unwrap();
        let features = extractor.extract(&image).unwrap();
        let side = ProjectionExtractor::projection_len(40, 20);
        for profile in features.as_slice().chunks(side) {
            let mass: f64 = profile.iter().sum();
            assert!((mass - total).abs() / total < 0.1, "mass {mass} vs {total}");
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let image = ImageData::synthetic_signature(60, 30, SyntheticStroke::Zigzag);
        let extractor = ProjectionExtractor::new(12).unwrap();
        assert_eq!(extractor.extract(&image).unwrap(), extractor.extract(&image).unwrap());
    }

    #[test]
    fn blank_image_is_degenerate() {
        let image = blob(10, 5, &[]);
        let err = ProjectionExtractor::new(12).unwrap().extract(&image).unwrap_err();
        assert!(matches!(err, SignatureError::DegenerateImage(_)));
    }

    #[test]
    fn canonical_size_is_enforced() {
        let image = ImageData::synthetic_signature(40, 20, SyntheticStroke::Loop);
        let extractor = ProjectionExtractor::new(3).unwrap().with_canonical_size(300, 150);
        assert!(matches!(extractor.extract(&image), Err(SignatureError::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_or_non_finite_angles() {
        assert!(ProjectionExtractor::new(0).is_err());
        assert!(ProjectionExtractor::with_angles(vec![]).is_err());
        assert!(ProjectionExtractor::with_angles(vec![0.0, f64::NAN]).is_err());
    }
}
