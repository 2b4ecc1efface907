use crate::error::{Result, SignatureError};
use image::{DynamicImage, GenericImageView, GrayImage, ImageBuffer};
use std::path::Path;

/// Stroke patterns for synthetic signatures (tests and benchmarks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticStroke {
    /// A slanted ellipse with a tail.
    Loop,
    /// A sawtooth scribble.
    Zigzag,
    /// A sine stroke with an underline.
    Wave,
}

/// Grayscale image as row-major `f32` in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub data: Vec<f32>,
    pub width: u32,
    pub height: u32,
}

impl ImageData {
    pub fn new(data: Vec<f32>, width: u32, height: u32) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(SignatureError::InvalidInput(format!(
                "{} pixels do not fill a {}x{} image",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { data, width, height })
    }

    /// Load image from file and convert to normalised grayscale
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| SignatureError::ImageLoad {
            origin: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_dynamic_image(img))
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| SignatureError::ImageLoad {
            origin: format!("<{} byte buffer>", bytes.len()),
            source,
        })?;
        Ok(Self::from_dynamic_image(img))
    }

    /// Convert DynamicImage to normalised grayscale data
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();

        let data: Vec<f32> = match img {
            DynamicImage::ImageLuma8(img) => img.pixels().map(|pixel| pixel[0] as f32 / 255.0).collect(),
            DynamicImage::ImageRgb8(img) => img.pixels().map(|pixel| luminance(pixel[0], pixel[1], pixel[2])).collect(),
            DynamicImage::ImageRgba8(img) => {
                // alpha is ignored
                img.pixels().map(|pixel| luminance(pixel[0], pixel[1], pixel[2])).collect()
            }
            other => {
                let rgb = other.to_rgb8();
                rgb.pixels().map(|pixel| luminance(pixel[0], pixel[1], pixel[2])).collect()
            }
        };

        Self { data, width, height }
    }

    pub fn from_gray_image(img: &GrayImage) -> Self {
        Self {
            data: img.pixels().map(|pixel| pixel[0] as f32 / 255.0).collect(),
            width: img.width(),
            height: img.height(),
        }
    }

    pub fn to_gray_image(&self) -> GrayImage {
        let mut img_buffer = ImageBuffer::new(self.width, self.height);

        for (x, y, pixel) in img_buffer.enumerate_pixels_mut() {
            let intensity = self.data[(y * self.width + x) as usize];
            let byte_val = (intensity * 255.0).round().clamp(0.0, 255.0) as u8;
            *pixel = image::Luma([byte_val]);
        }

        img_buffer
    }

    /// Save image to file (for debugging)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_gray_image().save(path)?;
        Ok(())
    }

    pub fn pixel(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn total_intensity(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// Create a synthetic signature: bright ink on a dark background.
    pub fn synthetic_signature(width: u32, height: u32, stroke: SyntheticStroke) -> Self {
        let mut data = vec![0.0; (width * height) as usize];
        let w = width as f32;
        let h = height as f32;
        let thickness = (h / 30.0).max(1.0);

        let mut plot = |x: f32, y: f32| {
            let r = thickness.ceil() as i32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if ((dx * dx + dy * dy) as f32).sqrt() > thickness {
                        continue;
                    }
                    let px = x.round() as i32 + dx;
                    let py = y.round() as i32 + dy;
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        data[(py as u32 * width + px as u32) as usize] = 1.0;
                    }
                }
            }
        };

        let samples = (4 * (width + height)) as usize;
        for s in 0..samples {
            let t = s as f32 / samples as f32;
            match stroke {
                SyntheticStroke::Loop => {
                    let angle = t * 2.0 * std::f32::consts::PI;
                    let cx = w * 0.35 + angle.cos() * w * 0.2 + angle.sin() * w * 0.05;
                    let cy = h * 0.5 + angle.sin() * h * 0.3;
                    plot(cx, cy);
                    plot(w * 0.55 + t * w * 0.35, h * 0.5 + t * h * 0.25);
                }
                SyntheticStroke::Zigzag => {
                    let x = w * 0.1 + t * w * 0.8;
                    let phase = (t * 6.0).fract();
                    let tooth = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
                    plot(x, h * 0.2 + tooth * h * 0.6);
                }
                SyntheticStroke::Wave => {
                    let x = w * 0.1 + t * w * 0.8;
                    plot(x, h * 0.45 + (t * 3.0 * 2.0 * std::f32::consts::PI).sin() * h * 0.25);
                    plot(x, h * 0.85);
                }
            }
        }

        Self { data, width, height }
    }
}

fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(matches!(
            ImageData::new(vec![0.0; 5], 2, 2),
            Err(SignatureError::InvalidInput(_))
        ));
    }

    #[test]
    fn rgb_is_converted_to_luminance() {
        let rgb = image::RgbImage::from_pixel(2, 1, image::Rgb([255, 255, 255]));
        let img = ImageData::from_dynamic_image(DynamicImage::ImageRgb8(rgb));
        assert_eq!((img.width, img.height), (2, 1));
        assert!(img.data.iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }

    #[test]
    fn decodes_png_bytes_and_reports_garbage() {
        let gray = GrayImage::from_fn(4, 3, |x, y| image::Luma([(x * 60 + y) as u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(gray.clone())
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let img = ImageData::from_bytes(&bytes).unwrap();
        assert_eq!(img, ImageData::from_gray_image(&gray));

        let err = ImageData::from_bytes(b"not an image").unwrap_err();
        assert!(matches!(err, SignatureError::ImageLoad { .. }));
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let err = ImageData::from_file("definitely/not/here.png").unwrap_err();
        match err {
            SignatureError::ImageLoad { origin, .. } => assert!(origin.contains("here.png")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn synthetic_strokes_have_ink() {
        for stroke in [SyntheticStroke::Loop, SyntheticStroke::Zigzag, SyntheticStroke::Wave] {
            let img = ImageData::synthetic_signature(120, 60, stroke);
            assert!(img.total_intensity() > 0.0, "{stroke:?}");
            assert!(img.data.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }
}
