//! Image preparation for recognition.
//!
//! Captured frames are resized, contrast-stretched, and sharpened before
//! recognition; an optional crop region focuses the recognizers on the
//! label area the user framed on screen. Preparation is best-effort: when
//! it fails the orchestrator falls back to the unmodified capture.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tracing::debug;

use crate::error::PreprocessError;

/// A rectangle in on-screen capture coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A crop region in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Map an on-screen capture-frame rectangle into image pixels through
    /// the screen-to-image scale factor, clamped to the image bounds.
    pub fn from_screen_frame(
        frame: &ScreenRect,
        screen_size: (f32, f32),
        image_size: (u32, u32),
    ) -> Self {
        let scale_x = image_size.0 as f32 / screen_size.0;
        let scale_y = image_size.1 as f32 / screen_size.1;

        let x = (frame.x.max(0.0) * scale_x) as u32;
        let y = (frame.y.max(0.0) * scale_y) as u32;
        let x = x.min(image_size.0.saturating_sub(1));
        let y = y.min(image_size.1.saturating_sub(1));

        let width = ((frame.width * scale_x) as u32)
            .clamp(1, image_size.0 - x);
        let height = ((frame.height * scale_y) as u32)
            .clamp(1, image_size.1 - y);

        Self { x, y, width, height }
    }
}

/// Reference to a captured frame, with an optional crop region.
#[derive(Debug, Clone)]
pub struct ScanImage {
    /// Path to the captured image file.
    pub path: PathBuf,
    /// Region of interest in source pixels, if the capture UI framed one.
    pub crop: Option<CropRegion>,
}

impl ScanImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            crop: None,
        }
    }

    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// An image readied for recognition.
///
/// Carries either the processed pixels or, after a preprocessing failure,
/// just the original file reference. Providers take whichever form they
/// need: a path for on-device engines, JPEG bytes for wire transport.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    source: PathBuf,
    image: Option<DynamicImage>,
}

impl PreparedImage {
    /// Wrap the original capture unmodified.
    pub fn raw(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            image: None,
        }
    }

    /// Path of the original capture.
    pub fn path(&self) -> &Path {
        &self.source
    }

    /// The processed pixels, when preprocessing succeeded.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    /// Encode for transport: processed pixels as JPEG, or the raw file
    /// bytes when no processing happened.
    pub fn jpeg_bytes(&self) -> Result<Vec<u8>, PreprocessError> {
        match &self.image {
            Some(img) => {
                let mut buf = Vec::new();
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
                    .map_err(|e| PreprocessError::Encode(e.to_string()))?;
                Ok(buf)
            }
            None => std::fs::read(&self.source).map_err(|e| PreprocessError::Load {
                path: self.source.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Base64 of [`Self::jpeg_bytes`], for form-encoded submission.
    pub fn jpeg_base64(&self) -> Result<String, PreprocessError> {
        Ok(BASE64.encode(self.jpeg_bytes()?))
    }
}

/// Tuning knobs for [`StandardPreprocessor`].
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Downscale target width in pixels; 0 disables resizing.
    pub target_width: u32,
    /// Stretch the luma histogram to full range.
    pub enhance_contrast: bool,
    /// Apply a 3x3 sharpening kernel.
    pub sharpen: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            target_width: 1200,
            enhance_contrast: true,
            sharpen: true,
        }
    }
}

/// The image-preparation collaborator used by the scan pipeline.
#[async_trait]
pub trait Preprocessor: Send + Sync {
    async fn prepare(&self, image: &ScanImage) -> Result<PreparedImage, PreprocessError>;
}

/// Default preprocessor: crop, resize to target width, contrast stretch,
/// sharpen.
#[derive(Debug, Clone, Default)]
pub struct StandardPreprocessor {
    options: PreprocessOptions,
}

impl StandardPreprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Preprocessor for StandardPreprocessor {
    async fn prepare(&self, image: &ScanImage) -> Result<PreparedImage, PreprocessError> {
        let image = image.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || prepare_sync(&image, &options))
            .await
            .map_err(|e| PreprocessError::Task(e.to_string()))?
    }
}

fn prepare_sync(
    scan: &ScanImage,
    options: &PreprocessOptions,
) -> Result<PreparedImage, PreprocessError> {
    let mut img = image::open(&scan.path).map_err(|e| PreprocessError::Load {
        path: scan.path.clone(),
        reason: e.to_string(),
    })?;

    if let Some(crop) = &scan.crop {
        if crop.width == 0
            || crop.height == 0
            || crop.x + crop.width > img.width()
            || crop.y + crop.height > img.height()
        {
            return Err(PreprocessError::InvalidCrop(format!(
                "{}x{} at ({}, {}) does not fit {}x{}",
                crop.width,
                crop.height,
                crop.x,
                crop.y,
                img.width(),
                img.height()
            )));
        }
        img = img.crop_imm(crop.x, crop.y, crop.width, crop.height);
    }

    if options.target_width > 0 && img.width() > options.target_width {
        let scale = options.target_width as f32 / img.width() as f32;
        let height = ((img.height() as f32 * scale) as u32).max(1);
        img = img.resize_exact(
            options.target_width,
            height,
            image::imageops::FilterType::Lanczos3,
        );
    }

    if options.enhance_contrast || options.sharpen {
        let mut gray = img.to_luma8();
        if options.enhance_contrast {
            gray = stretch_contrast(&gray);
        }
        if options.sharpen {
            gray = sharpen(&gray);
        }
        img = DynamicImage::ImageLuma8(gray);
    }

    debug!(
        path = %scan.path.display(),
        width = img.width(),
        height = img.height(),
        "prepared image"
    );

    Ok(PreparedImage {
        source: scan.path.clone(),
        image: Some(img),
    })
}

/// Linear histogram stretch over the full luma range.
fn stretch_contrast(gray: &GrayImage) -> GrayImage {
    let mut min = 255u8;
    let mut max = 0u8;
    for p in gray.pixels() {
        min = min.min(p[0]);
        max = max.max(p[0]);
    }
    if max <= min {
        return gray.clone();
    }

    let range = (max - min) as f32;
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    for (x, y, p) in gray.enumerate_pixels() {
        let value = ((p[0] - min) as f32 * 255.0 / range).round() as u8;
        out.put_pixel(x, y, Luma([value]));
    }
    out
}

/// 3x3 sharpening kernel (center 5, cross -1).
fn sharpen(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let center = gray.get_pixel(x, y)[0] as i32;
            let mut acc = 5 * center;
            for (dx, dy) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let neighbor = if nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height
                {
                    gray.get_pixel(nx as u32, ny as u32)[0] as i32
                } else {
                    center
                };
                acc -= neighbor;
            }
            out.put_pixel(x, y, Luma([acc.clamp(0, 255) as u8]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x + y) % 256) as u8;
            image::Rgb([v, v, v])
        })
    }

    #[test]
    fn crop_region_maps_screen_frame_through_scale() {
        // Screen 400x800 maps onto a 1600x3200 image: scale factor 4.
        let frame = ScreenRect {
            x: 50.0,
            y: 100.0,
            width: 280.0,
            height: 120.0,
        };
        let crop = CropRegion::from_screen_frame(&frame, (400.0, 800.0), (1600, 3200));
        assert_eq!(crop.x, 200);
        assert_eq!(crop.y, 400);
        assert_eq!(crop.width, 1120);
        assert_eq!(crop.height, 480);
    }

    #[test]
    fn crop_region_is_clamped_to_image_bounds() {
        let frame = ScreenRect {
            x: 350.0,
            y: 700.0,
            width: 200.0,
            height: 300.0,
        };
        let crop = CropRegion::from_screen_frame(&frame, (400.0, 800.0), (800, 1600));
        assert!(crop.x + crop.width <= 800);
        assert!(crop.y + crop.height <= 1600);
        assert!(crop.width >= 1);
        assert!(crop.height >= 1);
    }

    #[test]
    fn contrast_stretch_spans_full_range() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([100 + (x as u8) * 10]));
        let stretched = stretch_contrast(&gray);
        assert_eq!(stretched.get_pixel(0, 0)[0], 0);
        assert_eq!(stretched.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn contrast_stretch_handles_flat_images() {
        let gray = GrayImage::from_pixel(4, 4, Luma([128]));
        let stretched = stretch_contrast(&gray);
        assert_eq!(stretched.get_pixel(2, 2)[0], 128);
    }

    #[tokio::test]
    async fn prepares_and_downscales_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        gradient_image(2400, 1200).save(&path).unwrap();

        let preprocessor = StandardPreprocessor::default();
        let prepared = preprocessor.prepare(&ScanImage::new(&path)).await.unwrap();

        let img = prepared.image().unwrap();
        assert_eq!(img.width(), 1200);
        assert_eq!(img.height(), 600);
        assert!(!prepared.jpeg_bytes().unwrap().is_empty());
        assert!(!prepared.jpeg_base64().unwrap().is_empty());
    }

    #[tokio::test]
    async fn crops_before_resizing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        gradient_image(800, 400).save(&path).unwrap();

        let scan = ScanImage::new(&path).with_crop(CropRegion {
            x: 100,
            y: 50,
            width: 300,
            height: 200,
        });
        let prepared = StandardPreprocessor::default().prepare(&scan).await.unwrap();
        let img = prepared.image().unwrap();
        assert_eq!((img.width(), img.height()), (300, 200));
    }

    #[tokio::test]
    async fn rejects_out_of_bounds_crop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        gradient_image(100, 100).save(&path).unwrap();

        let scan = ScanImage::new(&path).with_crop(CropRegion {
            x: 90,
            y: 90,
            width: 50,
            height: 50,
        });
        let result = StandardPreprocessor::default().prepare(&scan).await;
        assert!(matches!(result, Err(PreprocessError::InvalidCrop(_))));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let scan = ScanImage::new("/nonexistent/file.jpg");
        let result = StandardPreprocessor::default().prepare(&scan).await;
        assert!(matches!(result, Err(PreprocessError::Load { .. })));
    }

    #[test]
    fn raw_prepared_image_reads_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        gradient_image(10, 10).save(&path).unwrap();

        let prepared = PreparedImage::raw(&path);
        assert!(prepared.image().is_none());
        assert!(!prepared.jpeg_bytes().unwrap().is_empty());
    }
}
