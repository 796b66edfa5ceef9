// src/services/image_processor.rs
use std::io::Cursor;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use log::debug;

use crate::errors::DesignerError;

/// Upper bound for uploads accepted by the HTTP front end.
pub const MAX_UPLOAD_DIMENSION: u32 = 8192;

pub struct ImageProcessor {
    max_dimension: u32,
}

impl ImageProcessor {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Check that uploaded bytes decode as an image of sane size.
    pub fn validate_image(&self, data: &[u8]) -> Result<(u32, u32), DesignerError> {
        let img = image::load_from_memory(data)
            .map_err(|e| DesignerError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();

        if width > MAX_UPLOAD_DIMENSION || height > MAX_UPLOAD_DIMENSION {
            return Err(DesignerError::ImageProcessing(format!(
                "Image dimensions exceed {}x{}",
                MAX_UPLOAD_DIMENSION, MAX_UPLOAD_DIMENSION
            )));
        }

        Ok((width, height))
    }

    /// Load an image file, bound its longest edge and re-encode as JPEG.
    pub fn resize_for_api(&self, path: &Path) -> Result<Vec<u8>, DesignerError> {
        let data = std::fs::read(path).map_err(|e| {
            DesignerError::ImageProcessing(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.resize_bytes_for_api(&data)
    }

    pub fn resize_bytes_for_api(&self, data: &[u8]) -> Result<Vec<u8>, DesignerError> {
        let img = image::load_from_memory(data)
            .map_err(|e| DesignerError::ImageProcessing(format!("Failed to load image: {}", e)))?;

        let resized = resize_to_fit(img, self.max_dimension);
        debug!("Prepared image at {}x{}", resized.width(), resized.height());

        encode_jpeg(&resized)
    }

    /// Base64 JPEG ready to embed in a `data:` URI.
    pub fn encode_for_api(&self, path: &Path) -> Result<String, DesignerError> {
        let jpeg = self.resize_for_api(path)?;
        Ok(general_purpose::STANDARD.encode(jpeg))
    }
}

fn resize_to_fit(img: DynamicImage, max_size: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    if width <= max_size && height <= max_size {
        return img;
    }

    let ratio = max_size as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, DesignerError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut output = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut output), ImgFormat::Jpeg)
        .map_err(|e| {
            DesignerError::ImageProcessing(format!("Failed to encode resized image: {}", e))
        })?;

    Ok(output)
}
