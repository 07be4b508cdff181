use crate::constants::{
    DEFAULT_MAX_DIMENSION_PX, DEFAULT_MAX_OUTPUT_SIZE_MB, DEFAULT_QUALITY, DOWNSCALE_FACTOR,
    LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, MAX_SIZE_ATTEMPTS, MIN_QUALITY_STEP,
    ZOPFLI_ITERATIONS,
};
use crate::error::{BatchError, CodecError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use oxipng::{Deflaters, Options};
use std::io::Cursor;
use std::num::NonZeroU8;
use tracing::debug;

/// Codec settings read by every compression pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    /// Encoder fidelity in `(0, 1]`.
    pub quality: f32,
    /// Longest side allowed in the output, aspect ratio preserved.
    pub max_dimension_px: u32,
    /// Target upper bound for the encoded output.
    pub max_output_size_mb: f64,
}

impl CompressionSettings {
    pub fn new(
        quality: Option<f32>,
        max_dimension_px: Option<u32>,
        max_output_size_mb: Option<f64>,
    ) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(BatchError::InvalidQuality(quality));
        }

        let max_dimension_px = max_dimension_px.unwrap_or(DEFAULT_MAX_DIMENSION_PX);
        if max_dimension_px == 0 {
            return Err(BatchError::InvalidDimension(max_dimension_px));
        }

        let max_output_size_mb = max_output_size_mb.unwrap_or(DEFAULT_MAX_OUTPUT_SIZE_MB);
        if !(max_output_size_mb > 0.0 && max_output_size_mb.is_finite()) {
            return Err(BatchError::InvalidOutputSize(max_output_size_mb));
        }

        Ok(Self {
            quality,
            max_dimension_px,
            max_output_size_mb,
        })
    }

    pub fn max_output_bytes(&self) -> usize {
        (self.max_output_size_mb * 1024.0 * 1024.0) as usize
    }
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_dimension_px: DEFAULT_MAX_DIMENSION_PX,
            max_output_size_mb: DEFAULT_MAX_OUTPUT_SIZE_MB,
        }
    }
}

/// Compresses one file. Must not mutate its input.
pub trait Codec: Send + Sync {
    fn compress(&self, input: &[u8], settings: &CompressionSettings) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Codec backed by the `image` crate, with oxipng for PNG output.
///
/// The output keeps the input format. When the encoded output is over the
/// size budget, JPEG quality is lowered first and then both dimensions are
/// scaled down, for a bounded number of attempts. An output larger than the
/// input is replaced by the input unless the image was resized.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl Codec for ImageCodec {
    fn compress(&self, input: &[u8], settings: &CompressionSettings) -> std::result::Result<Vec<u8>, CodecError> {
        let format = image::guess_format(input).map_err(CodecError::Decode)?;
        let mut img = image::load_from_memory_with_format(input, format).map_err(CodecError::Decode)?;
        let original_dimensions = img.dimensions();

        resize_to_fit(&mut img, settings.max_dimension_px);

        let budget = settings.max_output_bytes();
        let mut quality = settings.quality;
        let mut best = encode_image(&img, format, quality)?;

        for attempt in 1..MAX_SIZE_ATTEMPTS {
            if best.len() <= budget {
                break;
            }
            if format == ImageFormat::Jpeg && quality > MIN_QUALITY_STEP + f32::EPSILON {
                quality = (quality - MIN_QUALITY_STEP).max(MIN_QUALITY_STEP);
            } else if !downscale(&mut img) {
                break;
            }
            debug!(
                "Output {} bytes over budget {}, attempt {} at quality {:.2} and {:?}",
                best.len(),
                budget,
                attempt,
                quality,
                img.dimensions()
            );
            let candidate = encode_image(&img, format, quality)?;
            if candidate.len() < best.len() {
                best = candidate;
            }
        }

        if best.len() >= input.len() && img.dimensions() == original_dimensions {
            return Ok(input.to_vec());
        }
        Ok(best)
    }
}

/// Shrinks `img` so that its longest side is at most `max_dimension`.
pub fn resize_to_fit(img: &mut DynamicImage, max_dimension: u32) {
    let (width, height) = img.dimensions();
    if width.max(height) > max_dimension {
        *img = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
    }
}

fn downscale(img: &mut DynamicImage) -> bool {
    let (width, height) = img.dimensions();
    let new_width = ((width as f64 * DOWNSCALE_FACTOR).round() as u32).max(1);
    let new_height = ((height as f64 * DOWNSCALE_FACTOR).round() as u32).max(1);
    if (new_width, new_height) == (width, height) {
        return false;
    }
    *img = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
    true
}

/// Encodes `img` in `format` at `quality`.
pub fn encode_image(
    img: &DynamicImage,
    format: ImageFormat,
    quality: f32,
) -> std::result::Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
            encoder.encode_image(&rgb).map_err(CodecError::Encode)?;
        }
        ImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(CodecError::Encode)?;
            buffer = oxipng::optimize_from_memory(&buffer, &png_options(quality))
                .map_err(|e| CodecError::PngOptimization(e.to_string()))?;
        }
        ImageFormat::WebP | ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::Avif => {
            img.write_to(&mut Cursor::new(&mut buffer), format)
                .map_err(CodecError::Encode)?;
        }
        other => return Err(CodecError::UnsupportedFormat(format!("{:?}", other))),
    }

    Ok(buffer)
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn png_options(quality: f32) -> Options {
    let mut options = Options::from_preset(4);
    options.deflate = if quality >= 0.9 {
        match NonZeroU8::new(ZOPFLI_ITERATIONS) {
            Some(iterations) => Deflaters::Zopfli { iterations },
            None => Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            },
        }
    } else if quality >= 0.7 {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };
    options
}
