use std::io::Cursor;

use image::{
    DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader, Limits, Rgba, RgbaImage,
};
use serde::{Deserialize, Serialize};

use crate::error::{OcrDeskError, Result, ValidationError};
use crate::upload::{FileKind, UploadedFile};

/// Largest width or height accepted when decoding an uploaded image.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// User-selected image adjustments. Factors are multipliers where `1.0`
/// leaves the image untouched; rotation is clockwise, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessSettings {
    pub rotation: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub sharpness: f32,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }
}

impl PreprocessSettings {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.rotation.is_finite() {
            return Err(ValidationError::InvalidSetting(
                "rotation must be a finite number of degrees".to_string(),
            ));
        }
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidSetting(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Rotation folded into `[0, 360)`.
    pub fn normalized_rotation(&self) -> f32 {
        let r = self.rotation.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if r >= 360.0 {
            0.0
        } else {
            r
        }
    }

    pub fn is_identity(&self) -> bool {
        self.normalized_rotation() == 0.0
            && self.brightness == 1.0
            && self.contrast == 1.0
            && self.sharpness == 1.0
    }
}

/// Bytes ready to be posted to the OCR service.
#[derive(Debug, Clone)]
pub struct PreparedPayload {
    pub file_name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

/// Turn a validated upload into the payload sent for OCR.
///
/// PDF and Word documents pass through untouched. Images are decoded first
/// (so undecodable images fail here), and with identity settings the original
/// bytes are forwarded. Otherwise the adjusted image is re-encoded as PNG and
/// fitted under `max_bytes`.
pub fn prepare_payload(
    file: &UploadedFile,
    settings: &PreprocessSettings,
    max_bytes: usize,
) -> Result<PreparedPayload> {
    if !file.kind.is_image() {
        return Ok(PreparedPayload {
            file_name: file.name.clone(),
            kind: file.kind,
            bytes: file.bytes.clone(),
        });
    }

    settings.validate()?;
    let img = decode_image(&file.bytes)?;

    if settings.is_identity() {
        return Ok(PreparedPayload {
            file_name: file.name.clone(),
            kind: file.kind,
            bytes: file.bytes.clone(),
        });
    }

    let processed = apply_settings(img, settings);
    let bytes = fit_payload(&processed, max_bytes)?;

    tracing::debug!(
        file = %file.name,
        original_size = file.size(),
        processed_size = bytes.len(),
        "Image preprocessed"
    );

    Ok(PreparedPayload {
        file_name: png_file_name(&file.name),
        kind: FileKind::Png,
        bytes,
    })
}

/// Render the processed image as PNG for display, without any size fitting.
pub fn render_preview(file: &UploadedFile, settings: &PreprocessSettings) -> Result<Vec<u8>> {
    if !file.kind.is_image() {
        return Err(OcrDeskError::Preprocess(format!(
            "Preview is only available for images, got {}",
            file.kind.extension()
        )));
    }
    settings.validate()?;
    let img = decode_image(&file.bytes)?;
    encode_png(&apply_settings(img, settings))
}

/// Decode an image, refusing anything wider or taller than
/// `MAX_IMAGE_DIMENSION` before its pixels are allocated.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| OcrDeskError::Preprocess(format!("Failed to read image: {e}")))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    reader.limits(limits);

    reader.decode().map_err(|e| match e {
        ImageError::Limits(_) => OcrDeskError::Preprocess(format!(
            "Image is too large to process: width and height must be at most {MAX_IMAGE_DIMENSION} pixels"
        )),
        e => OcrDeskError::Preprocess(format!("Failed to decode image: {e}")),
    })
}

/// Apply rotation, then brightness, then contrast, then sharpness.
///
/// Steps whose setting is neutral are skipped entirely, so default settings
/// return the input image as-is.
pub fn apply_settings(img: DynamicImage, settings: &PreprocessSettings) -> DynamicImage {
    let mut img = rotate(img, settings.normalized_rotation());

    if settings.brightness != 1.0 {
        img = DynamicImage::ImageRgba8(adjust_brightness(&img.to_rgba8(), settings.brightness));
    }
    if settings.contrast != 1.0 {
        img = DynamicImage::ImageRgba8(adjust_contrast(&img.to_rgba8(), settings.contrast));
    }
    if settings.sharpness != 1.0 {
        img = DynamicImage::ImageRgba8(adjust_sharpness(&img.to_rgba8(), settings.sharpness));
    }

    img
}

fn rotate(img: DynamicImage, degrees: f32) -> DynamicImage {
    if degrees == 0.0 {
        img
    } else if degrees == 90.0 {
        img.rotate90()
    } else if degrees == 180.0 {
        img.rotate180()
    } else if degrees == 270.0 {
        img.rotate270()
    } else {
        DynamicImage::ImageRgba8(rotate_expanded(&img.to_rgba8(), degrees))
    }
}

/// Rotate clockwise by an arbitrary angle, growing the canvas so no corner is
/// clipped. Uncovered areas are filled with opaque white.
fn rotate_expanded(src: &RgbaImage, degrees: f32) -> RgbaImage {
    const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (w, h) = (src.width() as f32, src.height() as f32);

    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

    let (src_cx, src_cy) = (w / 2.0, h / 2.0);
    let (dst_cx, dst_cy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = x as f32 + 0.5 - dst_cx;
        let dy = y as f32 + 0.5 - dst_cy;
        // inverse of the clockwise rotation
        let sx = dx * cos + dy * sin + src_cx - 0.5;
        let sy = -dx * sin + dy * cos + src_cy - 0.5;
        sample_bilinear(src, sx, sy).unwrap_or(FILL)
    })
}

fn sample_bilinear(src: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (w, h) = (src.width() as f32, src.height() as f32);
    if x < -0.5 || y < -0.5 || x > w - 0.5 || y > h - 0.5 {
        return None;
    }

    let x = x.clamp(0.0, w - 1.0);
    let y = y.clamp(0.0, h - 1.0);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let x1 = (x0 + 1).min(src.width() - 1);
    let y1 = (y0 + 1).min(src.height() - 1);
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x1, y0);
    let p01 = src.get_pixel(x0, y1);
    let p11 = src.get_pixel(x1, y1);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        *slot = clamp_channel(top * (1.0 - fy) + bottom * fy);
    }
    Some(Rgba(out))
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Interpolate (or extrapolate) each colour channel between a degenerate
/// value and the original: `degenerate + factor * (original - degenerate)`.
/// Alpha is left alone.
fn blend(original: Rgba<u8>, degenerate: [f32; 3], factor: f32) -> Rgba<u8> {
    let mut out = original;
    for c in 0..3 {
        let d = degenerate[c];
        out[c] = clamp_channel(d + factor * (original[c] as f32 - d));
    }
    out
}

/// Brightness blends towards black.
fn adjust_brightness(img: &RgbaImage, factor: f32) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        blend(*img.get_pixel(x, y), [0.0; 3], factor)
    })
}

/// Contrast blends towards a flat grey at the image's mean luminance.
fn adjust_contrast(img: &RgbaImage, factor: f32) -> RgbaImage {
    let mean = mean_luminance(img);
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        blend(*img.get_pixel(x, y), [mean; 3], factor)
    })
}

/// Sharpness blends towards a smoothed copy; factors above 1 sharpen.
fn adjust_sharpness(img: &RgbaImage, factor: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    RgbaImage::from_fn(w, h, |x, y| {
        let original = *img.get_pixel(x, y);
        match smoothed_at(img, x, y) {
            Some(smooth) => blend(original, smooth, factor),
            None => original,
        }
    })
}

fn mean_luminance(img: &RgbaImage) -> f32 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = img
        .pixels()
        .map(|p| (p[0] as u64 * 299 + p[1] as u64 * 587 + p[2] as u64 * 114) / 1000)
        .sum();
    (total as f32 / count as f32).round()
}

/// 3x3 smoothing kernel (centre weight 5, neighbours 1). Border pixels have
/// no full neighbourhood and return `None`.
fn smoothed_at(img: &RgbaImage, x: u32, y: u32) -> Option<[f32; 3]> {
    let (w, h) = img.dimensions();
    if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
        return None;
    }

    let mut acc = [0f32; 3];
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            let weight = if nx == x && ny == y { 5.0 } else { 1.0 };
            let p = img.get_pixel(nx, ny);
            for c in 0..3 {
                acc[c] += p[c] as f32 * weight;
            }
        }
    }
    Some(acc.map(|v| (v / 13.0).round()))
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| OcrDeskError::Preprocess(format!("Failed to encode image: {e}")))?;
    Ok(output)
}

/// Encode as PNG, halving the dimensions once if the result exceeds the
/// upload limit.
fn fit_payload(img: &DynamicImage, max_bytes: usize) -> Result<Vec<u8>> {
    let encoded = encode_png(img)?;
    if encoded.len() <= max_bytes {
        return Ok(encoded);
    }

    let (width, height) = img.dimensions();
    let halved = img.resize_exact(
        (width / 2).max(1),
        (height / 2).max(1),
        image::imageops::FilterType::Triangle,
    );
    let encoded = encode_png(&halved)?;
    if encoded.len() <= max_bytes {
        tracing::info!(
            width,
            height,
            size = encoded.len(),
            "Processed image halved to fit the upload limit"
        );
        return Ok(encoded);
    }

    Err(ValidationError::Oversize {
        size: encoded.len(),
        max: max_bytes,
    }
    .into())
}

fn png_file_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    let stem = if stem.is_empty() { "image" } else { stem };
    format!("{stem}.png")
}
