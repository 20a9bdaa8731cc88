//! Default codec backend.
//!
//! - decode / probe / resize: the `image` crate (Lanczos3 resampling)
//! - WebP: libwebp through the `webp` crate, since `image` only writes lossless WebP
//! - JPEG: `jpeg-encoder`, for progressive scans and optimized Huffman tables
//! - PNG: NeuQuant palette (`color_quant`) written with `png`, then `oxipng`
//!   at a preset derived from the profile's compression level

use std::borrow::Cow;
use std::path::Path;

use color_quant::NeuQuant;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use tracing::debug;

use crate::codec::{Codec, CodecError, DecodedImage, scaled_height};
use crate::domain::{EncodingProfile, JpegParams, PngParams, WebpParams};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for ImageCodec {
    fn decode(&self, path: &Path) -> Result<DecodedImage, CodecError> {
        let decode_err = |source| CodecError::Decode {
            path: path.to_path_buf(),
            source,
        };
        let image = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| decode_err(image::ImageError::IoError(e)))?
            .decode()
            .map_err(decode_err)?;
        Ok(DecodedImage::new(image))
    }

    fn probe(&self, path: &Path) -> Result<(u32, u32), CodecError> {
        image::image_dimensions(path).map_err(|source| CodecError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resize<'a>(&self, image: &'a DecodedImage, width: u32) -> Result<Cow<'a, DecodedImage>, CodecError> {
        if width == 0 {
            return Err(CodecError::Resize {
                width,
                reason: "target width must be positive",
            });
        }
        if width >= image.width() {
            return Ok(Cow::Borrowed(image));
        }
        let height = scaled_height(image.width(), image.height(), width);
        let resized = image.as_dynamic().resize_exact(width, height, FilterType::Lanczos3);
        Ok(Cow::Owned(DecodedImage::new(resized)))
    }

    fn encode(&self, image: &DecodedImage, profile: &EncodingProfile) -> Result<Vec<u8>, CodecError> {
        match profile {
            EncodingProfile::Webp(p) => encode_webp(image.as_dynamic(), p),
            EncodingProfile::Jpeg(p) => encode_jpeg(image.as_dynamic(), p),
            EncodingProfile::Png(p) => encode_png(image.as_dynamic(), p),
        }
    }
}

fn encode_error(format: &'static str, message: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        format,
        message: message.to_string(),
    }
}

fn encode_webp(image: &DynamicImage, params: &WebpParams) -> Result<Vec<u8>, CodecError> {
    // libwebp takes 8-bit RGB or RGBA only.
    let prepared = if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    };
    let encoder = webp::Encoder::from_image(&prepared).map_err(|e| encode_error("WebP", e))?;

    let mut config =
        webp::WebPConfig::new().map_err(|()| encode_error("WebP", "could not initialise encoder config"))?;
    config.quality = f32::from(params.quality.min(100));
    config.method = i32::from(params.effort.min(6));
    config.lossless = i32::from(params.lossless);

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| encode_error("WebP", format!("{e:?}")))?;
    Ok(memory.to_vec())
}

fn encode_jpeg(image: &DynamicImage, params: &JpegParams) -> Result<Vec<u8>, CodecError> {
    let (Ok(width), Ok(height)) = (u16::try_from(image.width()), u16::try_from(image.height())) else {
        return Err(encode_error(
            "JPEG",
            format!("{}x{} exceeds the 65535px limit", image.width(), image.height()),
        ));
    };
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, params.quality.clamp(1, 100));
    encoder.set_progressive(params.progressive);
    encoder.set_optimized_huffman_tables(params.optimized);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| encode_error("JPEG", e))?;
    Ok(buf)
}

fn encode_png(image: &DynamicImage, params: &PngParams) -> Result<Vec<u8>, CodecError> {
    let raw = if params.palette {
        encode_indexed_png(&image.to_rgba8(), params.quality)?
    } else {
        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, PngFilter::Adaptive);
        image.write_with_encoder(encoder).map_err(|e| encode_error("PNG", e))?;
        buf
    };

    let preset = oxipng_preset(params.compression_level);
    debug!(preset, palette = params.palette, "optimizing PNG");
    oxipng::optimize_from_memory(&raw, &oxipng::Options::from_preset(preset)).map_err(|e| encode_error("PNG", e))
}

/// zlib level 0..=9 onto oxipng's 0..=6 presets.
fn oxipng_preset(compression_level: u8) -> u8 {
    compression_level.min(9) * 2 / 3
}

/// NeuQuant sampling factor: 1 (best) at quality 100, 30 (fastest) at quality 0.
fn neuquant_sample_factor(quality: u8) -> i32 {
    1 + (100 - i32::from(quality.min(100))) * 29 / 100
}

/// Quantize to at most 256 colours and write an indexed PNG.
fn encode_indexed_png(rgba: &RgbaImage, quality: u8) -> Result<Vec<u8>, CodecError> {
    let quant = NeuQuant::new(neuquant_sample_factor(quality), 256, rgba.as_raw());
    let indices: Vec<u8> = rgba
        .as_raw()
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    let map = quant.color_map_rgba();
    let mut palette = Vec::with_capacity(map.len() / 4 * 3);
    let mut alphas = Vec::with_capacity(map.len() / 4);
    for entry in map.chunks_exact(4) {
        palette.extend_from_slice(&entry[..3]);
        alphas.push(entry[3]);
    }

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, rgba.width(), rgba.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_palette(palette);
        if alphas.iter().any(|&a| a < u8::MAX) {
            encoder.set_trns(alphas);
        }
        let mut writer = encoder.write_header().map_err(|e| encode_error("PNG", e))?;
        writer.write_image_data(&indices).map_err(|e| encode_error("PNG", e))?;
        writer.finish().map_err(|e| encode_error("PNG", e))?;
    }
    Ok(buf)
}
