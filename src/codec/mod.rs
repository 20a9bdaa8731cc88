//! Codec capability.
//!
//! The pipeline never talks to an image library directly; it goes through the
//! `Codec` trait so the derivation logic can be exercised with any backend.
//! `ImageCodec` is the default backend (`image` + libwebp via `webp`).

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use thiserror::Error;

use crate::domain::EncodingProfile;

pub mod image_codec;

pub use image_codec::ImageCodec;

/// Errors raised by a codec backend.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot resize to {width}px: {reason}")]
    Resize { width: u32, reason: &'static str },
    #[error("{format} encoding failed: {message}")]
    Encode { format: &'static str, message: String },
}

/// A decoded, in-memory source image.
///
/// Shared read-only across every variant derived from one source.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
}

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// decode → resize → encode.
pub trait Codec {
    /// Decode a file fully into memory.
    fn decode(&self, path: &Path) -> Result<DecodedImage, CodecError>;

    /// Read only the dimensions (`width`, `height`) of a file.
    fn probe(&self, path: &Path) -> Result<(u32, u32), CodecError>;

    /// Scale to `width`, keeping the aspect ratio.
    ///
    /// Never enlarges: a `width` at or above the current width hands back the
    /// input unchanged.
    fn resize<'a>(&self, image: &'a DecodedImage, width: u32) -> Result<Cow<'a, DecodedImage>, CodecError>;

    fn encode(&self, image: &DecodedImage, profile: &EncodingProfile) -> Result<Vec<u8>, CodecError>;
}

/// Height that keeps the aspect ratio of `natural_width`×`natural_height` at `target_width`.
///
/// Rounded to the nearest pixel, never below 1.
pub fn scaled_height(natural_width: u32, natural_height: u32, target_width: u32) -> u32 {
    if natural_width == 0 {
        return natural_height.max(1);
    }
    let h = (u64::from(natural_height) * u64::from(target_width) + u64::from(natural_width) / 2)
        / u64::from(natural_width);
    u32::try_from(h).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_height_keeps_aspect() {
        assert_eq!(scaled_height(1920, 1080, 480), 270);
        assert_eq!(scaled_height(1920, 1080, 1024), 576);
        assert_eq!(scaled_height(1000, 333, 500), 167);
    }

    #[test]
    fn scaled_height_never_zero() {
        assert_eq!(scaled_height(4000, 1, 480), 1);
        assert_eq!(scaled_height(0, 0, 480), 1);
    }
}
