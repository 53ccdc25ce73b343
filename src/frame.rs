//! Decoded frame presentation.
//!
//! A successful pull yields exactly `width * height * 3` row-major RGB
//! bytes, wrapped in a [`DecodedFrame`]. Converting to the alternate
//! representations (pixel array, image object, base64 JPEG string) is a
//! separate post-processing step applied only to successful frames.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};
use ndarray::Array3;

/// Bytes per pixel: one byte each for R, G and B.
pub const RGB_CHANNELS: usize = 3;

/// JPEG quality used for the base64 presentation.
const JPEG_QUALITY: u8 = 95;

/// Caller-selected presentation of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw row-major RGB bytes.
    Raw,
    /// `height x width x 3` pixel array.
    Array,
    /// Decoded-image object.
    Image,
    /// JPEG-compressed image as a base64 string.
    Base64Jpeg,
}

/// A decoded frame in one of the presentation formats.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutput {
    Raw(Vec<u8>),
    Array(Array3<u8>),
    Image(RgbImage),
    Base64Jpeg(String),
}

/// One decoded RGB frame.
///
/// Invariant: `data.len() == width * height * 3`. The session verifies
/// the pulled byte length against the negotiated geometry before
/// constructing one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl DecodedFrame {
    pub(crate) fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * RGB_CHANNELS);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Reshape into a `height x width x 3` row-major pixel array.
    pub fn to_array(&self) -> Array3<u8> {
        Array3::from_shape_vec(
            (self.height as usize, self.width as usize, RGB_CHANNELS),
            self.data.clone(),
        )
        .expect("frame length matches geometry")
    }

    /// Wrap as an RGB image object.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame length matches geometry")
    }

    /// JPEG-compress the frame and return it as a base64 string.
    ///
    /// Channels are reordered RGB -> BGR before compression, matching the
    /// conventional channel order of the compression library consumers of
    /// this encoding expect. The reorder is part of the contract.
    pub fn to_base64_jpeg(&self) -> Result<String, image::ImageError> {
        let mut bgr = self.data.clone();
        for px in bgr.chunks_exact_mut(RGB_CHANNELS) {
            px.swap(0, 2);
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode(
            &bgr,
            self.width,
            self.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(BASE64.encode(&jpeg))
    }

    /// Convert into the requested presentation format.
    pub fn present(self, format: OutputFormat) -> Result<FrameOutput, image::ImageError> {
        Ok(match format {
            OutputFormat::Raw => FrameOutput::Raw(self.data),
            OutputFormat::Array => FrameOutput::Array(self.to_array()),
            OutputFormat::Image => FrameOutput::Image(self.to_image()),
            OutputFormat::Base64Jpeg => FrameOutput::Base64Jpeg(self.to_base64_jpeg()?),
        })
    }
}
