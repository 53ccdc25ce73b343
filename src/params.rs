//! Encode-time codec tuning parameters.
//!
//! A [`CodecParams`] value is supplied at session construction and never
//! mutated afterwards. The default value (all numeric fields zero, all
//! strings empty) means "use gateway defaults".

use crate::gateway::StreamMode;

/// Maximum byte length of each identifier string field.
///
/// Mirrors the fixed 24-byte (23 characters plus terminator) string fields
/// of the native parameter layout. Longer values are rejected, never
/// silently truncated.
pub const MAX_PARAM_STR_LEN: usize = 23;

/// Encode-time tuning parameters. Pure data, no behavior beyond validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecParams {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
    /// Frames per second.
    pub fps: u32,
    /// Keyframe interval (group-of-pictures size).
    pub gop: u32,
    /// Maximum B-frames between non-B frames.
    pub b_frames: u32,
    /// Codec profile identifier, e.g. "high".
    pub profile: String,
    /// Encoder preset identifier, e.g. "veryfast".
    pub preset: String,
    /// Encoder tune identifier, e.g. "zerolatency".
    pub tune: String,
    /// Pixel format identifier, e.g. "yuv420p".
    pub pix_fmt: String,
    /// Container format identifier, e.g. "flv".
    pub format: String,
}

/// Validation errors for [`CodecParams`].
#[derive(Debug, thiserror::Error)]
pub enum CodecParamsError {
    #[error("codec parameter `{field}` is too long: {len} bytes (maximum {MAX_PARAM_STR_LEN})")]
    StringTooLong { field: &'static str, len: usize },

    #[error("encode sessions require nonzero dimensions, got {width}x{height}")]
    MissingDimensions { width: u32, height: u32 },
}

impl CodecParams {
    /// Validate the parameters for use in the given stream mode.
    ///
    /// A default value always passes for decode sessions. Encode sessions
    /// additionally require explicit nonzero dimensions, because the
    /// session needs the frame byte size up front to validate the buffers
    /// it is asked to push.
    pub fn validate(&self, mode: StreamMode) -> Result<(), CodecParamsError> {
        let strings = [
            ("profile", &self.profile),
            ("preset", &self.preset),
            ("tune", &self.tune),
            ("pix_fmt", &self.pix_fmt),
            ("format", &self.format),
        ];
        for (field, value) in strings {
            if value.len() > MAX_PARAM_STR_LEN {
                return Err(CodecParamsError::StringTooLong {
                    field,
                    len: value.len(),
                });
            }
        }

        if mode == StreamMode::Encode && (self.width == 0 || self.height == 0) {
            return Err(CodecParamsError::MissingDimensions {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }
}
