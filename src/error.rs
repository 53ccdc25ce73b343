//! Session error taxonomy.
//!
//! Expected per-frame terminal conditions (end of stream, packet
//! mismatch) are not errors; they are variants of
//! [`DecodeOutcome`](crate::DecodeOutcome). Everything here is either a
//! precondition violation or a gateway failure, surfaced as an explicit
//! result and never retried internally.

use crate::params::CodecParamsError;
use crate::session::SessionState;
use crate::shm::ShmError;

/// Errors surfaced by [`Session`](crate::Session) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The gateway could not open or configure the stream. Surfaced once
    /// at initialization; the session's provisional native resources have
    /// already been released and the session is unusable.
    #[error("failed to initialize stream `{target}` (gateway code {code})")]
    Initialization { target: String, code: i32 },

    #[error("invalid codec parameters: {0}")]
    InvalidParams(#[from] CodecParamsError),

    /// Operation attempted outside the ready states.
    #[error("session is not ready for frame operations (state: {0:?})")]
    NotReady(SessionState),

    /// Any gateway failure not covered by the named terminal conditions.
    #[error("codec gateway failure (code {0})")]
    CodecFailure(i32),

    /// Caller-supplied frame bytes do not match the negotiated geometry.
    #[error("frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    InvalidFrameBuffer { expected: usize, actual: usize },

    /// Shared-memory operation on a session constructed without a
    /// channel descriptor.
    #[error("shared memory is not enabled for this session")]
    SharedMemoryDisabled,

    /// The configured region cannot hold one frame at the requested
    /// offset.
    #[error(
        "shared memory slot too small: need {needed} bytes at offset {offset}, region size is {size}"
    )]
    SlotTooSmall {
        needed: usize,
        offset: usize,
        size: usize,
    },

    #[error(transparent)]
    SharedMemory(#[from] ShmError),

    /// JPEG compression of a decoded frame failed.
    #[error("failed to compress frame: {0}")]
    Compression(#[from] image::ImageError),
}

pub type SessionResult<T> = Result<T, SessionError>;
