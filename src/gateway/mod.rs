//! Frame codec gateway interface.
//!
//! The gateway is the engine that actually opens a stream, pulls and
//! pushes compressed packets, and performs decode/encode work, optionally
//! hardware accelerated. A [`Session`](crate::Session) owns exactly one
//! gateway, drives it through this interface, and never interprets codec
//! internals, only the outcomes defined here.

pub mod memory;

pub use memory::{MemoryGateway, MemoryStream, StreamHandle};

use crate::params::CodecParams;
use crate::shm::ShmDescriptor;

/// Sentinel code: the stream has no more decodable frames.
pub const CODE_END_OF_STREAM: i32 = -5;
/// Sentinel code: the gateway could not resynchronize to the next packet
/// boundary.
pub const CODE_PACKET_MISMATCH: i32 = -4;
/// Result code for an accepted frame push.
pub const CODE_OK: i32 = 0;
/// Generic failure code for gateway errors outside the named sentinels.
pub const CODE_FAILURE: i32 = 1;

/// Direction of a media stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Compressed stream in, raw RGB frames out.
    Decode,
    /// Raw RGB frames in, compressed stream out.
    Encode,
}

impl StreamMode {
    /// Raw wire value used by native gateway bindings.
    pub fn as_raw(self) -> i32 {
        match self {
            StreamMode::Decode => 0,
            StreamMode::Encode => 1,
        }
    }
}

/// Error for an unrecognized raw stream-mode code.
#[derive(Debug, thiserror::Error)]
#[error("invalid stream mode code {0}")]
pub struct InvalidStreamMode(pub i32);

impl TryFrom<i32> for StreamMode {
    type Error = InvalidStreamMode;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StreamMode::Decode),
            1 => Ok(StreamMode::Encode),
            other => Err(InvalidStreamMode(other)),
        }
    }
}

/// Everything the gateway needs to open and configure a stream.
#[derive(Debug)]
pub struct OpenRequest<'a> {
    /// Target locator: a file path or stream URL.
    pub target: &'a str,
    pub mode: StreamMode,
    pub hw_enabled: bool,
    /// Hardware backend identifier, e.g. "cuda" or "vaapi".
    pub hw_backend: &'a str,
    /// Shared-memory channel descriptor when frame bytes are exchanged
    /// through a shared region instead of process-local buffers.
    pub shm: Option<&'a ShmDescriptor>,
    pub codec_params: &'a CodecParams,
}

/// Outcome of [`FrameCodecGateway::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenReport {
    /// Stream opened on the software path, with the negotiated geometry.
    Ready { width: u32, height: u32 },
    /// Stream opened with hardware acceleration active.
    ReadyHw { width: u32, height: u32 },
    /// The gateway could not open or configure the stream.
    Failed { code: i32 },
}

/// Outcome of a single frame pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// One decoded frame of exactly `width * height * 3` row-major RGB
    /// bytes.
    Frame(Vec<u8>),
    /// No more frames available. Terminal; the caller should finalize.
    EndOfStream,
    /// Packet desynchronization. Terminal, distinct from a generic
    /// failure so callers can log and alert differently.
    PacketMismatch,
    /// Any other gateway failure code.
    Failure(i32),
}

/// The codec engine a [`Session`](crate::Session) delegates to.
///
/// One gateway instance backs exactly one stream. The session owns it
/// exclusively and serializes all calls; implementations do not need to
/// be thread-safe. Calls may block on I/O or hardware codec latency; no
/// timeout is imposed at this layer.
pub trait FrameCodecGateway {
    /// Open and configure the underlying stream. May be slow (stream
    /// probing, hardware context setup); invoked at most once per
    /// gateway.
    fn open(&mut self, request: OpenRequest<'_>) -> OpenReport;

    /// Pull the next decodable frame.
    fn pull_frame(&mut self) -> PullOutcome;

    /// Pull the next frame and write its bytes into the shared-memory
    /// region at `offset`. Returns `false` on any failure, including a
    /// slot too small for one frame; never truncates or overflows.
    fn pull_frame_into_shm(&mut self, offset: usize) -> bool;

    /// Push one frame of raw RGB bytes for encoding. Returns
    /// [`CODE_OK`] on success or a nonzero failure code.
    fn push_frame(&mut self, rgb: &[u8]) -> i32;

    /// Push one frame read from the shared-memory region at `offset`.
    fn push_frame_from_shm(&mut self, offset: usize) -> bool;

    /// Number of frames decoded or encoded so far, as counted by the
    /// gateway. Authoritative over any caller-side shadow counter.
    fn frame_count(&self) -> u64;

    /// Flush pending encode buffers and close the stream.
    fn finalize(&mut self);

    /// Release the native handle. Must be safe to call more than once.
    fn release(&mut self);
}
