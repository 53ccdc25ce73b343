#![deny(clippy::all)]

//! Media stream session layer over pluggable frame codec gateways.
//!
//! One [`Session`] owns one stream handle: it opens the stream through a
//! [`FrameCodecGateway`], tracks lifecycle state, frame sequencing and
//! the negotiated geometry, and exchanges raw RGB frames either through
//! process-local buffers or through a named shared-memory slot shared
//! with another process (zero-copy from this process's point of view).
//!
//! The codec engine itself (demuxing, packet handling, hardware
//! contexts) lives behind the [`FrameCodecGateway`] trait. The crate
//! ships [`MemoryGateway`], an in-memory loopback backend, so the whole
//! session contract is exercisable without a native codec library.

// Session orchestration (state machine, counters, frame ops)
pub mod session;

// Codec gateway interface and the in-memory backend
pub mod gateway;

// Decoded-frame presentations (raw, array, image, base64 JPEG)
pub mod frame;

// Codec tuning parameters
pub mod params;

// Shared-memory frame exchange
pub mod shm;

// Error taxonomy
pub mod error;

pub use error::{SessionError, SessionResult};
pub use frame::{DecodedFrame, FrameOutput, OutputFormat, RGB_CHANNELS};
pub use gateway::{
    FrameCodecGateway, MemoryGateway, MemoryStream, OpenReport, OpenRequest, PullOutcome,
    StreamHandle, StreamMode, CODE_END_OF_STREAM, CODE_FAILURE, CODE_OK, CODE_PACKET_MISMATCH,
};
pub use params::{CodecParams, CodecParamsError, MAX_PARAM_STR_LEN};
pub use session::{DecodeOutcome, Session, SessionConfig, SessionState};
pub use shm::{ShmDescriptor, ShmError, ShmRegion};
