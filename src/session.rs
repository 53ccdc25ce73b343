//! Stream session lifecycle and frame sequencing.
//!
//! A [`Session`] owns one stream handle exclusively: it opens the stream
//! through its [`FrameCodecGateway`], records the negotiated geometry,
//! sequences decode/encode calls, and releases the handle exactly once.
//! Calls are sequential and blocking; one frame operation in flight per
//! session at a time, with no internal timeout or cancellation. A caller
//! that wants to stop mid-stream simply stops calling and finalizes.

use std::time::Instant;

use ndarray::Array3;
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::frame::{DecodedFrame, RGB_CHANNELS};
use crate::gateway::{
    FrameCodecGateway, OpenReport, OpenRequest, PullOutcome, StreamMode, CODE_END_OF_STREAM,
    CODE_FAILURE, CODE_OK, CODE_PACKET_MISMATCH,
};
use crate::params::CodecParams;
use crate::shm::ShmDescriptor;

/// Lifecycle state of a [`Session`].
///
/// Transitions are one-way: `Created -> Ready | ReadyHw | Failed`
/// (initialization) and `* -> Finalized` (finalize). Frame operations
/// are permitted only in `Ready` and `ReadyHw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, stream not yet opened.
    Created,
    /// Initialization succeeded on the software path.
    Ready,
    /// Initialization succeeded with hardware acceleration active.
    ReadyHw,
    /// Initialization failed; the native handle has been released.
    Failed,
    /// Finalized; all resources released.
    Finalized,
}

impl SessionState {
    /// Whether frame operations are permitted in this state.
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::Ready | SessionState::ReadyHw)
    }
}

/// Session construction parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target locator: a file path or stream URL.
    pub target: String,
    pub mode: StreamMode,
    pub hw_enabled: bool,
    /// Hardware backend identifier. Defaults to "cuda".
    pub hw_backend: String,
    /// Shared-memory channel descriptor, when frame bytes should be
    /// exchanged through a shared region instead of process-local
    /// buffers.
    pub shm: Option<ShmDescriptor>,
    pub codec_params: CodecParams,
}

impl SessionConfig {
    pub fn new(target: impl Into<String>, mode: StreamMode) -> Self {
        Self {
            target: target.into(),
            mode,
            hw_enabled: false,
            hw_backend: "cuda".to_string(),
            shm: None,
            codec_params: CodecParams::default(),
        }
    }

    pub fn hw(mut self, enabled: bool) -> Self {
        self.hw_enabled = enabled;
        self
    }

    pub fn hw_backend(mut self, name: impl Into<String>) -> Self {
        self.hw_backend = name.into();
        self
    }

    pub fn shm(mut self, descriptor: ShmDescriptor) -> Self {
        self.shm = Some(descriptor);
        self
    }

    pub fn codec_params(mut self, params: CodecParams) -> Self {
        self.codec_params = params;
        self
    }
}

/// Outcome of one decode call.
///
/// The terminal conditions are plain variants rather than errors: they
/// are expected ends of a stream's life, and the caller, not the
/// session, decides when to finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// One decoded frame of exactly `width * height * 3` RGB bytes.
    Frame(DecodedFrame),
    /// The stream is exhausted. Terminal; finalize the session.
    EndOfStream,
    /// The gateway could not resynchronize to the next packet boundary.
    /// Terminal, distinct from a generic failure so callers can log and
    /// alert differently.
    PacketMismatch,
    /// Any other gateway failure code, surfaced without interpretation.
    Failure(i32),
}

impl DecodeOutcome {
    /// Raw sentinel code for non-frame outcomes, matching the native
    /// gateway encoding: `-5` end of stream, `-4` packet mismatch, `1`
    /// for anything else. The underlying gateway code of a
    /// [`Failure`](Self::Failure) stays available on the variant itself.
    pub fn sentinel_code(&self) -> Option<i32> {
        match self {
            DecodeOutcome::Frame(_) => None,
            DecodeOutcome::EndOfStream => Some(CODE_END_OF_STREAM),
            DecodeOutcome::PacketMismatch => Some(CODE_PACKET_MISMATCH),
            DecodeOutcome::Failure(_) => Some(CODE_FAILURE),
        }
    }
}

/// A single media stream session over a codec gateway.
pub struct Session<G: FrameCodecGateway> {
    gateway: G,
    config: SessionConfig,
    state: SessionState,
    width: u32,
    height: u32,
    /// Frames serviced by this session. Mirrors the gateway's
    /// authoritative count; divergence is a protocol bug.
    local_seq: u64,
}

impl<G: FrameCodecGateway> Session<G> {
    /// Allocate a session over `gateway`. The stream is not opened until
    /// [`initialize`](Self::initialize) is called.
    pub fn new(gateway: G, config: SessionConfig) -> Self {
        Self {
            gateway,
            config,
            state: SessionState::Created,
            width: 0,
            height: 0,
            local_seq: 0,
        }
    }

    /// Open and configure the underlying stream.
    ///
    /// Blocks for as long as stream probing and hardware context setup
    /// take; a caller that cares about startup latency must bound it
    /// externally. On failure the provisionally allocated native handle
    /// is released before returning, so nothing is left half-allocated.
    pub fn initialize(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Created {
            return Err(SessionError::NotReady(self.state));
        }

        if let Err(e) = self.config.codec_params.validate(self.config.mode) {
            self.gateway.release();
            self.state = SessionState::Failed;
            return Err(e.into());
        }

        let started = Instant::now();
        let report = self.gateway.open(OpenRequest {
            target: &self.config.target,
            mode: self.config.mode,
            hw_enabled: self.config.hw_enabled,
            hw_backend: &self.config.hw_backend,
            shm: self.config.shm.as_ref(),
            codec_params: &self.config.codec_params,
        });

        match report {
            OpenReport::Ready { width, height } | OpenReport::ReadyHw { width, height } => {
                self.width = width;
                self.height = height;
                self.state = if matches!(report, OpenReport::ReadyHw { .. }) {
                    SessionState::ReadyHw
                } else {
                    SessionState::Ready
                };
                info!(
                    stream = %self.config.target,
                    width,
                    height,
                    hw = self.state == SessionState::ReadyHw,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "stream opened"
                );
                Ok(())
            }
            OpenReport::Failed { code } => {
                self.gateway.release();
                self.state = SessionState::Failed;
                warn!(
                    stream = %self.config.target,
                    code,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "failed to open stream"
                );
                Err(SessionError::Initialization {
                    target: self.config.target.clone(),
                    code,
                })
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> StreamMode {
        self.config.mode
    }

    /// Negotiated image width. Zero until initialization succeeds and
    /// again after finalization.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Negotiated image height. Zero until initialization succeeds and
    /// again after finalization.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw byte size of one frame at the negotiated geometry.
    pub fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * RGB_CHANNELS
    }

    /// Frames serviced by this session so far.
    pub fn frames_processed(&self) -> u64 {
        self.local_seq
    }

    /// Frame count as reported by the gateway. Authoritative; equal to
    /// [`frames_processed`](Self::frames_processed) at every observation
    /// point unless a protocol bug made them diverge.
    pub fn native_frames_processed(&self) -> u64 {
        self.gateway.frame_count()
    }

    fn ensure_ready(&self) -> SessionResult<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(SessionError::NotReady(self.state))
        }
    }

    fn note_frame_serviced(&mut self) {
        self.local_seq += 1;
        let native = self.gateway.frame_count();
        debug_assert_eq!(self.local_seq, native, "frame counter diverged from gateway");
        if self.local_seq != native {
            warn!(
                local = self.local_seq,
                native, "frame counter diverged; adopting gateway count"
            );
            self.local_seq = native;
        }
    }

    fn check_slot(&self, offset: usize) -> SessionResult<()> {
        let desc = self
            .config
            .shm
            .as_ref()
            .ok_or(SessionError::SharedMemoryDisabled)?;
        let needed = self.frame_byte_size();
        if desc.size.saturating_sub(offset) < needed {
            return Err(SessionError::SlotTooSmall {
                needed,
                offset,
                size: desc.size,
            });
        }
        Ok(())
    }

    /// Pull the next decodable frame.
    ///
    /// The terminal conditions ([`DecodeOutcome::EndOfStream`],
    /// [`DecodeOutcome::PacketMismatch`]) do not finalize the session;
    /// that stays the caller's move.
    pub fn decode_frame(&mut self) -> SessionResult<DecodeOutcome> {
        self.ensure_ready()?;
        match self.gateway.pull_frame() {
            PullOutcome::Frame(data) => {
                let expected = self.frame_byte_size();
                if data.len() != expected {
                    return Err(SessionError::InvalidFrameBuffer {
                        expected,
                        actual: data.len(),
                    });
                }
                self.note_frame_serviced();
                Ok(DecodeOutcome::Frame(DecodedFrame::new(
                    data,
                    self.width,
                    self.height,
                )))
            }
            PullOutcome::EndOfStream => {
                debug!(stream = %self.config.target, "end of stream");
                Ok(DecodeOutcome::EndOfStream)
            }
            PullOutcome::PacketMismatch => {
                warn!(stream = %self.config.target, "packet mismatch; stream is not recoverable");
                Ok(DecodeOutcome::PacketMismatch)
            }
            PullOutcome::Failure(code) => Ok(DecodeOutcome::Failure(code)),
        }
    }

    /// Pull the next frame and write its bytes directly into the
    /// session's shared-memory slot at `offset`, skipping the copy
    /// through this process.
    ///
    /// The slot is checked to hold one full frame before the gateway is
    /// touched; undersized slots fail, never truncate.
    pub fn decode_frame_to_shm(&mut self, offset: usize) -> SessionResult<()> {
        self.ensure_ready()?;
        self.check_slot(offset)?;
        if self.gateway.pull_frame_into_shm(offset) {
            self.note_frame_serviced();
            Ok(())
        } else {
            Err(SessionError::CodecFailure(CODE_FAILURE))
        }
    }

    /// Push one frame of exactly `width * height * 3` raw RGB bytes for
    /// encoding. The frame counter moves only on success.
    pub fn encode_frame(&mut self, rgb: &[u8]) -> SessionResult<()> {
        self.ensure_ready()?;
        let expected = self.frame_byte_size();
        if rgb.len() != expected {
            return Err(SessionError::InvalidFrameBuffer {
                expected,
                actual: rgb.len(),
            });
        }
        match self.gateway.push_frame(rgb) {
            CODE_OK => {
                self.note_frame_serviced();
                Ok(())
            }
            code => Err(SessionError::CodecFailure(code)),
        }
    }

    /// Push one frame given as a `height x width x 3` pixel array.
    ///
    /// Arrays with any other shape are rejected without touching the
    /// gateway; non-contiguous arrays are serialized row-major first.
    pub fn encode_frame_array(&mut self, frame: &Array3<u8>) -> SessionResult<()> {
        self.ensure_ready()?;
        if frame.dim() != (self.height as usize, self.width as usize, RGB_CHANNELS) {
            return Err(SessionError::InvalidFrameBuffer {
                expected: self.frame_byte_size(),
                actual: frame.len(),
            });
        }
        let row_major = frame.as_standard_layout();
        let bytes = row_major
            .as_slice()
            .expect("standard layout array is contiguous");
        self.encode_frame(bytes)
    }

    /// Push one frame read from the session's shared-memory slot at
    /// `offset` instead of taking it as an argument.
    pub fn encode_frame_from_shm(&mut self, offset: usize) -> SessionResult<()> {
        self.ensure_ready()?;
        self.check_slot(offset)?;
        if self.gateway.push_frame_from_shm(offset) {
            self.note_frame_serviced();
            Ok(())
        } else {
            Err(SessionError::CodecFailure(CODE_FAILURE))
        }
    }

    /// Flush pending encode buffers and release the native handle.
    ///
    /// Safe to call more than once. After the first call the session
    /// reports zero geometry and counters and every frame operation
    /// fails with [`SessionError::NotReady`].
    pub fn finalize(&mut self) {
        if self.state == SessionState::Finalized {
            return;
        }
        if self.state.is_ready() {
            self.gateway.finalize();
        }
        self.gateway.release();
        self.width = 0;
        self.height = 0;
        self.local_seq = 0;
        self.state = SessionState::Finalized;
        debug!(stream = %self.config.target, "session finalized");
    }
}

impl<G: FrameCodecGateway> Drop for Session<G> {
    fn drop(&mut self) {
        // Backstop so the native handle is released exactly once even if
        // the caller never finalized explicitly.
        self.finalize();
    }
}

impl<G: FrameCodecGateway> std::fmt::Debug for Session<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.config.target)
            .field("mode", &self.config.mode)
            .field("state", &self.state)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("frames", &self.local_seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MemoryGateway, MemoryStream, StreamHandle};
    use crate::shm::ShmRegion;
    use std::sync::Arc;

    fn rgb_frame(width: u32, height: u32, seed: u8) -> Vec<u8> {
        let len = width as usize * height as usize * RGB_CHANNELS;
        (0..len).map(|i| (i as u8).wrapping_add(seed)).collect()
    }

    fn decode_session(handle: StreamHandle) -> Session<MemoryGateway> {
        Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://decode", StreamMode::Decode),
        )
    }

    fn encode_session(handle: StreamHandle, width: u32, height: u32) -> Session<MemoryGateway> {
        let params = CodecParams {
            width,
            height,
            bitrate: 2_000_000,
            fps: 30,
            ..Default::default()
        };
        Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://encode", StreamMode::Encode).codec_params(params),
        )
    }

    fn shm_name(tag: &str) -> String {
        format!("fp_sess_{}_{tag}", std::process::id())
    }

    #[test]
    fn test_full_hd_decode_returns_exact_frame_size() {
        let handle = MemoryStream::with_geometry(1920, 1080);
        handle.lock().unwrap().push_frame(vec![0u8; 6_220_800]);

        let mut session = decode_session(handle);
        session.initialize().unwrap();
        assert_eq!(session.frame_byte_size(), 6_220_800);

        match session.decode_frame().unwrap() {
            DecodeOutcome::Frame(frame) => {
                assert_eq!(frame.as_bytes().len(), 6_220_800);
                assert_eq!((frame.width(), frame.height()), (1920, 1080));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_counters_track_successful_decodes() {
        let handle = MemoryStream::with_geometry(8, 4);
        for seed in 0..10 {
            handle.lock().unwrap().push_frame(rgb_frame(8, 4, seed));
        }

        let mut session = decode_session(handle);
        session.initialize().unwrap();
        for expected in 1..=10u64 {
            assert!(matches!(
                session.decode_frame().unwrap(),
                DecodeOutcome::Frame(_)
            ));
            assert_eq!(session.frames_processed(), expected);
            assert_eq!(session.native_frames_processed(), expected);
        }
        assert_eq!(
            session.decode_frame().unwrap().sentinel_code(),
            Some(CODE_END_OF_STREAM)
        );
        // End of stream does not move the counter or close the session.
        assert_eq!(session.frames_processed(), 10);
        assert!(session.state().is_ready());
    }

    #[test]
    fn test_end_of_stream_is_terminal() {
        let handle = MemoryStream::with_geometry(2, 2);
        let mut session = decode_session(handle);
        session.initialize().unwrap();

        assert_eq!(session.decode_frame().unwrap(), DecodeOutcome::EndOfStream);
        assert_eq!(session.decode_frame().unwrap(), DecodeOutcome::EndOfStream);
    }

    #[test]
    fn test_packet_mismatch_is_terminal_and_distinct() {
        let handle = MemoryStream::with_geometry(2, 2);
        {
            let mut stream = handle.lock().unwrap();
            stream.push_frame(rgb_frame(2, 2, 1));
            stream.push_corrupt();
            stream.push_frame(rgb_frame(2, 2, 2));
        }

        let mut session = decode_session(handle);
        session.initialize().unwrap();
        assert!(matches!(
            session.decode_frame().unwrap(),
            DecodeOutcome::Frame(_)
        ));

        let outcome = session.decode_frame().unwrap();
        assert_eq!(outcome, DecodeOutcome::PacketMismatch);
        assert_eq!(outcome.sentinel_code(), Some(CODE_PACKET_MISMATCH));
        // Terminal: the valid frame behind the corrupt packet stays
        // unreachable.
        assert_eq!(
            session.decode_frame().unwrap(),
            DecodeOutcome::PacketMismatch
        );
        assert_eq!(session.frames_processed(), 1);
    }

    #[test]
    fn test_operations_require_ready_state() {
        let mut session = decode_session(MemoryStream::with_geometry(2, 2));
        assert!(matches!(
            session.decode_frame(),
            Err(SessionError::NotReady(SessionState::Created))
        ));
        assert!(matches!(
            session.encode_frame(&[0u8; 12]),
            Err(SessionError::NotReady(SessionState::Created))
        ));
    }

    #[test]
    fn test_initialization_failure_releases_and_fails() {
        // No geometry: the gateway cannot open the stream.
        let mut session = decode_session(MemoryStream::new());
        let err = session.initialize().unwrap_err();
        assert!(matches!(err, SessionError::Initialization { .. }));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.native_frames_processed(), 0);

        assert!(matches!(
            session.decode_frame(),
            Err(SessionError::NotReady(SessionState::Failed))
        ));
    }

    #[test]
    fn test_invalid_params_fail_initialization() {
        let handle = MemoryStream::new();
        // Encode without dimensions is rejected before the gateway is
        // asked to open anything.
        let mut session = Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://encode", StreamMode::Encode),
        );
        let err = session.initialize().unwrap_err();
        assert!(matches!(err, SessionError::InvalidParams(_)));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_hw_request_reports_ready_hw_with_fallback() {
        let handle = MemoryStream::with_geometry(2, 2);
        let mut session = Session::new(
            MemoryGateway::new(Arc::clone(&handle)),
            SessionConfig::new("mem://hw", StreamMode::Decode).hw(true),
        );
        session.initialize().unwrap();
        assert_eq!(session.state(), SessionState::ReadyHw);

        let mut fallback = Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://hw", StreamMode::Decode)
                .hw(true)
                .hw_backend("quantum"),
        );
        fallback.initialize().unwrap();
        assert_eq!(fallback.state(), SessionState::Ready);
    }

    #[test]
    fn test_encode_rejects_wrong_buffer_size() {
        let mut session = encode_session(MemoryStream::new(), 4, 2);
        session.initialize().unwrap();

        let err = session.encode_frame(&[0u8; 23]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidFrameBuffer {
                expected: 24,
                actual: 23
            }
        ));
        assert_eq!(session.frames_processed(), 0);

        session.encode_frame(&rgb_frame(4, 2, 0)).unwrap();
        assert_eq!(session.frames_processed(), 1);
    }

    #[test]
    fn test_encode_array_shape_check() {
        let mut session = encode_session(MemoryStream::new(), 4, 2);
        session.initialize().unwrap();

        let good = Array3::<u8>::zeros((2, 4, 3));
        session.encode_frame_array(&good).unwrap();
        assert_eq!(session.frames_processed(), 1);

        // Transposed shape has the right element count but the wrong
        // layout; it must be rejected, not reinterpreted.
        let bad = Array3::<u8>::zeros((4, 2, 3));
        assert!(matches!(
            session.encode_frame_array(&bad),
            Err(SessionError::InvalidFrameBuffer { .. })
        ));
        assert_eq!(session.frames_processed(), 1);
    }

    #[test]
    fn test_round_trip_preserves_frame_count_and_geometry() {
        let handle = MemoryStream::new();

        let mut encoder = encode_session(Arc::clone(&handle), 6, 4);
        encoder.initialize().unwrap();
        for seed in 0..5 {
            encoder.encode_frame(&rgb_frame(6, 4, seed)).unwrap();
        }
        assert_eq!(encoder.frames_processed(), 5);
        encoder.finalize();

        let mut decoder = decode_session(handle);
        decoder.initialize().unwrap();
        assert_eq!((decoder.width(), decoder.height()), (6, 4));

        let mut decoded = 0u64;
        loop {
            match decoder.decode_frame().unwrap() {
                DecodeOutcome::Frame(frame) => {
                    assert_eq!((frame.width(), frame.height()), (6, 4));
                    decoded += 1;
                }
                DecodeOutcome::EndOfStream => break,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(decoded, 5);
        assert_eq!(decoder.frames_processed(), 5);
    }

    #[test]
    fn test_finalize_is_idempotent_and_resets() {
        let handle = MemoryStream::with_geometry(2, 2);
        handle.lock().unwrap().push_frame(rgb_frame(2, 2, 0));

        let mut session = decode_session(handle);
        session.initialize().unwrap();
        session.decode_frame().unwrap();
        assert_eq!(session.frames_processed(), 1);

        session.finalize();
        session.finalize();
        assert_eq!(session.state(), SessionState::Finalized);
        assert_eq!((session.width(), session.height()), (0, 0));
        assert_eq!(session.frames_processed(), 0);
        assert_eq!(session.native_frames_processed(), 0);
        assert!(matches!(
            session.decode_frame(),
            Err(SessionError::NotReady(SessionState::Finalized))
        ));
    }

    #[test]
    fn test_decode_to_shm_writes_slot() {
        let name = shm_name("dec");
        let frame_size = 4 * 2 * RGB_CHANNELS;
        let region = ShmRegion::create(&name, frame_size).unwrap();

        let handle = MemoryStream::with_geometry(4, 2);
        let frame = rgb_frame(4, 2, 9);
        handle.lock().unwrap().push_frame(frame.clone());

        let mut session = Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://shm-dec", StreamMode::Decode)
                .shm(ShmDescriptor::new(&name, frame_size, 0)),
        );
        session.initialize().unwrap();

        session.decode_frame_to_shm(0).unwrap();
        assert_eq!(session.frames_processed(), 1);
        assert_eq!(region.read(0, frame_size).unwrap(), frame);
    }

    #[test]
    fn test_encode_from_shm_slot() {
        let name = shm_name("enc");
        let frame_size = 4 * 2 * RGB_CHANNELS;
        let region = ShmRegion::create(&name, frame_size).unwrap();
        let frame = rgb_frame(4, 2, 3);
        region.write(0, &frame).unwrap();

        let handle = MemoryStream::new();
        let params = CodecParams {
            width: 4,
            height: 2,
            ..Default::default()
        };
        let mut session = Session::new(
            MemoryGateway::new(Arc::clone(&handle)),
            SessionConfig::new("mem://shm-enc", StreamMode::Encode)
                .codec_params(params)
                .shm(ShmDescriptor::new(&name, frame_size, 0)),
        );
        session.initialize().unwrap();

        session.encode_frame_from_shm(0).unwrap();
        assert_eq!(session.frames_processed(), 1);
        assert_eq!(handle.lock().unwrap().frame_count(), 1);
    }

    #[test]
    fn test_shm_slot_too_small_rejected_before_gateway() {
        let name = shm_name("small");
        let frame_size = 4 * 2 * RGB_CHANNELS;
        let _region = ShmRegion::create(&name, frame_size).unwrap();

        let handle = MemoryStream::with_geometry(4, 2);
        handle.lock().unwrap().push_frame(rgb_frame(4, 2, 0));

        let mut session = Session::new(
            MemoryGateway::new(handle),
            SessionConfig::new("mem://shm-small", StreamMode::Decode)
                .shm(ShmDescriptor::new(&name, frame_size, 0)),
        );
        session.initialize().unwrap();

        // Offset 1 leaves less than one frame of slot.
        let err = session.decode_frame_to_shm(1).unwrap_err();
        assert!(matches!(err, SessionError::SlotTooSmall { .. }));
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_shm_operations_require_channel() {
        let handle = MemoryStream::with_geometry(2, 2);
        let mut session = decode_session(handle);
        session.initialize().unwrap();
        assert!(matches!(
            session.decode_frame_to_shm(0),
            Err(SessionError::SharedMemoryDisabled)
        ));
    }
}
