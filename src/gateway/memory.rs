//! In-memory gateway backend.
//!
//! Stores an "encoded" stream as a sequence of packets in process memory:
//! encode sessions append packets, decode sessions replay them. This
//! exercises the full session contract (lifecycle, sequencing, sentinel
//! conditions and the shared-memory slot protocol) without a native
//! codec library, and doubles as the reference implementation of the
//! [`FrameCodecGateway`] contract.

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{
    FrameCodecGateway, OpenReport, OpenRequest, PullOutcome, StreamMode, CODE_FAILURE, CODE_OK,
};
use crate::shm::ShmRegion;

/// Hardware backends the loopback engine pretends to support. Requests
/// for anything else fall back to the software path, like real codec
/// wrappers do when device context creation fails.
const HW_BACKENDS: [&str; 3] = ["cuda", "vaapi", "videotoolbox"];

/// One stored packet of an in-memory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MemoryPacket {
    Frame(Vec<u8>),
    /// A packet the decoder cannot resynchronize past.
    Corrupt,
}

/// An in-memory "compressed" stream: stream geometry plus a packet
/// sequence. Shared between the producing and consuming gateway through
/// a [`StreamHandle`].
#[derive(Debug, Default)]
pub struct MemoryStream {
    width: u32,
    height: u32,
    packets: Vec<MemoryPacket>,
}

/// Shared handle to a [`MemoryStream`].
pub type StreamHandle = Arc<Mutex<MemoryStream>>;

impl MemoryStream {
    /// New empty stream with no geometry. A decode session cannot open
    /// it until an encode session (or [`push_frame`](Self::push_frame)
    /// after [`with_geometry`](Self::with_geometry)) has populated it.
    pub fn new() -> StreamHandle {
        Arc::new(Mutex::new(Self::default()))
    }

    /// New empty stream with a fixed geometry, ready to be filled with
    /// frames for decode tests.
    pub fn with_geometry(width: u32, height: u32) -> StreamHandle {
        Arc::new(Mutex::new(Self {
            width,
            height,
            packets: Vec::new(),
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of stored frame packets (corrupt packets excluded).
    pub fn frame_count(&self) -> usize {
        self.packets
            .iter()
            .filter(|p| matches!(p, MemoryPacket::Frame(_)))
            .count()
    }

    /// Append one raw RGB frame.
    pub fn push_frame(&mut self, rgb: Vec<u8>) {
        self.packets.push(MemoryPacket::Frame(rgb));
    }

    /// Append a packet that will trigger a packet-mismatch condition
    /// when a decoder reaches it.
    pub fn push_corrupt(&mut self) {
        self.packets.push(MemoryPacket::Corrupt);
    }
}

/// Loopback [`FrameCodecGateway`] over a [`MemoryStream`].
pub struct MemoryGateway {
    stream: StreamHandle,
    mode: Option<StreamMode>,
    width: u32,
    height: u32,
    /// Read position for decode mode.
    cursor: usize,
    frames: u64,
    /// Latched after the first corrupt packet; the stream is not
    /// recoverable past it.
    desynced: bool,
    shm: Option<ShmRegion>,
    released: bool,
}

impl MemoryGateway {
    pub fn new(stream: StreamHandle) -> Self {
        Self {
            stream,
            mode: None,
            width: 0,
            height: 0,
            cursor: 0,
            frames: 0,
            desynced: false,
            shm: None,
            released: false,
        }
    }

    fn frame_byte_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

impl FrameCodecGateway for MemoryGateway {
    fn open(&mut self, request: OpenRequest<'_>) -> OpenReport {
        if self.released || self.mode.is_some() {
            return OpenReport::Failed { code: CODE_FAILURE };
        }

        let (width, height) = match request.mode {
            StreamMode::Decode => {
                let stream = self.stream.lock().unwrap();
                (stream.width, stream.height)
            }
            StreamMode::Encode => (request.codec_params.width, request.codec_params.height),
        };
        if width == 0 || height == 0 {
            return OpenReport::Failed { code: CODE_FAILURE };
        }

        if let Some(desc) = request.shm {
            match ShmRegion::open(&desc.name, desc.size) {
                Ok(region) => self.shm = Some(region),
                Err(_) => return OpenReport::Failed { code: CODE_FAILURE },
            }
        }

        if request.mode == StreamMode::Encode {
            let mut stream = self.stream.lock().unwrap();
            stream.width = width;
            stream.height = height;
        }

        self.mode = Some(request.mode);
        self.width = width;
        self.height = height;
        debug!(
            stream = request.target,
            mode = request.mode.as_raw(),
            width,
            height,
            "opened in-memory stream"
        );

        if request.hw_enabled && HW_BACKENDS.contains(&request.hw_backend) {
            OpenReport::ReadyHw { width, height }
        } else {
            OpenReport::Ready { width, height }
        }
    }

    fn pull_frame(&mut self) -> PullOutcome {
        if self.released || self.mode != Some(StreamMode::Decode) {
            return PullOutcome::Failure(CODE_FAILURE);
        }
        if self.desynced {
            return PullOutcome::PacketMismatch;
        }

        let stream = self.stream.lock().unwrap();
        match stream.packets.get(self.cursor) {
            None => PullOutcome::EndOfStream,
            Some(MemoryPacket::Corrupt) => {
                self.desynced = true;
                PullOutcome::PacketMismatch
            }
            Some(MemoryPacket::Frame(data)) => {
                if data.len() != self.frame_byte_size() {
                    return PullOutcome::Failure(CODE_FAILURE);
                }
                let data = data.clone();
                drop(stream);
                self.cursor += 1;
                self.frames += 1;
                PullOutcome::Frame(data)
            }
        }
    }

    fn pull_frame_into_shm(&mut self, offset: usize) -> bool {
        let frame_size = self.frame_byte_size();
        match &self.shm {
            Some(region) if region.len().saturating_sub(offset) >= frame_size => {}
            _ => return false,
        }
        match self.pull_frame() {
            PullOutcome::Frame(data) => match &self.shm {
                Some(region) => region.write(offset, &data).is_ok(),
                None => false,
            },
            _ => false,
        }
    }

    fn push_frame(&mut self, rgb: &[u8]) -> i32 {
        if self.released || self.mode != Some(StreamMode::Encode) {
            return CODE_FAILURE;
        }
        if rgb.len() != self.frame_byte_size() {
            return CODE_FAILURE;
        }
        self.stream.lock().unwrap().push_frame(rgb.to_vec());
        self.frames += 1;
        CODE_OK
    }

    fn push_frame_from_shm(&mut self, offset: usize) -> bool {
        let frame_size = self.frame_byte_size();
        let bytes = match &self.shm {
            Some(region) => match region.read(offset, frame_size) {
                Ok(bytes) => bytes,
                Err(_) => return false,
            },
            None => return false,
        };
        self.push_frame(&bytes) == CODE_OK
    }

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn finalize(&mut self) {
        // Nothing buffered in the loopback engine; a native backend would
        // drain its encoder here.
    }

    fn release(&mut self) {
        self.released = true;
        self.mode = None;
        self.frames = 0;
        self.shm = None;
    }
}

impl std::fmt::Debug for MemoryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGateway")
            .field("mode", &self.mode)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cursor", &self.cursor)
            .field("frames", &self.frames)
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CodecParams;

    fn open_decode(gateway: &mut MemoryGateway) -> OpenReport {
        gateway.open(OpenRequest {
            target: "mem://test",
            mode: StreamMode::Decode,
            hw_enabled: false,
            hw_backend: "cuda",
            shm: None,
            codec_params: &CodecParams::default(),
        })
    }

    #[test]
    fn test_decode_replays_pushed_frames() {
        let handle = MemoryStream::with_geometry(2, 2);
        handle.lock().unwrap().push_frame(vec![7u8; 12]);

        let mut gateway = MemoryGateway::new(handle);
        assert_eq!(
            open_decode(&mut gateway),
            OpenReport::Ready {
                width: 2,
                height: 2
            }
        );
        assert_eq!(gateway.pull_frame(), PullOutcome::Frame(vec![7u8; 12]));
        assert_eq!(gateway.frame_count(), 1);
        assert_eq!(gateway.pull_frame(), PullOutcome::EndOfStream);
    }

    #[test]
    fn test_open_fails_without_geometry() {
        let mut gateway = MemoryGateway::new(MemoryStream::new());
        assert_eq!(
            open_decode(&mut gateway),
            OpenReport::Failed { code: CODE_FAILURE }
        );
    }

    #[test]
    fn test_corrupt_packet_latches_mismatch() {
        let handle = MemoryStream::with_geometry(1, 1);
        {
            let mut stream = handle.lock().unwrap();
            stream.push_corrupt();
            stream.push_frame(vec![0u8; 3]);
        }

        let mut gateway = MemoryGateway::new(handle);
        open_decode(&mut gateway);
        assert_eq!(gateway.pull_frame(), PullOutcome::PacketMismatch);
        // Latched: the later valid frame is unreachable.
        assert_eq!(gateway.pull_frame(), PullOutcome::PacketMismatch);
        assert_eq!(gateway.frame_count(), 0);
    }

    #[test]
    fn test_push_rejects_wrong_size_and_wrong_mode() {
        let handle = MemoryStream::new();
        let mut gateway = MemoryGateway::new(Arc::clone(&handle));
        let params = CodecParams {
            width: 2,
            height: 1,
            ..Default::default()
        };
        gateway.open(OpenRequest {
            target: "mem://out",
            mode: StreamMode::Encode,
            hw_enabled: false,
            hw_backend: "cuda",
            shm: None,
            codec_params: &params,
        });

        assert_eq!(gateway.push_frame(&[0u8; 5]), CODE_FAILURE);
        assert_eq!(gateway.push_frame(&[0u8; 6]), CODE_OK);
        assert_eq!(handle.lock().unwrap().frame_count(), 1);
        // Pull on an encode gateway is a generic failure, not a sentinel.
        assert_eq!(gateway.pull_frame(), PullOutcome::Failure(CODE_FAILURE));
    }

    #[test]
    fn test_hw_backend_fallback() {
        let handle = MemoryStream::with_geometry(1, 1);
        let mut gateway = MemoryGateway::new(Arc::clone(&handle));
        let report = gateway.open(OpenRequest {
            target: "mem://hw",
            mode: StreamMode::Decode,
            hw_enabled: true,
            hw_backend: "cuda",
            shm: None,
            codec_params: &CodecParams::default(),
        });
        assert_eq!(
            report,
            OpenReport::ReadyHw {
                width: 1,
                height: 1
            }
        );

        let mut fallback = MemoryGateway::new(handle);
        let report = fallback.open(OpenRequest {
            target: "mem://hw",
            mode: StreamMode::Decode,
            hw_enabled: true,
            hw_backend: "not-a-backend",
            shm: None,
            codec_params: &CodecParams::default(),
        });
        assert_eq!(
            report,
            OpenReport::Ready {
                width: 1,
                height: 1
            }
        );
    }

    #[test]
    fn test_release_is_idempotent_and_resets_counter() {
        let handle = MemoryStream::with_geometry(1, 1);
        handle.lock().unwrap().push_frame(vec![0u8; 3]);

        let mut gateway = MemoryGateway::new(handle);
        open_decode(&mut gateway);
        gateway.pull_frame();
        assert_eq!(gateway.frame_count(), 1);

        gateway.release();
        gateway.release();
        assert_eq!(gateway.frame_count(), 0);
        assert_eq!(gateway.pull_frame(), PullOutcome::Failure(CODE_FAILURE));
    }
}
