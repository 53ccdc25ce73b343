//! Shared-memory frame exchange.
//!
//! A session can route raw frame bytes through a named shared-memory
//! region instead of process-local buffers, so another process can
//! produce or consume frames without an extra copy through this process.
//!
//! The region itself is a concurrency hazard by construction: it is
//! shared across process boundaries and no locking is imposed over it.
//! Producer/consumer ordering (decode-to-slot then signal, read then
//! acknowledge, ...) is an external protocol. The guarantees made here
//! are narrower: a session never reads or writes outside its configured
//! bounds, and undersized slots are reported, never silently truncated.

use shared_memory_extended::{Shmem, ShmemConf};
use tracing::debug;

/// Where a session's frame slot lives inside a shared region.
///
/// Supplied at session construction and never mutated. The region's
/// lifecycle is managed externally by whichever process creates it; the
/// descriptor only tells the session how to find its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShmDescriptor {
    /// OS identifier of the shared region.
    pub name: String,
    /// Total region size in bytes. Must hold at least one frame.
    pub size: usize,
    /// Byte offset within the region at which this session's slot begins.
    pub offset: usize,
}

impl ShmDescriptor {
    pub fn new(name: impl Into<String>, size: usize, offset: usize) -> Self {
        Self {
            name: name.into(),
            size,
            offset,
        }
    }
}

/// Shared-memory access errors.
#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    #[error("failed to create shared memory region `{name}`: {reason}")]
    Create { name: String, reason: String },

    #[error("failed to open shared memory region `{name}`: {reason}")]
    Open { name: String, reason: String },

    #[error("shared memory access out of bounds: offset {offset} + len {len} > size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
}

/// A mapped shared-memory region with bounds-checked slot access.
pub struct ShmRegion {
    shmem: Shmem,
    size: usize,
}

impl ShmRegion {
    /// Create a new region under `name`. The creating `ShmRegion` owns
    /// the mapping; dropping it removes the region.
    pub fn create(name: &str, size: usize) -> Result<Self, ShmError> {
        let shmem = ShmemConf::new()
            .size(size)
            .os_id(name)
            .create()
            .map_err(|e| ShmError::Create {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(name, size, "created shared memory region");
        Ok(Self { shmem, size })
    }

    /// Open an existing region created by another process (or this one).
    pub fn open(name: &str, size: usize) -> Result<Self, ShmError> {
        let shmem = ShmemConf::new()
            .size(size)
            .os_id(name)
            .open()
            .map_err(|e| ShmError::Open {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        debug!(name, size, "opened shared memory region");
        Ok(Self { shmem, size })
    }

    /// Region size in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<(), ShmError> {
        if offset.saturating_add(len) > self.size {
            return Err(ShmError::OutOfBounds {
                offset,
                len,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Copy `data` into the region at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), ShmError> {
        self.check_bounds(offset, data.len())?;
        // SAFETY: bounds were checked against the mapped size and the
        // mapping lives as long as `self`.
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                self.shmem.as_ptr().add(offset),
                data.len(),
            );
        }
        Ok(())
    }

    /// Copy `len` bytes out of the region starting at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>, ShmError> {
        self.check_bounds(offset, len)?;
        // SAFETY: bounds were checked against the mapped size and the
        // mapping lives as long as `self`.
        unsafe {
            let slice = std::slice::from_raw_parts(self.shmem.as_ptr().add(offset), len);
            Ok(slice.to_vec())
        }
    }
}

impl std::fmt::Debug for ShmRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShmRegion")
            .field("size", &self.size)
            .finish()
    }
}
