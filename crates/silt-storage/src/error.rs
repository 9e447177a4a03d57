//! Error types for the storage-file format, builder, and reader.

use thiserror::Error;

use silt_common::constants::{MAX_CONFIG_SLOTS, MAX_PAGE_SIZE_LOG2, MIN_PAGE_SIZE_LOG2};

use crate::file::IoError;

/// Result type for storage-format operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors produced by the packed formats, the layout engine, and the
/// config-block chain reader.
#[derive(Debug, Error)]
#[allow(missing_docs)] // Fields are documented by variant docs
pub enum StorageError {
    /// Page size exponent outside the supported range.
    #[error(
        "invalid page size exponent {value}: must be in {MIN_PAGE_SIZE_LOG2}..={MAX_PAGE_SIZE_LOG2}"
    )]
    InvalidPageSizeLog2 { value: u8 },

    /// A page device must contain at least one page.
    #[error("page count must be non-zero")]
    ZeroPageCount,

    /// The builder has already been flushed.
    #[error("storage file builder is finalized; no further operations are allowed")]
    BuilderFinalized,

    /// A relative offset does not fit its on-disk field.
    #[error("relative offset {value} does not fit in {bits} bits")]
    RelativeOffsetOutOfRange { value: i128, bits: u32 },

    /// File offset arithmetic exceeded the addressable range.
    #[error("file offset arithmetic overflowed while laying out {what}")]
    FileOffsetOverflow { what: &'static str },

    /// Block magic did not match.
    #[error("bad config block magic at file offset {offset}: found {found:#018x}")]
    BadMagic { offset: u64, found: u64 },

    /// Block format version cannot be read by this implementation.
    #[error(
        "incompatible config block version at file offset {offset}: found {major}.{minor}.{patch}"
    )]
    IncompatibleVersion {
        offset: u64,
        major: u32,
        minor: u16,
        patch: u16,
    },

    /// Stored CRC-64 did not match the block contents.
    #[error(
        "config block checksum mismatch at file offset {offset}: stored {stored:#018x}, computed {computed:#018x}"
    )]
    ChecksumMismatch {
        offset: u64,
        stored: u64,
        computed: u64,
    },

    /// Slot count field exceeds the per-block limit.
    #[error("config block at file offset {offset} claims {count} slots (limit {MAX_CONFIG_SLOTS})")]
    SlotCountOutOfRange { offset: u64, count: u64 },

    /// A slot's tag byte does not name a known variant.
    #[error("unknown slot tag {tag} at slot index {index}")]
    UnknownSlotTag { index: usize, tag: u8 },

    /// A typed slot cast found a different variant than expected.
    #[error("slot tag mismatch: expected {expected}, found {found}")]
    SlotTagMismatch { expected: u8, found: u8 },

    /// A next/prev link points outside the file or at a misaligned offset.
    #[error("bad chain link at file offset {offset}: relative delta {delta}")]
    BadChainLink { offset: u64, delta: i64 },

    /// The prev/next chain loops back onto an already-visited block.
    #[error("config block chain cycle detected at file offset {offset}")]
    ChainCycle { offset: u64 },

    /// An I/O error from the underlying block file, propagated verbatim.
    #[error(transparent)]
    Io(#[from] IoError),
}

impl StorageError {
    /// Creates a `RelativeOffsetOutOfRange` error.
    pub fn offset_out_of_range(value: i128, bits: u32) -> Self {
        Self::RelativeOffsetOutOfRange { value, bits }
    }

    /// Creates an `IncompatibleVersion` error from a packed version.
    pub fn incompatible_version(offset: u64, found: u64) -> Self {
        let (major, minor, patch) = silt_common::version::version_triple(found);
        Self::IncompatibleVersion {
            offset,
            major,
            minor,
            patch,
        }
    }

    /// Returns true if the caller passed an invalid option.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidPageSizeLog2 { .. } | Self::ZeroPageCount
        )
    }

    /// Returns true if the error indicates on-disk corruption.
    pub fn is_data_loss(&self) -> bool {
        matches!(
            self,
            Self::BadMagic { .. }
                | Self::IncompatibleVersion { .. }
                | Self::ChecksumMismatch { .. }
                | Self::SlotCountOutOfRange { .. }
                | Self::UnknownSlotTag { .. }
                | Self::BadChainLink { .. }
                | Self::ChainCycle { .. }
        )
    }

    /// Returns true if an offset or size field overflowed its range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::RelativeOffsetOutOfRange { .. } | Self::FileOffsetOverflow { .. }
        )
    }
}
