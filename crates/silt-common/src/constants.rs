//! On-disk format constants for the Silt storage layer.
//!
//! Everything in a Silt storage file is little-endian. The values here
//! define the config-block geometry and must never change for a given
//! format major version.

// =============================================================================
// Config Block Geometry
// =============================================================================

/// Size of one config block on disk (4 KB).
///
/// Config blocks are written as a single unit and are always aligned to
/// their own size.
pub const CONFIG_BLOCK_SIZE: usize = 4096;

/// log2 of [`CONFIG_BLOCK_SIZE`]; config blocks are 4096-aligned.
pub const CONFIG_BLOCK_ALIGN_LOG2: u32 = 12;

/// Size of the fixed header that precedes the slot array.
///
/// Layout: magic (8), version (8), prev_offset (8), next_offset (8),
/// reserved (24), slot count (8) = 64 bytes.
pub const CONFIG_BLOCK_HEADER_SIZE: usize = 64;

/// Size of the trailing CRC-64 field.
pub const CONFIG_BLOCK_CRC_SIZE: usize = 8;

/// Bytes available between the fixed header and the CRC field.
///
/// The slot array occupies the front of this region; the remainder is
/// reserved padding.
pub const CONFIG_BLOCK_PAYLOAD_CAPACITY: usize =
    CONFIG_BLOCK_SIZE - CONFIG_BLOCK_HEADER_SIZE - CONFIG_BLOCK_CRC_SIZE;

/// Size of one slot record within a config block.
pub const CONFIG_SLOT_SIZE: usize = 64;

/// Maximum number of slots per config block (62).
pub const MAX_CONFIG_SLOTS: usize = CONFIG_BLOCK_PAYLOAD_CAPACITY / CONFIG_SLOT_SIZE;

/// Byte offset of the CRC-64 field within a config block.
pub const CONFIG_BLOCK_CRC_OFFSET: usize = CONFIG_BLOCK_SIZE - CONFIG_BLOCK_CRC_SIZE;

// =============================================================================
// Magic Numbers and Sentinels
// =============================================================================

/// Magic number identifying a config block ("SILTCFGB" in ASCII).
pub const CONFIG_BLOCK_MAGIC: u64 = u64::from_le_bytes(*b"SILTCFGB");

/// Sentinel for "no neighboring block" in `prev_offset`/`next_offset`.
///
/// Distinguishable from any valid relative offset: a real neighbor is
/// always within `i64::MAX / 2` of the current block.
pub const NULL_FILE_OFFSET: i64 = i64::MAX;

// =============================================================================
// Page Devices
// =============================================================================

/// Smallest supported page size exponent (512-byte pages).
pub const MIN_PAGE_SIZE_LOG2: u8 = 9;

/// Largest supported page size exponent (16 MB pages).
pub const MAX_PAGE_SIZE_LOG2: u8 = 24;

/// Bytes zeroed at the front of each page when the block file does not
/// support fast initialization natively.
pub const PAGE_INIT_SPAN: usize = 512;

// =============================================================================
// Format Version
// =============================================================================

/// Major version of the on-disk format.
pub const FORMAT_VERSION_MAJOR: u32 = 0;

/// Minor version of the on-disk format.
pub const FORMAT_VERSION_MINOR: u16 = 1;

/// Patch version of the on-disk format.
pub const FORMAT_VERSION_PATCH: u16 = 0;
