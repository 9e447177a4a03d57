//! On-disk format for Silt storage files.
//!
//! A storage file carries a chain of fixed-size config blocks, each
//! holding up to 62 fixed-size slot records describing storage objects.
//! Object payloads (page-device pages) live between and after the
//! blocks, addressed only through slot-relative offsets.
//!
//! # Config block layout (4096 bytes)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//!    0      8   magic ("SILTCFGB")
//!    8      8   version ((major<<32) | (minor<<16) | patch)
//!   16      8   prev_offset (i64, relative to this block's start)
//!   24      8   next_offset (i64, relative to this block's start)
//!   32     24   reserved (zero)
//!   56      8   slot count (u64)
//!   64   3968   slots[0..62], 64 bytes each
//! 4032     56   reserved padding
//! 4088      8   crc64 (CRC-64/XZ of bytes 0..4088)
//! ```
//!
//! Every offset stored in the format is relative to the start of the
//! record that contains it, so blocks and slots can be relocated as
//! units without rewriting their contents.

mod block;
mod checksum;
mod packed;
mod slot;

pub use block::ConfigBlock;
pub use checksum::{crc64, true_block_crc64};
pub use packed::{
    packed_bytes_size, read_packed_bytes, read_u24_le, write_packed_bytes, write_u24_le,
    PACKED_BYTES_INLINE_MAX, PACKED_BYTES_SIZE,
};
pub use slot::{config_slot_cast, slot_tag, PageDeviceConfig, SlotRecord, SlotTag};

/// A decoded record paired with the absolute file offset of the slot it
/// was packed into.
///
/// The builder returns one of these from `add_object`, so callers can
/// capture the normalized contents (generated uuid, assigned device id)
/// and the slot's eventual location before the file is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedConfig<T> {
    file_offset: u64,
    config: T,
}

impl<T> PlacedConfig<T> {
    /// Pairs a decoded record with its slot's absolute file offset.
    pub fn new(file_offset: u64, config: T) -> Self {
        Self {
            file_offset,
            config,
        }
    }

    /// Absolute file offset of the slot record.
    #[inline]
    #[must_use]
    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// The decoded record.
    #[inline]
    pub fn get(&self) -> &T {
        &self.config
    }

    /// Consumes the pair, returning the decoded record.
    pub fn into_inner(self) -> T {
        self.config
    }
}

impl<T> std::ops::Deref for PlacedConfig<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.config
    }
}
