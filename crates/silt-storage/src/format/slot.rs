//! Slot records.
//!
//! Each config block carries an array of fixed-size 64-byte slots. A
//! slot is a tagged union: the first byte names the variant, the rest is
//! variant-specific, padded to the slot boundary. Decoding is always
//! checked against the tag.
//!
//! # Page device slot layout (64 bytes)
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//!   0       1   tag (= PageDevice)
//!   1       7   reserved
//!   8      16   uuid
//!  24       8   device_id (u64)
//!  32       8   page_0_offset (i64, relative to this slot's start)
//!  40       8   page_count (u64)
//!  48       1   page_size_log2
//!  49      15   reserved
//! ```
//!
//! `page_0_offset` is measured from the slot record itself, so a slot
//! can be copied between block images without rewriting it, provided it
//! lands at the same intra-block offset.

use bytes::{Buf, BufMut};
use uuid::Uuid;

use silt_common::constants::CONFIG_SLOT_SIZE;
use silt_common::types::{DeviceId, PageSizeLog2};

use crate::error::{StorageError, StorageResult};

/// Slot variant tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlotTag {
    /// Unoccupied slot.
    None = 0,
    /// A page device configuration.
    PageDevice = 1,
}

impl SlotTag {
    /// Returns the raw tag byte.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a tag byte.
    #[inline]
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::PageDevice),
            _ => None,
        }
    }
}

/// Returns the tag byte of a raw slot.
#[inline]
#[must_use]
pub fn slot_tag(slot: &[u8]) -> u8 {
    slot[0]
}

/// A record type that packs into one 64-byte slot.
pub trait SlotRecord: Sized {
    /// The tag identifying this variant.
    const TAG: SlotTag;

    /// Packs the record into a 64-byte slot.
    fn encode_slot(&self, slot: &mut [u8]);

    /// Unpacks the record from a 64-byte slot.
    ///
    /// Implementations verify the tag and any field ranges.
    fn decode_slot(slot: &[u8]) -> StorageResult<Self>;
}

/// Checked, tag-keyed decode of a raw slot into a typed record.
pub fn config_slot_cast<T: SlotRecord>(slot: &[u8]) -> StorageResult<T> {
    let found = slot_tag(slot);
    if found != T::TAG.as_u8() {
        return Err(StorageError::SlotTagMismatch {
            expected: T::TAG.as_u8(),
            found,
        });
    }
    T::decode_slot(slot)
}

/// Configuration of one page device, as stored in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDeviceConfig {
    /// Stable identity of the device, preserved across recovery.
    pub uuid: Uuid,
    /// Device id within the storage file.
    pub device_id: DeviceId,
    /// Offset of the device's first page, relative to the start of this
    /// slot record.
    pub page_0_offset: i64,
    /// Number of pages in the device.
    pub page_count: u64,
    /// Base-2 exponent of the page size.
    pub page_size_log2: PageSizeLog2,
}

impl PageDeviceConfig {
    /// Page size in bytes.
    #[inline]
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size_log2.page_size()
    }

    /// Total payload bytes owned by the device.
    #[inline]
    #[must_use]
    pub const fn payload_size(&self) -> u64 {
        self.page_count * self.page_size()
    }
}

impl SlotRecord for PageDeviceConfig {
    const TAG: SlotTag = SlotTag::PageDevice;

    fn encode_slot(&self, slot: &mut [u8]) {
        assert_eq!(slot.len(), CONFIG_SLOT_SIZE, "slot must be 64 bytes");

        let mut cursor = &mut slot[..];
        cursor.put_u8(Self::TAG.as_u8());
        cursor.put_bytes(0, 7);
        cursor.put_slice(self.uuid.as_bytes());
        cursor.put_u64_le(self.device_id.as_u64());
        cursor.put_i64_le(self.page_0_offset);
        cursor.put_u64_le(self.page_count);
        cursor.put_u8(self.page_size_log2.as_u8());
        cursor.put_bytes(0, 15);
    }

    fn decode_slot(slot: &[u8]) -> StorageResult<Self> {
        assert_eq!(slot.len(), CONFIG_SLOT_SIZE, "slot must be 64 bytes");

        let mut cursor = slot;
        let tag = cursor.get_u8();
        if tag != Self::TAG.as_u8() {
            return Err(StorageError::SlotTagMismatch {
                expected: Self::TAG.as_u8(),
                found: tag,
            });
        }
        cursor.advance(7);

        let mut uuid_bytes = [0u8; 16];
        cursor.copy_to_slice(&mut uuid_bytes);
        let uuid = Uuid::from_bytes(uuid_bytes);

        let device_id = DeviceId::new(cursor.get_u64_le());
        let page_0_offset = cursor.get_i64_le();
        let page_count = cursor.get_u64_le();
        let page_size_log2 = PageSizeLog2::new(cursor.get_u8());

        if !page_size_log2.is_valid() {
            return Err(StorageError::InvalidPageSizeLog2 {
                value: page_size_log2.as_u8(),
            });
        }

        Ok(Self {
            uuid,
            device_id,
            page_0_offset,
            page_count,
            page_size_log2,
        })
    }
}
