//! The 4096-byte config block image.

use std::fmt;

use silt_common::constants::{
    CONFIG_BLOCK_CRC_OFFSET, CONFIG_BLOCK_HEADER_SIZE, CONFIG_BLOCK_MAGIC, CONFIG_BLOCK_SIZE,
    CONFIG_SLOT_SIZE, MAX_CONFIG_SLOTS, NULL_FILE_OFFSET,
};
use silt_common::version::{is_compatible, CURRENT_FORMAT_VERSION};

use super::checksum::true_block_crc64;
use super::slot::SlotRecord;
use crate::error::{StorageError, StorageResult};

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 8;
const PREV_OFFSET_OFFSET: usize = 16;
const NEXT_OFFSET_OFFSET: usize = 24;
const SLOT_COUNT_OFFSET: usize = 56;

/// One config block image.
///
/// The image is always exactly [`CONFIG_BLOCK_SIZE`] bytes and is
/// manipulated in place through typed accessors; it is written to disk
/// verbatim. The chain-link fields (`prev_offset`/`next_offset`) are
/// relative to the block's own file offset, so the image itself is
/// position-independent until those fields are finalized.
pub struct ConfigBlock {
    image: Box<[u8; CONFIG_BLOCK_SIZE]>,
}

impl ConfigBlock {
    /// Creates an empty block: correct magic and version, no neighbors,
    /// no slots.
    #[must_use]
    pub fn new() -> Self {
        let mut block = Self {
            image: Box::new([0u8; CONFIG_BLOCK_SIZE]),
        };
        block.write_u64_at(MAGIC_OFFSET, CONFIG_BLOCK_MAGIC);
        block.write_u64_at(VERSION_OFFSET, CURRENT_FORMAT_VERSION);
        block.set_prev_offset(NULL_FILE_OFFSET);
        block.set_next_offset(NULL_FILE_OFFSET);
        block
    }

    /// Copies a raw 4096-byte image read from disk.
    ///
    /// No validation happens here; call [`ConfigBlock::validate`].
    #[must_use]
    pub fn from_bytes(image: &[u8; CONFIG_BLOCK_SIZE]) -> Self {
        Self {
            image: Box::new(*image),
        }
    }

    /// The raw block image.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CONFIG_BLOCK_SIZE] {
        &self.image
    }

    /// Byte offset of slot `index` within the block.
    #[inline]
    #[must_use]
    pub const fn slot_offset(index: usize) -> usize {
        CONFIG_BLOCK_HEADER_SIZE + index * CONFIG_SLOT_SIZE
    }

    // =========================================================================
    // Header fields
    // =========================================================================

    /// Returns the magic field.
    #[inline]
    #[must_use]
    pub fn magic(&self) -> u64 {
        self.read_u64_at(MAGIC_OFFSET)
    }

    /// Returns the packed format version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.read_u64_at(VERSION_OFFSET)
    }

    /// Returns the relative offset of the previous block in the chain,
    /// or [`NULL_FILE_OFFSET`].
    #[inline]
    #[must_use]
    pub fn prev_offset(&self) -> i64 {
        self.read_u64_at(PREV_OFFSET_OFFSET) as i64
    }

    /// Sets the relative offset of the previous block.
    #[inline]
    pub fn set_prev_offset(&mut self, offset: i64) {
        self.write_u64_at(PREV_OFFSET_OFFSET, offset as u64);
    }

    /// Returns the relative offset of the next block in the chain, or
    /// [`NULL_FILE_OFFSET`].
    #[inline]
    #[must_use]
    pub fn next_offset(&self) -> i64 {
        self.read_u64_at(NEXT_OFFSET_OFFSET) as i64
    }

    /// Sets the relative offset of the next block.
    #[inline]
    pub fn set_next_offset(&mut self, offset: i64) {
        self.write_u64_at(NEXT_OFFSET_OFFSET, offset as u64);
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.read_u64_at(SLOT_COUNT_OFFSET) as usize
    }

    /// Sets the number of occupied slots.
    #[inline]
    pub fn set_slot_count(&mut self, count: usize) {
        debug_assert!(count <= MAX_CONFIG_SLOTS);
        self.write_u64_at(SLOT_COUNT_OFFSET, count as u64);
    }

    /// Returns true if no further slot fits in this block.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slot_count() >= MAX_CONFIG_SLOTS
    }

    /// Returns the raw bytes of slot `index`.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> &[u8] {
        debug_assert!(index < MAX_CONFIG_SLOTS);
        let start = Self::slot_offset(index);
        &self.image[start..start + CONFIG_SLOT_SIZE]
    }

    /// Packs `record` into slot `index`.
    ///
    /// Does not touch the slot count; callers maintain it.
    pub fn write_slot<T: SlotRecord>(&mut self, index: usize, record: &T) {
        debug_assert!(index < MAX_CONFIG_SLOTS);
        let start = Self::slot_offset(index);
        record.encode_slot(&mut self.image[start..start + CONFIG_SLOT_SIZE]);
    }

    // =========================================================================
    // Checksum
    // =========================================================================

    /// Returns the stored crc64 field.
    #[inline]
    #[must_use]
    pub fn stored_crc64(&self) -> u64 {
        self.read_u64_at(CONFIG_BLOCK_CRC_OFFSET)
    }

    /// Computes the checksum the image should carry.
    #[inline]
    #[must_use]
    pub fn true_crc64(&self) -> u64 {
        true_block_crc64(&self.image)
    }

    /// Finalizes the image by storing the computed checksum.
    ///
    /// Must run after the chain-link fields are set; any later mutation
    /// invalidates the stored value.
    pub fn seal(&mut self) {
        let crc = self.true_crc64();
        self.write_u64_at(CONFIG_BLOCK_CRC_OFFSET, crc);
    }

    /// Validates an image read from `file_offset`: magic, version
    /// compatibility, checksum, and the slot-count bound.
    pub fn validate(&self, file_offset: u64) -> StorageResult<()> {
        let magic = self.magic();
        if magic != CONFIG_BLOCK_MAGIC {
            return Err(StorageError::BadMagic {
                offset: file_offset,
                found: magic,
            });
        }

        let version = self.version();
        if !is_compatible(version) {
            return Err(StorageError::incompatible_version(file_offset, version));
        }

        let stored = self.stored_crc64();
        let computed = self.true_crc64();
        if stored != computed {
            return Err(StorageError::ChecksumMismatch {
                offset: file_offset,
                stored,
                computed,
            });
        }

        let count = self.read_u64_at(SLOT_COUNT_OFFSET);
        if count > MAX_CONFIG_SLOTS as u64 {
            return Err(StorageError::SlotCountOutOfRange {
                offset: file_offset,
                count,
            });
        }

        Ok(())
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    fn read_u64_at(&self, offset: usize) -> u64 {
        let bytes: [u8; 8] = self.image[offset..offset + 8].try_into().unwrap();
        u64::from_le_bytes(bytes)
    }

    fn write_u64_at(&mut self, offset: usize, value: u64) {
        self.image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    /// Mutable access to the raw image, for tests that need to corrupt
    /// or hand-assemble blocks.
    #[cfg(test)]
    pub(crate) fn image_mut(&mut self) -> &mut [u8; CONFIG_BLOCK_SIZE] {
        &mut self.image
    }
}

impl Default for ConfigBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ConfigBlock {
    fn clone(&self) -> Self {
        Self {
            image: self.image.clone(),
        }
    }
}

impl PartialEq for ConfigBlock {
    fn eq(&self, other: &Self) -> bool {
        self.image[..] == other.image[..]
    }
}

impl Eq for ConfigBlock {}

impl fmt::Debug for ConfigBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBlock")
            .field("magic", &format_args!("{:#018x}", self.magic()))
            .field("version", &format_args!("{:#x}", self.version()))
            .field("prev_offset", &self.prev_offset())
            .field("next_offset", &self.next_offset())
            .field("slot_count", &self.slot_count())
            .field("crc64", &format_args!("{:#018x}", self.stored_crc64()))
            .finish()
    }
}
