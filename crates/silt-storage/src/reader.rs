//! Config-block chain reader.
//!
//! Given a block file and a starting offset, the reader walks the
//! prev/next chain written by the builder, validating each block
//! (magic, version compatibility, checksum) and collecting the decoded
//! images in traversal order. Traversal ends at a null next link, stops
//! with an error on any validation failure, and detects cycles by
//! tracking visited offsets.
//!
//! Validation failures report the offending file offset and hand back
//! the prefix of blocks that did decode, so callers may choose to use
//! partial contents.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use silt_common::constants::{CONFIG_BLOCK_ALIGN_LOG2, CONFIG_BLOCK_SIZE, NULL_FILE_OFFSET};
use silt_common::math::{is_aligned_bits, round_up_bits};

use crate::error::{StorageError, StorageResult};
use crate::file::BlockFile;
use crate::format::{config_slot_cast, slot_tag, ConfigBlock, PageDeviceConfig, PlacedConfig, SlotTag};

/// A validated config block paired with its absolute file offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfigBlock {
    file_offset: u64,
    block: ConfigBlock,
}

impl LoadedConfigBlock {
    /// Absolute file offset of the block.
    #[inline]
    #[must_use]
    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// The decoded block image.
    #[inline]
    pub fn block(&self) -> &ConfigBlock {
        &self.block
    }
}

/// A chain read that failed partway.
///
/// `prefix` holds every block that validated before the failure, in
/// traversal order; `source` names what went wrong and where.
#[derive(Debug, Error)]
#[error("config block chain read failed after {} block(s): {source}", .prefix.len())]
pub struct ChainReadError {
    /// Blocks decoded before the failure.
    pub prefix: Vec<LoadedConfigBlock>,
    /// The underlying failure.
    #[source]
    pub source: StorageError,
}

/// Reads the config-block chain of a storage file.
///
/// The first block is expected at `round_up_bits(12, start_offset)`.
/// Returns the blocks in traversal order; decoding the same file twice
/// yields identical results.
pub async fn read_storage_file<F: BlockFile>(
    file: &F,
    start_offset: u64,
) -> Result<Vec<LoadedConfigBlock>, ChainReadError> {
    let mut blocks: Vec<LoadedConfigBlock> = Vec::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut offset = round_up_bits(CONFIG_BLOCK_ALIGN_LOG2, start_offset);

    loop {
        if !visited.insert(offset) {
            return Err(ChainReadError {
                prefix: blocks,
                source: StorageError::ChainCycle { offset },
            });
        }

        let mut image = [0u8; CONFIG_BLOCK_SIZE];
        if let Err(e) = file.read_exact(offset, &mut image).await {
            return Err(ChainReadError {
                prefix: blocks,
                source: e.into(),
            });
        }

        let block = ConfigBlock::from_bytes(&image);
        if let Err(e) = block.validate(offset) {
            return Err(ChainReadError {
                prefix: blocks,
                source: e,
            });
        }

        let next = block.next_offset();
        trace!(offset, slots = block.slot_count(), next, "decoded config block");
        blocks.push(LoadedConfigBlock {
            file_offset: offset,
            block,
        });

        if next == NULL_FILE_OFFSET {
            break;
        }

        let target = offset as i128 + next as i128;
        if target < 0
            || target > u64::MAX as i128
            || !is_aligned_bits(CONFIG_BLOCK_ALIGN_LOG2, target as u64)
        {
            return Err(ChainReadError {
                prefix: blocks,
                source: StorageError::BadChainLink {
                    offset,
                    delta: next,
                },
            });
        }
        offset = target as u64;
    }

    debug!(blocks = blocks.len(), "storage file chain read");
    Ok(blocks)
}

/// A storage file's decoded configuration.
///
/// Pairs the chain read by [`read_storage_file`] with the file's path
/// and offers typed iteration over the objects it describes, which is
/// the entry point for downstream object recovery.
#[derive(Debug)]
pub struct StorageFile {
    path: PathBuf,
    blocks: Vec<LoadedConfigBlock>,
}

impl StorageFile {
    /// Wraps a decoded chain.
    pub fn new(path: impl Into<PathBuf>, blocks: Vec<LoadedConfigBlock>) -> Self {
        Self {
            path: path.into(),
            blocks,
        }
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decoded chain, in traversal order.
    #[must_use]
    pub fn blocks(&self) -> &[LoadedConfigBlock] {
        &self.blocks
    }

    /// Decodes every page-device slot in the chain, in slot order,
    /// paired with its absolute slot offset.
    ///
    /// Unoccupied slots are skipped; a tag this implementation does not
    /// know is reported as an error.
    pub fn page_device_configs(&self) -> StorageResult<Vec<PlacedConfig<PageDeviceConfig>>> {
        let mut configs = Vec::new();
        for loaded in &self.blocks {
            for index in 0..loaded.block.slot_count() {
                let slot = loaded.block.slot(index);
                match SlotTag::from_u8(slot_tag(slot)) {
                    Some(SlotTag::None) => continue,
                    Some(SlotTag::PageDevice) => {
                        let config = config_slot_cast::<PageDeviceConfig>(slot)?;
                        let slot_offset =
                            loaded.file_offset + ConfigBlock::slot_offset(index) as u64;
                        configs.push(PlacedConfig::new(slot_offset, config));
                    }
                    None => {
                        return Err(StorageError::UnknownSlotTag {
                            index,
                            tag: slot_tag(slot),
                        });
                    }
                }
            }
        }
        Ok(configs)
    }

    /// Finds a page device by uuid.
    pub fn find_page_device(
        &self,
        uuid: uuid::Uuid,
    ) -> StorageResult<Option<PlacedConfig<PageDeviceConfig>>> {
        Ok(self
            .page_device_configs()?
            .into_iter()
            .find(|placed| placed.uuid == uuid))
    }
}
