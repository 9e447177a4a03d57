//! The storage file builder.
//!
//! The builder is the layout engine of a Silt storage file: it accepts
//! typed object options in order, reserves aligned file regions for
//! each object's payload, packs slot records into config blocks
//! (opening a new block whenever the current one holds 62 slots), and on
//! `flush_all` emits the finished chain through the block file sink.
//!
//! The protocol is strictly sequential: construct, `add_object` any
//! number of times, `flush_all` once. The builder is single-threaded;
//! nothing here is safe to call concurrently on one instance.
//!
//! # Layout rules
//!
//! - config blocks start at offsets aligned to 4096; the first at
//!   `round_up_bits(12, base_offset)`
//! - a page device's payload starts at the next offset aligned to its
//!   page size and spans `page_count * page_size` bytes
//! - the `page_0_offset` packed into a slot is relative to the slot
//!   record's own file offset

mod plan;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use silt_common::constants::{
    CONFIG_BLOCK_ALIGN_LOG2, CONFIG_BLOCK_SIZE, NULL_FILE_OFFSET, PAGE_INIT_SPAN,
};
use silt_common::math::round_up_bits;
use silt_common::types::{DeviceId, PageCount, PageSizeLog2};

use crate::error::{StorageError, StorageResult};
use crate::file::BlockFile;
use crate::format::{ConfigBlock, PageDeviceConfig, PlacedConfig};

pub use plan::{execute_plan, PlannedWrite, WritePlan};

use bytes::Bytes;

static ZERO_PAGE_HEAD: [u8; PAGE_INIT_SPAN] = [0u8; PAGE_INIT_SPAN];

/// Options for adding one page device to a storage file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDeviceConfigOptions {
    /// Device identity; generated when absent.
    pub uuid: Option<Uuid>,
    /// Device id; assigned sequentially when absent.
    pub device_id: Option<DeviceId>,
    /// Number of pages. Must be non-zero.
    pub page_count: PageCount,
    /// Base-2 exponent of the page size. Must be in 9..=24.
    pub page_size_log2: PageSizeLog2,
}

/// A payload region reserved for one page device.
#[derive(Debug, Clone, Copy)]
struct PageRegion {
    page_0_offset: u64,
    page_count: u64,
    page_size: u64,
}

/// One in-progress config block and the payload regions its slots own.
struct BlockEntry {
    file_offset: u64,
    block: ConfigBlock,
    page_regions: Vec<PageRegion>,
}

/// Builds the config-block chain of a storage file.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use silt_common::types::{PageCount, PageSizeLog2};
/// use silt_storage::builder::{PageDeviceConfigOptions, StorageFileBuilder};
/// use silt_storage::file::StandardBlockFile;
///
/// async fn build() -> Result<(), Box<dyn std::error::Error>> {
///     let file = Arc::new(StandardBlockFile::create("data.store").await?);
///     let mut builder = StorageFileBuilder::new(file, 0);
///
///     let placed = builder.add_object(PageDeviceConfigOptions {
///         uuid: None,
///         device_id: None,
///         page_count: PageCount::new(10),
///         page_size_log2: PageSizeLog2::new(12),
///     })?;
///     println!("device {} at slot offset {}", placed.device_id, placed.file_offset());
///
///     builder.flush_all().await?;
///     Ok(())
/// }
/// ```
pub struct StorageFileBuilder<F> {
    file: Arc<F>,
    /// Next unallocated file offset.
    next_free: u64,
    /// Device id handed to the next object without an explicit one.
    next_device_id: DeviceId,
    blocks: Vec<BlockEntry>,
    finalized: bool,
}

impl<F: BlockFile> StorageFileBuilder<F> {
    /// Creates a builder that may allocate from `base_offset` onward.
    ///
    /// Bytes before `base_offset` are left untouched; the first config
    /// block lands at the next 4096-aligned offset.
    pub fn new(file: Arc<F>, base_offset: u64) -> Self {
        Self {
            file,
            next_free: base_offset,
            next_device_id: DeviceId::FIRST,
            blocks: Vec::new(),
            finalized: false,
        }
    }

    /// Number of config blocks accumulated so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Adds a page device to the storage file.
    ///
    /// Reserves the device's payload region, packs its slot into the
    /// current config block (opening a new block if the current one is
    /// full), and returns the normalized record paired with the slot's
    /// eventual file offset. Nothing touches the file until
    /// [`StorageFileBuilder::flush_all`].
    pub fn add_object(
        &mut self,
        options: PageDeviceConfigOptions,
    ) -> StorageResult<PlacedConfig<PageDeviceConfig>> {
        if self.finalized {
            return Err(StorageError::BuilderFinalized);
        }
        if !options.page_size_log2.is_valid() {
            return Err(StorageError::InvalidPageSizeLog2 {
                value: options.page_size_log2.as_u8(),
            });
        }
        if !options.page_count.is_valid() {
            return Err(StorageError::ZeroPageCount);
        }

        let uuid = options.uuid.unwrap_or_else(Uuid::new_v4);
        let device_id = options.device_id.unwrap_or(self.next_device_id);
        self.next_device_id = self.next_device_id.next();

        self.ensure_open_block()?;

        // Reserve the payload region at the next page-size-aligned
        // offset past everything allocated so far.
        let page_size = options.page_size_log2.page_size();
        let page_count = options.page_count.as_u64();
        let payload_start = round_up_bits(options.page_size_log2.as_u8() as u32, self.next_free);
        let payload_len = page_count.checked_mul(page_size).ok_or(
            StorageError::FileOffsetOverflow {
                what: "page device payload",
            },
        )?;
        self.next_free =
            payload_start
                .checked_add(payload_len)
                .ok_or(StorageError::FileOffsetOverflow {
                    what: "page device payload",
                })?;

        let entry_index = self.blocks.len() - 1;
        let entry = &mut self.blocks[entry_index];
        let slot_index = entry.block.slot_count();
        let slot_file_offset = entry.file_offset + ConfigBlock::slot_offset(slot_index) as u64;

        let page_0_offset = relative_offset(payload_start, slot_file_offset)?;

        let config = PageDeviceConfig {
            uuid,
            device_id,
            page_0_offset,
            page_count,
            page_size_log2: options.page_size_log2,
        };
        entry.block.write_slot(slot_index, &config);
        entry.block.set_slot_count(slot_index + 1);
        entry.page_regions.push(PageRegion {
            page_0_offset: payload_start,
            page_count,
            page_size,
        });

        trace!(
            device_id = device_id.as_u64(),
            slot_offset = slot_file_offset,
            payload_start,
            page_count,
            page_size,
            "placed page device"
        );

        Ok(PlacedConfig::new(slot_file_offset, config))
    }

    /// Finalizes the chain and writes the storage file.
    ///
    /// Ordering during flush: the file is extended first; then, unless
    /// the sink initializes pages natively, the first 512 bytes of every
    /// page are zeroed in slot order; each config block is written after
    /// the pre-init writes for its own slots, in chain order. A builder
    /// with no objects makes no sink calls at all.
    ///
    /// The builder is finalized by this call; later `add_object` or
    /// `flush_all` calls fail. There is no rollback: if a write fails,
    /// the file must be treated as corrupt.
    pub async fn flush_all(&mut self) -> StorageResult<()> {
        if self.finalized {
            return Err(StorageError::BuilderFinalized);
        }
        self.finalized = true;

        if self.blocks.is_empty() {
            debug!("flush of empty storage file builder; nothing to write");
            return Ok(());
        }

        let plan = self.build_plan()?;
        debug!(
            blocks = self.blocks.len(),
            writes = plan.writes.len(),
            truncate_len = plan.truncate_len,
            "flushing storage file"
        );
        execute_plan(self.file.as_ref(), &plan).await
    }

    /// Opens a fresh config block if there is none or the current one is
    /// full.
    fn ensure_open_block(&mut self) -> StorageResult<()> {
        let needs_new = self.blocks.last().map_or(true, |e| e.block.is_full());
        if !needs_new {
            return Ok(());
        }

        let file_offset = round_up_bits(CONFIG_BLOCK_ALIGN_LOG2, self.next_free);
        self.next_free = file_offset.checked_add(CONFIG_BLOCK_SIZE as u64).ok_or(
            StorageError::FileOffsetOverflow {
                what: "config block",
            },
        )?;

        debug!(
            file_offset,
            index = self.blocks.len(),
            "opened config block"
        );
        self.blocks.push(BlockEntry {
            file_offset,
            block: ConfigBlock::new(),
            page_regions: Vec::new(),
        });
        Ok(())
    }

    /// Finalizes chain linkage and checksums, then lays out the ordered
    /// write plan.
    fn build_plan(&mut self) -> StorageResult<WritePlan> {
        let offsets: Vec<u64> = self.blocks.iter().map(|e| e.file_offset).collect();
        let count = self.blocks.len();

        for (i, entry) in self.blocks.iter_mut().enumerate() {
            let prev = if i == 0 {
                NULL_FILE_OFFSET
            } else {
                relative_offset(offsets[i - 1], offsets[i])?
            };
            let next = if i + 1 == count {
                NULL_FILE_OFFSET
            } else {
                relative_offset(offsets[i + 1], offsets[i])?
            };
            entry.block.set_prev_offset(prev);
            entry.block.set_next_offset(next);
            entry.block.seal();
        }

        let fast_init = self.file.fast_page_init();
        let zero_head = Bytes::from_static(&ZERO_PAGE_HEAD);

        let mut writes = Vec::new();
        for entry in &self.blocks {
            if !fast_init {
                for region in &entry.page_regions {
                    for page in 0..region.page_count {
                        writes.push(PlannedWrite {
                            offset: region.page_0_offset + page * region.page_size,
                            data: zero_head.clone(),
                        });
                    }
                }
            }
            writes.push(PlannedWrite {
                offset: entry.file_offset,
                data: Bytes::copy_from_slice(entry.block.as_bytes()),
            });
        }

        Ok(WritePlan {
            truncate_len: self.next_free,
            writes,
        })
    }
}

/// Computes `target - base` as a slot- or block-relative i64 offset.
fn relative_offset(target: u64, base: u64) -> StorageResult<i64> {
    let delta = target as i128 - base as i128;
    i64::try_from(delta).map_err(|_| StorageError::offset_out_of_range(delta, 64))
}
