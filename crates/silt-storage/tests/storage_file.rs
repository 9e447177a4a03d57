//! End-to-end storage file tests: build a file on disk, read the chain
//! back, and check the layout byte for byte.

use std::sync::Arc;

use tempfile::tempdir;

use silt_common::constants::{
    CONFIG_BLOCK_PAYLOAD_CAPACITY, CONFIG_BLOCK_SIZE, CONFIG_SLOT_SIZE, MAX_CONFIG_SLOTS,
    NULL_FILE_OFFSET,
};
use silt_common::types::{DeviceId, PageCount, PageSizeLog2};
use silt_common::version::CURRENT_FORMAT_VERSION;
use silt_storage::file::{BlockFile, StandardBlockFile};
use silt_storage::format::config_slot_cast;
use silt_storage::{
    read_storage_file, ConfigBlock, PageDeviceConfig, PageDeviceConfigOptions, StorageError,
    StorageFile, StorageFileBuilder,
};

const TEST_PAGE_COUNT: u64 = 10;

fn device_options(page_size_log2: u8) -> PageDeviceConfigOptions {
    PageDeviceConfigOptions {
        uuid: None,
        device_id: None,
        page_count: PageCount::new(TEST_PAGE_COUNT),
        page_size_log2: PageSizeLog2::new(page_size_log2),
    }
}

/// Walks a decoded chain the way recovery would, checking linkage,
/// versions, checksums, slot counts, and the per-slot payload offsets.
fn verify_chain(
    blocks: &[silt_storage::LoadedConfigBlock],
    page_size_log2: u8,
    expected_devices: u64,
) {
    let page_size = 1u64 << page_size_log2;
    let mut expected_device_id = 0u64;

    for (i, loaded) in blocks.iter().enumerate() {
        let block = loaded.block();
        assert_eq!(block.version(), CURRENT_FORMAT_VERSION);
        assert_eq!(block.stored_crc64(), block.true_crc64());
        assert_eq!(loaded.file_offset() % CONFIG_BLOCK_SIZE as u64, 0);

        // The first payload of a block begins at the block's end, so the
        // first slot's relative offset is payload capacity + crc size;
        // each following slot is 64 bytes closer to a payload that is a
        // full device further away.
        let mut expected_page0_offset = (CONFIG_BLOCK_PAYLOAD_CAPACITY + 8) as i64;
        for index in 0..block.slot_count() {
            let config = config_slot_cast::<PageDeviceConfig>(block.slot(index)).unwrap();
            assert_eq!(config.page_0_offset, expected_page0_offset);
            assert_eq!(config.device_id, DeviceId::new(expected_device_id));
            assert_eq!(config.page_count, TEST_PAGE_COUNT);
            assert_eq!(config.page_size_log2.as_u8(), page_size_log2);

            expected_page0_offset +=
                (page_size * TEST_PAGE_COUNT) as i64 - CONFIG_SLOT_SIZE as i64;
            expected_device_id += 1;
        }

        if i == 0 {
            assert_eq!(block.prev_offset(), NULL_FILE_OFFSET);
        } else {
            let gap = blocks[i - 1].file_offset() as i64 - loaded.file_offset() as i64;
            assert_eq!(block.prev_offset(), gap);
            assert_eq!(block.prev_offset(), -blocks[i - 1].block().next_offset());
        }
        if i + 1 == blocks.len() {
            assert_eq!(block.next_offset(), NULL_FILE_OFFSET);
        } else {
            let gap = blocks[i + 1].file_offset() as i64 - loaded.file_offset() as i64;
            assert_eq!(block.next_offset(), gap);
        }
    }

    assert_eq!(expected_device_id, expected_devices);
}

#[tokio::test]
async fn test_write_read_single_device() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    let placed = builder.add_object(device_options(12)).unwrap();
    let device_uuid = placed.uuid;
    builder.flush_all().await.unwrap();

    // Ten 4096-byte pages after one config block.
    assert_eq!(
        file.size().await.unwrap(),
        CONFIG_BLOCK_SIZE as u64 + TEST_PAGE_COUNT * 4096
    );

    let blocks = read_storage_file(file.as_ref(), 0).await.unwrap();
    assert_eq!(blocks.len(), 1);
    verify_chain(&blocks, 12, 1);

    let storage_file = StorageFile::new(&path, blocks);
    let configs = storage_file.page_device_configs().unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].uuid, device_uuid);
    assert_eq!(configs[0].file_offset(), 64);

    let found = storage_file.find_page_device(device_uuid).unwrap();
    assert!(found.is_some());
    assert!(storage_file
        .find_page_device(uuid::Uuid::new_v4())
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_preinitialized_page_heads_are_zero() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("zeroed.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    // Dirty the region where pages will land, then build over it.
    file.write_all(4096, &[0xEE; 64 * 1024]).await.unwrap();

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    let placed = builder.add_object(device_options(12)).unwrap();
    builder.flush_all().await.unwrap();

    let page_0 = (placed.file_offset() as i64 + placed.page_0_offset) as u64;
    for page in 0..TEST_PAGE_COUNT {
        let mut head = [0xEEu8; 512];
        file.read_exact(page_0 + page * 4096, &mut head).await.unwrap();
        assert!(head.iter().all(|&b| b == 0), "page {page} head not zeroed");
    }
}

#[tokio::test]
async fn test_base_offset_leaves_prefix_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefix.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    // Arbitrary content before base_offset must survive the build.
    let preamble = [0xA5u8; 128];
    file.write_all(0, &preamble).await.unwrap();

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 128);
    let placed = builder.add_object(device_options(12)).unwrap();
    builder.flush_all().await.unwrap();

    let mut kept = [0u8; 128];
    file.read_exact(0, &mut kept).await.unwrap();
    assert_eq!(kept, preamble);

    // First block rounds up to 4096; slot 0 at 4160; page 0 at 8192.
    let blocks = read_storage_file(file.as_ref(), 128).await.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].file_offset(), 4096);
    assert_eq!(placed.file_offset(), 4160);
    assert_eq!(placed.page_0_offset, 4032);
}

#[tokio::test]
async fn test_write_read_many_devices() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("many.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    let mut last_uuid = None;
    for _ in 0..125 {
        let placed = builder.add_object(device_options(9)).unwrap();
        last_uuid = Some(placed.uuid);
    }
    builder.flush_all().await.unwrap();

    let blocks = read_storage_file(file.as_ref(), 0).await.unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].block().slot_count(), MAX_CONFIG_SLOTS);
    assert_eq!(blocks[1].block().slot_count(), MAX_CONFIG_SLOTS);
    assert_eq!(blocks[2].block().slot_count(), 1);
    verify_chain(&blocks, 9, 125);

    let storage_file = StorageFile::new(&path, blocks);
    let configs = storage_file.page_device_configs().unwrap();
    assert_eq!(configs.len(), 125);

    let found = storage_file.find_page_device(last_uuid.unwrap()).unwrap();
    assert_eq!(found.unwrap().device_id, DeviceId::new(124));
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("again.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    for _ in 0..70 {
        builder.add_object(device_options(9)).unwrap();
    }
    builder.flush_all().await.unwrap();

    let first = read_storage_file(file.as_ref(), 0).await.unwrap();
    let second = read_storage_file(file.as_ref(), 0).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_tampered_block_is_data_loss() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tamper.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    builder.add_object(device_options(12)).unwrap();
    builder.flush_all().await.unwrap();

    // Flip one bit inside the slot area of the flushed block.
    let mut byte = [0u8; 1];
    file.read_exact(100, &mut byte).await.unwrap();
    byte[0] ^= 0x01;
    file.write_all(100, &byte).await.unwrap();

    let err = read_storage_file(file.as_ref(), 0).await.unwrap_err();
    assert!(err.prefix.is_empty());
    assert!(err.source.is_data_loss());
    assert!(matches!(
        err.source,
        StorageError::ChecksumMismatch { offset: 0, .. }
    ));
}

#[tokio::test]
async fn test_mid_chain_tamper_returns_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("midchain.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let mut builder = StorageFileBuilder::new(Arc::clone(&file), 0);
    for _ in 0..125 {
        builder.add_object(device_options(9)).unwrap();
    }
    builder.flush_all().await.unwrap();

    let blocks = read_storage_file(file.as_ref(), 0).await.unwrap();
    let second_offset = blocks[1].file_offset();

    let mut byte = [0u8; 1];
    file.read_exact(second_offset + 200, &mut byte).await.unwrap();
    byte[0] ^= 0x80;
    file.write_all(second_offset + 200, &byte).await.unwrap();

    let err = read_storage_file(file.as_ref(), 0).await.unwrap_err();
    assert_eq!(err.prefix.len(), 1);
    assert_eq!(err.prefix[0].file_offset(), 0);
    assert!(matches!(
        err.source,
        StorageError::ChecksumMismatch { offset, .. } if offset == second_offset
    ));
}

#[tokio::test]
async fn test_chain_cycle_is_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cycle.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    // Hand-assemble two blocks whose next links point at each other.
    let mut first = ConfigBlock::new();
    first.set_next_offset(CONFIG_BLOCK_SIZE as i64);
    first.seal();
    file.write_all(0, &first.as_bytes()[..]).await.unwrap();

    let mut second = ConfigBlock::new();
    second.set_prev_offset(-(CONFIG_BLOCK_SIZE as i64));
    second.set_next_offset(-(CONFIG_BLOCK_SIZE as i64));
    second.seal();
    file.write_all(CONFIG_BLOCK_SIZE as u64, &second.as_bytes()[..])
        .await
        .unwrap();

    let err = read_storage_file(file.as_ref(), 0).await.unwrap_err();
    assert_eq!(err.prefix.len(), 2);
    assert!(matches!(err.source, StorageError::ChainCycle { offset: 0 }));
}

#[tokio::test]
async fn test_garbage_file_is_bad_magic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    file.write_all(0, &[0x42; CONFIG_BLOCK_SIZE]).await.unwrap();

    let err = read_storage_file(file.as_ref(), 0).await.unwrap_err();
    assert!(err.prefix.is_empty());
    assert!(matches!(err.source, StorageError::BadMagic { offset: 0, .. }));
}

#[tokio::test]
async fn test_empty_file_read_fails_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.store");
    let file = Arc::new(StandardBlockFile::create(&path).await.unwrap());

    let err = read_storage_file(file.as_ref(), 0).await.unwrap_err();
    assert!(err.prefix.is_empty());
    assert!(matches!(err.source, StorageError::Io(_)));
}
