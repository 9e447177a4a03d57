//! # silt-storage
//!
//! Storage file builder and config-block chain for Silt.
//!
//! A Silt storage file is a raw block-addressable file carrying a chain
//! of fixed-size *config blocks*, each describing up to 62 storage
//! objects through packed 64-byte slot records. The builder lays objects
//! out (aligned payload regions, relatively-addressed slots, linked
//! blocks) and writes the result in one ordered flush; the reader walks
//! the chain back for recovery.
//!
//! ```text
//! options ──▶ StorageFileBuilder ──▶ WritePlan ──▶ BlockFile (sink)
//!                                                      │
//! StorageFile ◀── read_storage_file ◀──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Storage file builder and flush driver
pub mod builder;

/// Error types
pub mod error;

/// Block file I/O
pub mod file;

/// On-disk format: packed primitives, slots, config blocks
pub mod format;

/// Config-block chain reader
pub mod reader;

pub use builder::{PageDeviceConfigOptions, StorageFileBuilder};
pub use error::{StorageError, StorageResult};
pub use format::{ConfigBlock, PageDeviceConfig, PlacedConfig, SlotTag};
pub use reader::{read_storage_file, ChainReadError, LoadedConfigBlock, StorageFile};
