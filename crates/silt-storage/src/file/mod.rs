//! Block file I/O for Silt storage files.
//!
//! A storage file lives on a raw block-addressable file. This module
//! provides:
//!
//! - **`BlockFile`**: the async sink/source trait the builder and reader
//!   operate against (positional reads and writes, grow-only truncation)
//! - **`StandardBlockFile`**: the default cross-platform implementation
//!   backed by a standard file and `tokio::task::spawn_blocking`
//! - **`OpenOptions`**: open flags including direct I/O and preallocation
//!
//! All operations are position-based (pread/pwrite style); the trait has
//! no seek state.

mod error;
mod handle;
mod options;
mod std_io;

pub use error::{IoError, IoResult};
pub use handle::BlockFile;
pub use options::OpenOptions;
pub use std_io::StandardBlockFile;

/// Alignment expected for direct I/O transfers (4 KB).
pub const IO_ALIGNMENT: usize = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_alignment() {
        assert!(IO_ALIGNMENT.is_power_of_two());
    }
}
