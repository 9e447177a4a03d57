//! Block file open options.

use std::fs;

/// Options for opening block files.
///
/// Similar to `std::fs::OpenOptions`, with additional options for
/// direct I/O and preallocation.
///
/// # Example
///
/// ```rust
/// use silt_storage::file::OpenOptions;
///
/// let options = OpenOptions::new()
///     .read(true)
///     .write(true)
///     .create(true)
///     .direct_io(true);
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Open for reading.
    pub(crate) read: bool,
    /// Open for writing.
    pub(crate) write: bool,
    /// Truncate existing file to zero length.
    pub(crate) truncate: bool,
    /// Create file if it doesn't exist.
    pub(crate) create: bool,
    /// Create file, fail if it exists.
    pub(crate) create_new: bool,
    /// Use direct I/O (bypass OS page cache).
    pub(crate) direct_io: bool,
    /// Pre-allocate file space on open.
    pub(crate) preallocate: Option<u64>,
}

impl OpenOptions {
    /// Creates a new set of options with everything disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            read: false,
            write: false,
            truncate: false,
            create: false,
            create_new: false,
            direct_io: false,
            preallocate: None,
        }
    }

    /// Sets the option for read access.
    #[must_use]
    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    /// Sets the option for write access.
    #[must_use]
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Sets the option for truncating an existing file.
    #[must_use]
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Sets the option to create the file if it doesn't exist.
    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Sets the option to create a new file, failing if it exists.
    #[must_use]
    pub fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    /// Sets the option for direct I/O (bypass the OS page cache).
    ///
    /// Useful when the caller manages its own buffering. On Linux this
    /// opens the file with `O_DIRECT`; elsewhere the flag is ignored.
    #[must_use]
    pub fn direct_io(mut self, direct_io: bool) -> Self {
        self.direct_io = direct_io;
        self
    }

    /// Sets a preallocation size applied when the file is opened for
    /// writing.
    #[must_use]
    pub fn preallocate(mut self, size: u64) -> Self {
        self.preallocate = Some(size);
        self
    }

    /// Converts to `std::fs::OpenOptions`.
    ///
    /// Direct I/O flags are platform-specific and applied separately.
    pub(crate) fn to_std_options(&self) -> fs::OpenOptions {
        let mut opts = fs::OpenOptions::new();
        opts.read(self.read)
            .write(self.write)
            .truncate(self.truncate)
            .create(self.create)
            .create_new(self.create_new);
        opts
    }

    /// Preset for reading an existing storage file.
    #[must_use]
    pub fn for_read() -> Self {
        Self::new().read(true)
    }

    /// Preset for creating or opening a storage file for building.
    #[must_use]
    pub fn for_create() -> Self {
        Self::new().read(true).write(true).create(true)
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = OpenOptions::new();
        assert!(!opts.read);
        assert!(!opts.write);
        assert!(!opts.create);
        assert!(!opts.direct_io);
        assert!(opts.preallocate.is_none());
    }

    #[test]
    fn test_presets() {
        let opts = OpenOptions::for_read();
        assert!(opts.read);
        assert!(!opts.write);

        let opts = OpenOptions::for_create();
        assert!(opts.read);
        assert!(opts.write);
        assert!(opts.create);
    }

    #[test]
    fn test_to_std_options() {
        // Just verify conversion doesn't panic.
        let _ = OpenOptions::for_create().to_std_options();
    }

    #[test]
    fn test_builder_flags() {
        let opts = OpenOptions::for_create()
            .direct_io(true)
            .preallocate(1024 * 1024);
        assert!(opts.direct_io);
        assert_eq!(opts.preallocate, Some(1024 * 1024));
    }
}
