//! Standard block file implementation.
//!
//! The default cross-platform backend: a standard file behind a mutex,
//! with every operation dispatched through `tokio::task::spawn_blocking`.

use std::fs::File as StdFile;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task;

use super::error::{IoError, IoResult};
use super::handle::BlockFile;
use super::options::OpenOptions;

/// Block file backed by a standard file and a blocking-task pool.
///
/// Not as efficient as a ring-based backend, but works everywhere and
/// is the backend used by the integration tests.
pub struct StandardBlockFile {
    /// The underlying file, wrapped in a mutex for thread-safe access.
    file: Arc<Mutex<StdFile>>,
    /// The file path.
    path: PathBuf,
    /// Whether the file was opened with write access.
    writable: bool,
}

impl StandardBlockFile {
    /// Opens a block file with the specified options.
    pub async fn open(path: impl AsRef<Path>, options: OpenOptions) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let path_clone = path.clone();
        let writable = options.write;

        let file = task::spawn_blocking(move || Self::open_sync(&path_clone, &options))
            .await
            .map_err(|e| IoError::TaskFailed {
                message: e.to_string(),
            })??;

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path,
            writable,
        })
    }

    /// Opens a block file for reading only.
    pub async fn open_read(path: impl AsRef<Path>) -> IoResult<Self> {
        Self::open(path, OpenOptions::for_read()).await
    }

    /// Creates (or opens) a block file for building.
    pub async fn create(path: impl AsRef<Path>) -> IoResult<Self> {
        Self::open(path, OpenOptions::for_create()).await
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_sync(path: &Path, options: &OpenOptions) -> IoResult<StdFile> {
        #[allow(unused_mut)]
        let mut std_opts = options.to_std_options();

        #[cfg(target_os = "linux")]
        if options.direct_io {
            use std::os::unix::fs::OpenOptionsExt;
            std_opts.custom_flags(libc::O_DIRECT);
        }

        let file = std_opts
            .open(path)
            .map_err(|e| IoError::from_io_with_path(e, path))?;

        if let Some(size) = options.preallocate {
            Self::preallocate_sync(&file, size)?;
        }

        Ok(file)
    }

    #[cfg(target_os = "linux")]
    fn preallocate_sync(file: &StdFile, len: u64) -> IoResult<()> {
        use std::os::unix::io::AsRawFd;
        let ret = unsafe { libc::posix_fallocate(file.as_raw_fd(), 0, len as i64) };
        if ret != 0 {
            return Err(IoError::Io {
                source: std::io::Error::from_raw_os_error(ret),
            });
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn preallocate_sync(file: &StdFile, len: u64) -> IoResult<()> {
        let current = file.metadata().map(|m| m.len()).unwrap_or(0);
        if current < len {
            file.set_len(len).map_err(|e| IoError::Io { source: e })?;
        }
        Ok(())
    }

    /// Runs a closure against the locked file on the blocking pool.
    async fn with_file<R, F>(&self, op: F) -> IoResult<R>
    where
        F: FnOnce(&mut StdFile) -> IoResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let file = Arc::clone(&self.file);
        task::spawn_blocking(move || {
            let mut file = file.lock();
            op(&mut file)
        })
        .await
        .map_err(|e| IoError::TaskFailed {
            message: e.to_string(),
        })?
    }

    fn require_writable(&self, operation: &'static str) -> IoResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(IoError::InvalidOperation {
                operation,
                mode: "read-only",
            })
        }
    }
}

impl BlockFile for StandardBlockFile {
    async fn size(&self) -> IoResult<u64> {
        self.with_file(|file| {
            file.metadata()
                .map(|m| m.len())
                .map_err(|e| IoError::Io { source: e })
        })
        .await
    }

    async fn read_some(&self, offset: u64, buf: &mut [u8]) -> IoResult<usize> {
        let len = buf.len();
        let (n, owned) = self
            .with_file(move |file| {
                let mut owned = vec![0u8; len];
                file.seek(SeekFrom::Start(offset))
                    .map_err(|e| IoError::Io { source: e })?;
                let n = file.read(&mut owned).map_err(|e| IoError::Io { source: e })?;
                Ok((n, owned))
            })
            .await?;

        buf[..n].copy_from_slice(&owned[..n]);
        Ok(n)
    }

    async fn write_some(&self, offset: u64, buf: &[u8]) -> IoResult<usize> {
        self.require_writable("write_some")?;

        let owned = buf.to_vec();
        self.with_file(move |file| {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| IoError::Io { source: e })?;
            file.write(&owned).map_err(|e| IoError::Io { source: e })
        })
        .await
    }

    async fn truncate_at_least(&self, len: u64) -> IoResult<()> {
        self.require_writable("truncate_at_least")?;

        self.with_file(move |file| {
            let current = file.metadata().map(|m| m.len()).map_err(|e| IoError::Io {
                source: e,
            })?;
            if current < len {
                file.set_len(len).map_err(|e| IoError::Io { source: e })?;
            }
            Ok(())
        })
        .await
    }

    async fn sync(&self) -> IoResult<()> {
        self.with_file(|file| file.sync_all().map_err(|e| IoError::Io { source: e }))
            .await
    }
}

impl std::fmt::Debug for StandardBlockFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardBlockFile")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .finish()
    }
}
