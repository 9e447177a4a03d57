//! The block file trait.

use super::error::{IoError, IoResult};

/// Trait for asynchronous positional I/O on a raw block file.
///
/// The storage file builder writes through this trait during flush, and
/// the chain reader reads through it during recovery. Implementations
/// may suspend while awaiting the underlying device; callers treat every
/// method as a blocking call whose suspension is invisible.
///
/// All operations are position-based (pread/pwrite style).
#[allow(async_fn_in_trait)]
pub trait BlockFile: Send + Sync {
    /// Returns the current file size in bytes.
    async fn size(&self) -> IoResult<u64>;

    /// Reads data from the file at the specified offset.
    ///
    /// Returns the number of bytes read. May return less than the buffer
    /// size if EOF is reached.
    async fn read_some(&self, offset: u64, buf: &mut [u8]) -> IoResult<usize>;

    /// Writes data to the file at the specified offset.
    ///
    /// Returns the number of bytes written, which may be less than the
    /// buffer size.
    async fn write_some(&self, offset: u64, buf: &[u8]) -> IoResult<usize>;

    /// Extends the file to at least `len` bytes.
    ///
    /// Never shrinks the file.
    async fn truncate_at_least(&self, len: u64) -> IoResult<()>;

    /// Syncs all data and metadata to the underlying device.
    async fn sync(&self) -> IoResult<()>;

    /// Returns true if the backend initializes newly allocated pages
    /// natively, making per-page zero pre-initialization unnecessary.
    fn fast_page_init(&self) -> bool {
        false
    }

    /// Reads exactly `buf.len()` bytes at the specified offset.
    ///
    /// Returns an error if EOF is reached before the buffer is filled.
    async fn read_exact(&self, offset: u64, buf: &mut [u8]) -> IoResult<()> {
        let mut total_read = 0;
        while total_read < buf.len() {
            let n = self
                .read_some(offset + total_read as u64, &mut buf[total_read..])
                .await?;
            if n == 0 {
                return Err(IoError::short_read(buf.len(), total_read));
            }
            total_read += n;
        }
        Ok(())
    }

    /// Writes all bytes at the specified offset, retrying short writes
    /// by advancing the offset and slicing the buffer.
    async fn write_all(&self, offset: u64, buf: &[u8]) -> IoResult<()> {
        let mut total_written = 0;
        while total_written < buf.len() {
            let n = self
                .write_some(offset + total_written as u64, &buf[total_written..])
                .await?;
            if n == 0 {
                return Err(IoError::short_write(buf.len(), total_written));
            }
            total_written += n;
        }
        Ok(())
    }
}
