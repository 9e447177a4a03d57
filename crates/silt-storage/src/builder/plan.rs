//! The flush write plan and the driver that executes it.
//!
//! `flush_all` first turns the builder's state into a [`WritePlan`]
//! (a truncation length plus an ordered list of positional writes) and
//! then replays the plan against the block file. Keeping the plan
//! explicit makes the flush protocol testable without touching disk.

use bytes::Bytes;
use tracing::trace;

use crate::error::StorageResult;
use crate::file::BlockFile;

/// One positional write in a flush plan.
#[derive(Debug, Clone)]
pub struct PlannedWrite {
    /// Absolute file offset of the write.
    pub offset: u64,
    /// Bytes to write.
    pub data: Bytes,
}

/// An ordered flush plan.
///
/// Execution order is contractual: truncation first, then the writes in
/// list order. The builder arranges the list so that every page
/// pre-initialization write precedes the config block that references
/// it, and config blocks appear in chain order.
#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    /// Final file length passed to `truncate_at_least`.
    pub truncate_len: u64,
    /// Positional writes, in execution order.
    pub writes: Vec<PlannedWrite>,
}

impl WritePlan {
    /// Total bytes across all planned writes.
    #[must_use]
    pub fn write_bytes_total(&self) -> u64 {
        self.writes.iter().map(|w| w.data.len() as u64).sum()
    }
}

/// Replays a plan against a block file.
///
/// Short writes are retried by the sink trait's `write_all`; any I/O
/// error aborts the replay and is propagated verbatim. There is no
/// rollback: a failed replay leaves the file indeterminate.
pub async fn execute_plan<F: BlockFile>(file: &F, plan: &WritePlan) -> StorageResult<()> {
    file.truncate_at_least(plan.truncate_len).await?;

    for write in &plan.writes {
        trace!(
            offset = write.offset,
            len = write.data.len(),
            "storage file write"
        );
        file.write_all(write.offset, &write.data).await?;
    }

    Ok(())
}
