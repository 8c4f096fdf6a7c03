//! Running patch operations off the caller's thread.
//!
//! A game server's tick thread must not wait on database I/O. A
//! [`Dispatcher`] spawns each operation onto a Tokio runtime and hands back a
//! [`PendingTask`]. The caller then chooses where the blocking point is:
//! await it, block on it from a plain thread, or detach it and let failures
//! be logged.

use std::future::Future;

use placebreak_store::TagRepository;
use placebreak_types::{ActionType, Block, Direction, DisplacementSet, Location, Tag};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::PatchError;
use crate::service::PatchService;

/// A dispatched operation whose result has not been collected yet.
#[derive(Debug)]
#[must_use = "a pending task does nothing visible unless joined, waited or detached"]
pub struct PendingTask<T> {
    operation: &'static str,
    runtime: Handle,
    handle: JoinHandle<Result<T, PatchError>>,
}

impl<T: Send + 'static> PendingTask<T> {
    fn spawn<F>(runtime: &Handle, operation: &'static str, future: F) -> Self
    where
        F: Future<Output = Result<T, PatchError>> + Send + 'static,
    {
        Self {
            operation,
            runtime: runtime.clone(),
            handle: runtime.spawn(future),
        }
    }

    /// Name of the dispatched operation.
    pub const fn operation(&self) -> &'static str {
        self.operation
    }

    /// Whether the operation has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the result from async code.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or [`PatchError::Task`] if the task
    /// panicked or the runtime shut down first.
    pub async fn join(self) -> Result<T, PatchError> {
        let operation = self.operation;
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(PatchError::Task {
                operation,
                reason: err.to_string(),
            }),
        }
    }

    /// Block the current thread until the result is ready.
    ///
    /// For host threads outside the runtime. Calling this from inside an
    /// async task stalls that runtime worker.
    ///
    /// # Errors
    ///
    /// See [`join`](Self::join).
    pub fn wait(self) -> Result<T, PatchError> {
        futures::executor::block_on(self.join())
    }

    /// Let the operation finish in the background, logging a failure.
    pub fn detach(self) {
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let operation = self.operation;
            if let Err(err) = self.join().await {
                tracing::warn!(operation, error = %err, "Detached patch operation failed");
            }
        });
    }
}

/// Spawns [`PatchService`] operations onto a runtime.
#[derive(Debug)]
pub struct Dispatcher<R> {
    service: PatchService<R>,
    runtime: Handle,
}

impl<R> Clone for Dispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<R: TagRepository + 'static> PatchService<R> {
    /// Create a dispatcher that runs this service's operations on `runtime`.
    pub fn dispatch(&self, runtime: Handle) -> Dispatcher<R> {
        Dispatcher {
            service: self.clone(),
            runtime,
        }
    }
}

impl<R: TagRepository + 'static> Dispatcher<R> {
    /// Dispatch [`PatchService::put_tag`].
    pub fn put_tag(&self, location: Location, ephemeral: bool) -> PendingTask<Tag> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "put_tag", async move {
            service.put_tag(location, ephemeral).await
        })
    }

    /// Dispatch [`PatchService::remove_tag`].
    pub fn remove_tag(&self, location: Location) -> PendingTask<()> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "remove_tag", async move {
            service.remove_tag(&location).await
        })
    }

    /// Dispatch [`PatchService::move_tags`].
    pub fn move_tags(&self, displacements: DisplacementSet) -> PendingTask<usize> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "move_tags", async move {
            service.move_tags(&displacements).await
        })
    }

    /// Dispatch [`PatchService::is_exploit`].
    pub fn is_exploit(&self, action: ActionType, location: Location) -> PendingTask<bool> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "is_exploit", async move {
            service.is_exploit(action, &location).await
        })
    }

    /// Dispatch [`PatchService::put_block_tag`].
    pub fn put_block_tag(&self, block: Block, ephemeral: bool) -> PendingTask<Option<Tag>> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "put_block_tag", async move {
            service.put_block_tag(&block, ephemeral).await
        })
    }

    /// Dispatch [`PatchService::remove_block_tag`].
    pub fn remove_block_tag(&self, block: Block) -> PendingTask<bool> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "remove_block_tag", async move {
            service.remove_block_tag(&block).await
        })
    }

    /// Dispatch [`PatchService::move_blocks`].
    ///
    /// The displacements are computed on the calling thread, so nothing is
    /// spawned for an invalid move.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::Displacement`] for a zero direction or a block at
    /// the edge of the coordinate range.
    pub fn move_blocks(
        &self,
        blocks: &[Block],
        direction: Direction,
    ) -> Result<PendingTask<usize>, PatchError> {
        let displacements = self.service.block_displacements(blocks, direction)?;
        let service = self.service.clone();
        Ok(PendingTask::spawn(&self.runtime, "move_blocks", async move {
            service.move_tags(&displacements).await
        }))
    }

    /// Dispatch [`PatchService::is_block_exploit`].
    pub fn is_block_exploit(&self, action: ActionType, block: Block) -> PendingTask<bool> {
        let service = self.service.clone();
        PendingTask::spawn(&self.runtime, "is_block_exploit", async move {
            service.is_block_exploit(action, &block).await
        })
    }
}
