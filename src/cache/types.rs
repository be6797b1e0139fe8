use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors raised while constructing a [`TagTranslationCache`](super::TagTranslationCache).
///
/// Refreshes and lookups never fail; these are the only errors the cache surfaces.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache schedules refreshes on the current tokio runtime
    #[error("Tag translation cache must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Failed to build the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// How a background refresh ended.
///
/// Informational only. Every variant other than `Published` leaves the cache empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A snapshot was built and published
    Published {
        /// Number of namespaces in the published snapshot
        namespaces: usize,
    },
    /// Another refresh held the lock; nothing was done
    Contended,
    /// The storage directory is missing or could not be created
    StorageMissing,
    /// The data file does not exist
    DataMissing,
    /// The download failed; the persisted data file was not touched
    DownloadFailed,
    /// The downloaded file could not be moved into place
    ReplaceFailed,
    /// The data file was unreadable and has been deleted
    Corrupt,
    /// The background task panicked or was cancelled
    Aborted,
}

/// Handle to a scheduled refresh.
///
/// Dropping it does not cancel the refresh.
#[derive(Debug)]
pub struct RefreshHandle {
    /// Background task
    task: JoinHandle<RefreshOutcome>,
}

impl RefreshHandle {
    /// Wraps a spawned refresh task.
    pub(super) const fn new(task: JoinHandle<RefreshOutcome>) -> Self {
        Self { task }
    }

    /// Waits for the refresh to finish.
    pub async fn wait(self) -> RefreshOutcome {
        self.task.await.unwrap_or_else(|error| {
            tracing::error!(%error, "Tag translation refresh task failed");
            RefreshOutcome::Aborted
        })
    }
}
