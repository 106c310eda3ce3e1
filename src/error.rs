use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the producer boundary.
///
/// Reconciliation itself never fails: unreadable paths become
/// `invalid_file_path` entries and probe errors count as "does not exist".
#[derive(Debug, Error)]
pub enum WatchError {
    /// The kernel refused another watch handle (inotify `ENOSPC`).
    #[error(
        "unable to monitor {} for changes: the inotify watch limit is exhausted; \
         raise it with `sysctl fs.inotify.max_user_watches=524288`",
        path.display()
    )]
    WatchCapacityExhausted { path: PathBuf },

    #[error("watch root does not exist: {}", .0.display())]
    RootMissing(PathBuf),

    #[error("invalid ignore pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Notify(notify::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `ENOSPC` as reported by inotify_add_watch when `max_user_watches` is hit.
const ENOSPC: i32 = 28;

impl WatchError {
    /// Classify a notify error raised while watching `path`.
    ///
    /// Watch-limit exhaustion gets its own variant because the fix lives with
    /// the user, not the program.
    pub fn from_notify(err: notify::Error, path: PathBuf) -> Self {
        let exhausted = match &err.kind {
            notify::ErrorKind::MaxFilesWatch => true,
            notify::ErrorKind::Io(io) => io.raw_os_error() == Some(ENOSPC),
            _ => false,
        };
        if exhausted {
            WatchError::WatchCapacityExhausted { path }
        } else {
            WatchError::Notify(err)
        }
    }
}
