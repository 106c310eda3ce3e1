pub mod batch;
pub mod event;

use std::path::Path;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Instant;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;
use tokio::task::JoinHandle;

use crate::change::RawChange;
use crate::config::SquashConfig;
use crate::error::WatchError;

use batch::BatchCollector;

/// Handle to a running watcher. Keeps the OS watcher alive (dropping stops watching).
pub struct WatcherHandle {
    /// Keep alive: dropping the watcher closes the raw event channel, which
    /// flushes the last batch and ends the bridge task.
    _watcher: RecommendedWatcher,
    /// The bridge task batching raw events onto the tokio channel.
    _bridge_task: JoinHandle<()>,
}

/// Start a recursive watcher on `watch_root`.
///
/// Returns a `WatcherHandle` (must be kept alive) and a tokio mpsc receiver
/// that yields one batch of raw changes per quiet period. Batches arrive in
/// order; the consumer is expected to reconcile them one at a time.
pub fn start_watcher(
    watch_root: &Path,
    config: &SquashConfig,
) -> Result<(WatcherHandle, tokio_mpsc::Receiver<Vec<RawChange>>), WatchError> {
    if !watch_root.is_dir() {
        return Err(WatchError::RootMissing(watch_root.to_path_buf()));
    }
    let root = watch_root.canonicalize()?;

    let (std_tx, std_rx) = std::sync::mpsc::channel::<notify::Result<notify::Event>>();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = std_tx.send(res);
    })
    .map_err(|err| WatchError::from_notify(err, root.clone()))?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|err| WatchError::from_notify(err, root.clone()))?;

    let (tokio_tx, tokio_rx) = tokio_mpsc::channel::<Vec<RawChange>>(64);

    let encoding = config.encoding_policy();
    let respect_gitignore = config.respect_gitignore;
    let mut collector = BatchCollector::new(config.wait_for_delay(), config.max_batch_wait());

    // Bridge: spawn_blocking to receive from std channel, translate, batch, forward to tokio
    let bridge_task = tokio::task::spawn_blocking(move || {
        loop {
            let received = match collector.time_left(Instant::now()) {
                Some(wait) => std_rx.recv_timeout(wait),
                None => std_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Ok(event)) => {
                    let changes = event::with_tree_contents(
                        event::translate(&event, &root, &encoding),
                        &encoding,
                        respect_gitignore,
                    );
                    collector.push(changes, Instant::now());
                }
                Ok(Err(err)) => {
                    let err = WatchError::from_notify(err, root.clone());
                    tracing::error!("watch error: {err}");
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    if let Some(batch) = collector.drain() {
                        let _ = tokio_tx.blocking_send(batch);
                    }
                    return;
                }
            }

            if let Some(batch) = collector.take_if_quiet(Instant::now()) {
                tracing::debug!(raw = batch.len(), "flushing batch");
                if tokio_tx.blocking_send(batch).is_err() {
                    return; // receiver dropped, shutdown
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            _watcher: watcher,
            _bridge_task: bridge_task,
        },
        tokio_rx,
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = start_watcher(&dir.path().join("absent"), &SquashConfig::default())
            .err()
            .expect("missing root should fail");
        assert!(matches!(err, WatchError::RootMissing(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_creation_arrives_as_a_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = SquashConfig {
            wait_for_delay_ms: 50,
            ..SquashConfig::default()
        };
        let (_handle, mut batches) = start_watcher(dir.path(), &config).unwrap();

        fs::write(dir.path().join("hello.txt"), "hi").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), batches.recv())
            .await
            .expect("no batch within 5s")
            .expect("channel closed");
        assert!(
            batch
                .iter()
                .any(|c| c.relative_path == Path::new("hello.txt")),
            "batch should mention hello.txt: {batch:?}"
        );
    }
}
