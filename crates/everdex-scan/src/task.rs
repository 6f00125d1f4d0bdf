//! Background crawls on the tokio blocking pool.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::crawler::Crawler;
use crate::progress::IndexEvent;

/// Channel buffer size for crawl events.
pub const EVENT_CHANNEL_SIZE: usize = 100;

/// Start indexing a folder in the background.
///
/// The receiver yields progress events followed by exactly one
/// [`IndexEvent::Indexed`] or [`IndexEvent::Failed`]. Progress events are
/// dropped rather than stalling the crawl when the receiver falls behind.
pub fn start_index(crawler: Crawler, folder: PathBuf, reconcile: bool) -> mpsc::Receiver<IndexEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let progress_tx = tx.clone();
        let on_progress: &mut dyn FnMut(u64) = &mut |files| {
            let _ = progress_tx.try_send(IndexEvent::Progress {
                folder: folder.clone(),
                files,
            });
        };

        let event = match crawler.index(&folder, reconcile, Some(on_progress)) {
            Ok(outcome) => IndexEvent::Indexed(outcome),
            Err(err) => IndexEvent::Failed(err),
        };
        let _ = tx.blocking_send(event);
    });

    rx
}

/// Start a rescan in the background.
///
/// The receiver yields progress events tagged with the folder being indexed,
/// followed by exactly one [`IndexEvent::Rescanned`] or [`IndexEvent::Failed`].
pub fn start_rescan(crawler: Crawler, root: PathBuf, reconcile: bool) -> mpsc::Receiver<IndexEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let progress_tx = tx.clone();
        let on_progress: &mut dyn FnMut(&Path, u64) = &mut |folder, files| {
            let _ = progress_tx.try_send(IndexEvent::Progress {
                folder: folder.to_path_buf(),
                files,
            });
        };

        let event = match crawler.rescan_under_root(&root, reconcile, Some(on_progress)) {
            Ok(outcome) => IndexEvent::Rescanned(outcome),
            Err(err) => IndexEvent::Failed(err),
        };
        let _ = tx.blocking_send(event);
    });

    rx
}
