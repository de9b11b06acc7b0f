//! Bounded worker pool for per-issue downloads.

use super::progress::ProgressSink;
use crate::error::{JiraMetricsError, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Default number of concurrent Jira requests.
pub const DEFAULT_WORKERS: usize = 12;

/// Run `fetch` for every key on a pool of `workers` threads.
///
/// Results keep the input order. A failing key does not stop the others;
/// its error is returned next to the key. Progress is reported after each
/// key completes.
///
/// # Errors
///
/// Returns an error only if the thread pool cannot be created.
pub fn fetch_all<T, F>(
    keys: &[String],
    workers: usize,
    stage: &str,
    progress: &dyn ProgressSink,
    fetch: F,
) -> Result<Vec<(String, Result<T>)>>
where
    T: Send,
    F: Fn(&str) -> Result<T> + Sync,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| JiraMetricsError::Config(format!("Failed to start worker pool: {e}")))?;

    let total = keys.len();
    let done = AtomicUsize::new(0);
    progress.update(stage, 0, total);
    debug!(total, workers, stage, "Starting worker pool");

    let results = pool.install(|| {
        keys.par_iter()
            .map(|key| {
                let result = fetch(key);
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                progress.update(stage, finished, total);
                (key.clone(), result)
            })
            .collect()
    });

    Ok(results)
}
