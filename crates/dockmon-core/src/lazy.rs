// ── Batched lazy fetching ──
//
// Runs one async job per name, `batch_size` at a time: concurrently within
// a batch, batches strictly one after another.

use std::future::Future;

use futures_util::future::join_all;

/// Run `job` for every name in fixed-size batches. Returns how many jobs
/// reported success.
pub async fn run_in_batches<F, Fut>(names: &[String], batch_size: usize, job: F) -> usize
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut succeeded = 0;
    for chunk in names.chunks(batch_size.max(1)) {
        let results = join_all(chunk.iter().cloned().map(&job)).await;
        succeeded += results.into_iter().filter(|ok| *ok).count();
    }
    succeeded
}
