use std::future::Future;

use futures::StreamExt;
use futures::stream;

use crate::models::DataRequest;

/// Ceiling on concurrent sub-fetches within one lookup.
pub const WORKER_LIMIT: usize = 4;

/// Runs a batch of sub-fetches with bounded concurrency and returns their
/// results in submission order, regardless of completion order. Each slot
/// carries its own error state; a failed fetch never disturbs its neighbors.
pub async fn run_batch<T, E, F, Fut>(requests: Vec<DataRequest>, fetch: F) -> Vec<Result<T, E>>
where
    F: Fn(DataRequest) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(requests)
        .map(fetch)
        .buffered(WORKER_LIMIT)
        .collect()
        .await
}
