//! Bounded fan-out of batches within one file.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::AdapterError;
use crate::models::Entity;
use crate::text::Chunk;

/// Run `task` for every chunk with at most `workers` tasks in flight.
///
/// A permit is taken before a task starts and released the moment it
/// settles, admitting the next queued chunk. All tasks run to completion even
/// after a failure; the first error then becomes the result and every
/// entity is discarded. Entity order across chunks carries no meaning.
pub async fn run_batches<'a, F, Fut>(
    label: &str,
    chunks: Vec<Chunk<'a>>,
    workers: usize,
    task: F,
) -> Result<Vec<Entity>, AdapterError>
where
    F: Fn(Chunk<'a>) -> Fut,
    Fut: Future<Output = Result<Vec<Entity>, AdapterError>>,
{
    if chunks.len() == 1 {
        let chunk = chunks[0];
        return task(chunk).await;
    }

    let total = chunks.len();
    let semaphore = Semaphore::new(workers.max(1));
    let task = &task;
    let semaphore = &semaphore;

    let mut pending: FuturesUnordered<_> = chunks
        .into_iter()
        .map(|chunk| async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| AdapterError::LimiterClosed)?;
            task(chunk).await
        })
        .collect();

    let mut entities = Vec::new();
    let mut failure = None;
    let mut finished = 0;

    while let Some(result) = pending.next().await {
        finished += 1;
        match result {
            Ok(batch) => {
                if failure.is_none() {
                    entities.extend(batch);
                }
                info!("{}: Finished batch {}/{}", label, finished, total);
            }
            Err(e) => {
                warn!("{}: Batch {}/{} failed: {}", label, finished, total, e);
                if failure.is_none() {
                    entities.clear();
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(entities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;
    use crate::text::split_text;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn entity(value: &str) -> Entity {
        Entity::new(EntityType::Person, value, None, value, "test")
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_workers() {
        let text = "word ".repeat(200);
        let chunks = split_text(&text, 50);
        assert!(chunks.len() >= 10);

        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let calls = AtomicUsize::new(0);

        let result = run_batches("test", chunks.clone(), 3, |chunk| {
            let in_flight = &in_flight;
            let peak = &peak;
            let calls = &calls;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5 + (chunk.index as u64 % 3) * 5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![entity(&chunk.index.to_string())])
            }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), chunks.len());
        assert_eq!(calls.load(Ordering::SeqCst), chunks.len());
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_one_failure_fails_all_without_cancelling() {
        let text = "word ".repeat(100);
        let chunks = split_text(&text, 50);
        let total = chunks.len();
        let settled = AtomicUsize::new(0);

        let result = run_batches("test", chunks, 2, |chunk| {
            let settled = &settled;
            async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                settled.fetch_add(1, Ordering::SeqCst);
                if chunk.index == 1 {
                    Err(AdapterError::Status {
                        backend: "fake",
                        status: 500,
                    })
                } else {
                    Ok(vec![entity("x")])
                }
            }
        })
        .await;

        assert!(matches!(result, Err(AdapterError::Status { status: 500, .. })));
        assert_eq!(settled.load(Ordering::SeqCst), total);
    }

    #[tokio::test]
    async fn test_single_chunk_runs_directly() {
        let calls = AtomicUsize::new(0);
        let chunks = split_text("short text", 100);
        let result = run_batches("test", chunks, 1, |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![entity("a"), entity("b")])
            }
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
