//! Fixed-width worker pool over a pending queue

use std::collections::VecDeque;
use std::future::Future;
use tokio::task::JoinSet;

/// Runs queued tasks with at most `limit` in flight
///
/// Whenever the active set has room the next queued item is admitted;
/// when it is full the pool waits for *any* active task to finish.
/// Results come back in completion order.
#[derive(Debug, Clone, Copy)]
pub struct BoundedPool {
    limit: usize,
}

impl BoundedPool {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drain `items` through the pool, building each task with `make_task`
    ///
    /// A task that panics is logged and contributes no result.
    pub async fn run<I, F, Fut, T>(&self, items: I, mut make_task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut queue: VecDeque<I::Item> = items.into_iter().collect();
        let mut active = JoinSet::new();
        let mut finished = Vec::with_capacity(queue.len());

        loop {
            while active.len() < self.limit {
                match queue.pop_front() {
                    Some(item) => {
                        active.spawn(make_task(item));
                    }
                    None => break,
                }
            }

            match active.join_next().await {
                Some(Ok(output)) => finished.push(output),
                Some(Err(e)) => log::error!("❌ Pool task failed: {}", e),
                None => break,
            }
        }

        finished
    }
}
