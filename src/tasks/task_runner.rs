use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;
use tracing::{info, warn};

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Collects long-running background futures and spawns them together.
pub struct TaskRunner {
    tasks: Vec<(&'static str, Task)>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn add_task<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push((name, Box::pin(task)));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn start_all(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|(name, task)| {
                info!(task = name, "starting background task");
                tokio::spawn(async move {
                    task.await;
                    warn!(task = name, "background task finished");
                })
            })
            .collect()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_every_added_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut runner = TaskRunner::new();
        for name in ["one", "two"] {
            let counter = counter.clone();
            runner.add_task(name, async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(runner.len(), 2);

        for handle in runner.start_all() {
            handle.await.unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
