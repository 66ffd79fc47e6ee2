//! Bounded update queue and the worker pool that drains it.
//!
//! The queue is created once at startup. The cycle controller holds the
//! [`UpdateProducer`], the workers share the [`UpdateConsumer`]. Pushing into
//! a full queue waits for a worker to make room, so a slow external service
//! slows down the polling cycle instead of losing updates.

use crate::task::UpdateTask;
use async_trait::async_trait;
use log::{debug, error, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("update queue is closed")]
pub struct QueueClosed;

/// Creates a queue holding at most `capacity` pending tasks.
pub fn update_queue(capacity: usize) -> (UpdateProducer, UpdateConsumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let producer = UpdateProducer {
        sender,
        enqueued: Arc::new(AtomicUsize::new(0)),
    };
    let consumer = UpdateConsumer {
        receiver: Arc::new(Mutex::new(receiver)),
    };
    (producer, consumer)
}

/// Sending half of the update queue.
///
/// The queue closes once every producer is dropped; workers then finish the
/// remaining tasks and exit.
#[derive(Debug, Clone)]
pub struct UpdateProducer {
    sender: mpsc::Sender<UpdateTask>,
    enqueued: Arc<AtomicUsize>,
}

impl UpdateProducer {
    /// Enqueues `task`, waiting while the queue is full.
    pub async fn push(&self, task: UpdateTask) -> Result<(), QueueClosed> {
        self.sender.send(task).await.map_err(|_| QueueClosed)?;
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Tasks waiting for a worker.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Tasks accepted since the queue was created.
    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::Relaxed)
    }
}

/// Receiving half of the update queue, shared by all workers.
#[derive(Debug, Clone)]
pub struct UpdateConsumer {
    receiver: Arc<Mutex<Receiver>>,
}

type Receiver = mpsc::Receiver<UpdateTask>;

impl UpdateConsumer {
    /// Claims the next task, waiting while the queue is empty. Returns `None`
    /// once the queue is closed and drained.
    pub async fn next(&self) -> Option<UpdateTask> {
        self.receiver.lock().await.recv().await
    }
}

/// Processes one claimed task. Failures are handled inside the handler.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: UpdateTask);
}

/// Fixed set of long-lived workers draining the update queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    processed: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawns `workers` tasks that run until the queue is closed and empty.
    pub fn start(consumer: UpdateConsumer, workers: usize, handler: Arc<dyn TaskHandler>) -> Self {
        let processed = Arc::new(AtomicUsize::new(0));
        let handles = (0..workers.max(1))
            .map(|worker| {
                let consumer = consumer.clone();
                let handler = Arc::clone(&handler);
                let processed = Arc::clone(&processed);

                tokio::spawn(async move {
                    debug!("update worker {} started", worker);
                    while let Some(task) = consumer.next().await {
                        handler.handle(task).await;
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                    debug!("update worker {} stopped", worker);
                })
            })
            .collect();

        Self { handles, processed }
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Tasks finished by any worker.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Waits for every worker to exit. Producers must be dropped first.
    pub async fn join(self) -> usize {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("update worker panicked: {}", e);
            }
        }
        let processed = self.processed.load(Ordering::Relaxed);
        info!("update workers stopped after {} task(s)", processed);
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;
    use crate::task::TemplateData;
    use tokio_test::{assert_pending, assert_ready};

    fn task(cycle: u64) -> UpdateTask {
        let target = Arc::new(Target::new("t", "127.0.0.1", 27016));
        let data = TemplateData::offline(&target);
        UpdateTask::new(target, cycle, data)
    }

    struct Recorder {
        cycles: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl TaskHandler for Recorder {
        async fn handle(&self, task: UpdateTask) {
            self.cycles.lock().await.push(task.cycle);
        }
    }

    #[tokio::test]
    async fn test_push_blocks_when_full() {
        let (producer, consumer) = update_queue(2);
        producer.push(task(1)).await.unwrap();
        producer.push(task(2)).await.unwrap();
        assert_eq!(producer.pending(), 2);

        let mut blocked = tokio_test::task::spawn(producer.push(task(3)));
        assert_pending!(blocked.poll());

        assert_eq!(consumer.next().await.map(|t| t.cycle), Some(1));
        assert!(blocked.is_woken());
        assert_ready!(blocked.poll()).unwrap();
        drop(blocked);

        assert_eq!(producer.pending(), 2);
        assert_eq!(producer.enqueued(), 3);
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let (producer, consumer) = update_queue(1);
        drop(consumer);
        assert_eq!(producer.push(task(1)).await, Err(QueueClosed));
        assert_eq!(producer.enqueued(), 0);
    }

    #[tokio::test]
    async fn test_fifo_order_single_worker() {
        let (producer, consumer) = update_queue(10);
        let recorder = Arc::new(Recorder {
            cycles: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::start(consumer, 1, recorder.clone());

        for cycle in 0..5 {
            producer.push(task(cycle)).await.unwrap();
        }
        drop(producer);

        assert_eq!(pool.join().await, 5);
        assert_eq!(*recorder.cycles.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_backpressure_loses_nothing() {
        let (producer, consumer) = update_queue(2);
        let recorder = Arc::new(Recorder {
            cycles: Mutex::new(Vec::new()),
        });
        let pool = WorkerPool::start(consumer, 3, recorder.clone());
        assert_eq!(pool.workers(), 3);

        for cycle in 0..50 {
            producer.push(task(cycle)).await.unwrap();
        }
        let enqueued = producer.enqueued();
        drop(producer);

        assert_eq!(pool.join().await, enqueued);
        let mut cycles = recorder.cycles.lock().await.clone();
        cycles.sort_unstable();
        assert_eq!(cycles, (0..50).collect::<Vec<_>>());
    }
}
