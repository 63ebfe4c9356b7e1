use crate::envelope::Envelope;
use crate::handler::HandlerOutcome;
use crate::idempotence::SeenIdCache;
use ims_core::channel::BoundedRx;
use ims_core::metric::{Field, Metric, Tag};
use ims_core::retry::Policy;
use ims_core::{MetricHook, NoopMetricHook};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

/// Default per-partition last-seen-id cache size.
pub const DEFAULT_SEEN_ID_CAPACITY: usize = 10_000;

/// Drives a single partition to completion: pulls the next envelope,
/// de-duplicates it, invokes `handle`, and acts on the outcome. One
/// instance runs per partition, which is how the pipeline gets per-key
/// (partition) serialisation with cross-partition parallelism (spec.md
/// §4.1/§5).
pub struct PartitionWorker<T> {
    partition: usize,
    rx: BoundedRx<Envelope<T>>,
    seen: SeenIdCache,
    retry_policy: Policy,
    metric_hook: Arc<dyn MetricHook>,
}

/// What a partition worker did with one envelope, surfaced for tests and
/// metrics rather than swallowed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum WorkerAction {
    Applied,
    DuplicateSkipped,
    DeadLettered(String),
    RetriesExhausted,
}

impl<T> PartitionWorker<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(partition: usize, rx: BoundedRx<Envelope<T>>, retry_policy: Policy) -> Self {
        Self {
            partition,
            rx,
            seen: SeenIdCache::new(DEFAULT_SEEN_ID_CAPACITY),
            retry_policy,
            metric_hook: Arc::new(NoopMetricHook),
        }
    }

    /// Attach a [`MetricHook`] so the dead-letter count (spec.md §4.1/§7) is
    /// surfaced to a metrics sink alongside the `warn!`/`error!` log lines.
    pub fn with_metric_hook(mut self, hook: Arc<dyn MetricHook>) -> Self {
        self.metric_hook = hook;
        self
    }

    pub fn partition(&self) -> usize {
        self.partition
    }

    fn record_dead_letter(&self, event_id: &str) {
        self.metric_hook.record(Metric {
            name: "dead_letter",
            time: 0,
            tags: vec![
                Tag::new("partition", self.partition.to_string()),
                Tag::new("event_id", event_id.to_string()),
            ],
            fields: vec![Field::new("count", 1i64)],
        });
    }

    /// Process the next envelope in this partition's bounded channel,
    /// retrying the handler in-place up to `retry_policy.max_attempts`
    /// times before giving up. Returns `None` once the channel is closed.
    pub async fn process_next<H, Fut>(&mut self, mut handle: H) -> Option<WorkerAction>
    where
        H: FnMut(Envelope<T>) -> Fut,
        Fut: Future<Output = HandlerOutcome>,
    {
        let envelope = self.rx.recv().await?;

        if self.seen.check_and_insert(&envelope.event_id) {
            return Some(WorkerAction::DuplicateSkipped);
        }

        let mut attempt: u32 = 1;
        let mut current = envelope;
        loop {
            match handle(current.clone()).await {
                HandlerOutcome::Ok => return Some(WorkerAction::Applied),
                HandlerOutcome::Dead(reason) => {
                    warn!(
                        partition = self.partition,
                        event_id = %current.event_id,
                        reason,
                        "event dead-lettered"
                    );
                    self.record_dead_letter(&current.event_id);
                    return Some(WorkerAction::DeadLettered(reason));
                }
                HandlerOutcome::Retry(_) => {
                    if self.retry_policy.is_exhausted(attempt) {
                        error!(
                            partition = self.partition,
                            event_id = %current.event_id,
                            attempt,
                            "retries exhausted, dead-lettering"
                        );
                        self.record_dead_letter(&current.event_id);
                        return Some(WorkerAction::RetriesExhausted);
                    }
                    if let Some(delay) = self.retry_policy.delay_for_attempt(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// A running pool of [`PartitionWorker`]s, one task per partition, so `P`
/// partitions are serviced by up to `P` concurrently-running workers
/// (spec.md §5: "A worker pool of `W` workers consumes from `P`
/// partitions").
pub struct WorkerPool {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn<T, H, Fut>(mut workers: Vec<PartitionWorker<T>>, handler_factory: Arc<H>) -> Self
    where
        T: Clone + Send + 'static,
        H: Fn(Envelope<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerOutcome> + Send + 'static,
    {
        let handles = workers
            .drain(..)
            .map(|mut worker| {
                let handler_factory = handler_factory.clone();
                tokio::spawn(async move {
                    while worker.process_next(|e| handler_factory(e)).await.is_some() {}
                })
            })
            .collect();
        Self { handles }
    }

    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }

    pub fn abort_all(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RoutingKey;
    use chrono::Utc;
    use ims_core::channel::mpsc_bounded;
    use ims_model::{BusinessDate, SecurityId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn envelope(id: &str) -> Envelope<u32> {
        Envelope {
            event_id: id.to_string(),
            event_type: "trade".into(),
            source: "trade-data".into(),
            emit_time: Utc::now(),
            business_date: BusinessDate(Utc::now().date_naive()),
            correlation_id: "corr-1".into(),
            routing_key: RoutingKey::reference(&SecurityId::from("SEC-1")),
            deadline: None,
            payload: 1,
        }
    }

    #[tokio::test]
    async fn successful_handler_applies_once() {
        let (tx, rx) = mpsc_bounded(8);
        tx.send(envelope("evt-1")).await.unwrap();
        drop(tx);
        let mut worker = PartitionWorker::new(0, rx, Policy::pipeline_default());
        let action = worker.process_next(|_| async { HandlerOutcome::Ok }).await;
        assert_eq!(action, Some(WorkerAction::Applied));
    }

    #[tokio::test]
    async fn duplicate_event_id_is_skipped_without_invoking_handler() {
        let (tx, rx) = mpsc_bounded(8);
        tx.send(envelope("evt-1")).await.unwrap();
        tx.send(envelope("evt-1")).await.unwrap();
        drop(tx);
        let mut worker = PartitionWorker::new(0, rx, Policy::pipeline_default());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let calls = calls.clone();
            worker
                .process_next(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { HandlerOutcome::Ok }
                })
                .await
        };
        let second = {
            let calls = calls.clone();
            worker
                .process_next(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { HandlerOutcome::Ok }
                })
                .await
        };

        assert_eq!(first, Some(WorkerAction::Applied));
        assert_eq!(second, Some(WorkerAction::DuplicateSkipped));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dead_lettered_events_are_recorded_on_the_attached_metric_hook() {
        let (tx, rx) = mpsc_bounded(8);
        tx.send(envelope("evt-1")).await.unwrap();
        drop(tx);
        let hook = Arc::new(ims_core::VecMetricHook::default());
        let mut worker = PartitionWorker::new(0, rx, Policy::pipeline_default()).with_metric_hook(hook.clone());
        let action = worker
            .process_next(|_| async { HandlerOutcome::Dead("bad envelope".into()) })
            .await;
        assert_eq!(action, Some(WorkerAction::DeadLettered("bad envelope".into())));
        assert_eq!(hook.count("dead_letter"), 1);
    }

    #[tokio::test]
    async fn retry_outcome_exhausts_after_max_attempts() {
        let (tx, rx) = mpsc_bounded(8);
        tx.send(envelope("evt-1")).await.unwrap();
        drop(tx);
        let policy = Policy {
            base: std::time::Duration::from_millis(1),
            factor: 1,
            cap: std::time::Duration::from_millis(1),
            max_attempts: 2,
        };
        let mut worker = PartitionWorker::new(0, rx, policy);
        let action = worker
            .process_next(|_| async { HandlerOutcome::Retry(std::time::Duration::from_millis(1)) })
            .await;
        assert_eq!(action, Some(WorkerAction::RetriesExhausted));
    }
}
