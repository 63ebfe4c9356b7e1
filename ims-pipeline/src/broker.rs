use crate::envelope::{Envelope, RoutingKey};
use crate::partition::Partitioner;
use ims_core::channel::{mpsc_bounded, BoundedRx, BoundedTx, DEFAULT_PARTITION_CAPACITY};
use ims_core::CoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Returned by [`InMemoryBroker::publish`] once the message is durably
/// queued - the in-memory analogue of `acks=all` (spec.md §4.1).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Ack {
    pub partition: usize,
    pub offset: u64,
}

struct Partition<T> {
    tx: BoundedTx<Envelope<T>>,
    rx: Mutex<Option<BoundedRx<Envelope<T>>>>,
    next_offset: AtomicU64,
}

struct Topic<T> {
    partitions: Vec<Arc<Partition<T>>>,
}

/// In-process test double for the Event Pipeline's broker contract: a
/// bounded, partitioned channel per topic, keyed by [`Partitioner`].
/// Exercises the same back-pressure and per-key ordering guarantees a real
/// broker (Kafka, Pulsar, ...) provides; the real adapter is an external
/// collaborator and is not implemented here.
pub struct InMemoryBroker<T> {
    partition_count: usize,
    capacity: usize,
    topics: Mutex<HashMap<String, Topic<T>>>,
}

impl<T> InMemoryBroker<T>
where
    T: Send + 'static,
{
    pub fn new(partition_count: usize) -> Self {
        Self::with_capacity(partition_count, DEFAULT_PARTITION_CAPACITY)
    }

    pub fn with_capacity(partition_count: usize, capacity: usize) -> Self {
        Self {
            partition_count,
            capacity,
            topics: Mutex::new(HashMap::new()),
        }
    }

    fn partitioner(&self) -> Partitioner {
        Partitioner::new(self.partition_count)
    }

    fn ensure_topic<'a>(
        topics: &'a mut HashMap<String, Topic<T>>,
        topic: &str,
        partition_count: usize,
        capacity: usize,
    ) -> &'a Topic<T> {
        topics.entry(topic.to_string()).or_insert_with(|| {
            let partitions = (0..partition_count)
                .map(|_| {
                    let (tx, rx) = mpsc_bounded(capacity);
                    Arc::new(Partition {
                        tx,
                        rx: Mutex::new(Some(rx)),
                        next_offset: AtomicU64::new(0),
                    })
                })
                .collect();
            Topic { partitions }
        })
    }

    /// Publish `envelope` to `topic`, partitioned by `key`. Blocks (applying
    /// back-pressure) when the target partition's bounded channel is full.
    pub async fn publish(
        &self,
        topic: &str,
        key: &RoutingKey,
        envelope: Envelope<T>,
    ) -> Result<Ack, CoreError> {
        let partition_index = self.partitioner().assign(key);
        let partition = {
            let mut topics = self.topics.lock();
            let topic = Self::ensure_topic(&mut topics, topic, self.partition_count, self.capacity);
            topic.partitions[partition_index].clone()
        };
        partition
            .tx
            .send(envelope)
            .await
            .map_err(|_| CoreError::downstream_unavailable("broker partition closed"))?;
        let offset = partition.next_offset.fetch_add(1, Ordering::SeqCst);
        Ok(Ack {
            partition: partition_index,
            offset,
        })
    }

    /// Hand off the receiving end of one partition to a worker. Each
    /// partition may only be taken once - ownership models "one worker per
    /// partition at a time" (spec.md §4.1).
    pub fn take_partition(&self, topic: &str, partition: usize) -> Option<BoundedRx<Envelope<T>>> {
        let mut topics = self.topics.lock();
        let topic = Self::ensure_topic(&mut topics, topic, self.partition_count, self.capacity);
        topic.partitions.get(partition)?.rx.lock().take()
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }
}
