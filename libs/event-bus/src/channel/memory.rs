use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use flume::{Receiver, Sender};

use super::{ChannelError, Delivery, MessageChannel, MessageSource};

const DEFAULT_BLOCK: Duration = Duration::from_millis(100);

/// A message parked after exhausting its redeliveries
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub delivery: Delivery,
    pub reason: String,
}

/// In-process queue over flume channels. Clones share the same queue, so
/// one clone can be handed to the publisher and another to the consumer.
#[derive(Clone)]
pub struct MemoryChannel {
    name: Arc<str>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
    dead_tx: Sender<DeadLetter>,
    dead_rx: Receiver<DeadLetter>,
    next_id: Arc<AtomicU64>,
    in_flight: Arc<AtomicU64>,
    block: Duration,
}

impl MemoryChannel {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let (tx, rx) = flume::unbounded();
        let (dead_tx, dead_rx) = flume::unbounded();

        Self {
            name: name.into(),
            tx,
            rx,
            dead_tx,
            dead_rx,
            next_id: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicU64::new(0)),
            block: DEFAULT_BLOCK,
        }
    }

    /// How long `receive` waits on an empty queue before returning `None`
    pub fn with_block(mut self, block: Duration) -> Self {
        self.block = block;
        self
    }

    /// Messages waiting to be received
    pub fn len(&self) -> usize { self.rx.len() }

    pub fn is_empty(&self) -> bool { self.rx.is_empty() }

    /// Messages received but not yet settled
    pub fn in_flight(&self) -> u64 { self.in_flight.load(Ordering::Relaxed) }

    /// Drains the dead-letter sink
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_rx.try_iter().collect()
    }

    fn enqueue(&self, payload: Bytes, attempt: u32) -> Result<(), ChannelError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tx
            .send(Delivery {
                id: id.to_string(),
                payload,
                attempt,
            })
            .map_err(|_| ChannelError::Closed)
    }

    fn settle(&self) {
        // saturating: settling an unknown delivery must not wrap
        let _ = self.in_flight.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |n| Some(n.saturating_sub(1)),
        );
    }
}

#[async_trait]
impl MessageChannel for MemoryChannel {
    fn name(&self) -> &str { &self.name }

    async fn publish(&self, payload: Bytes) -> Result<(), ChannelError> {
        self.enqueue(payload, 0)
    }
}

#[async_trait]
impl MessageSource for MemoryChannel {
    fn name(&self) -> &str { &self.name }

    async fn receive(&self) -> Result<Option<Delivery>, ChannelError> {
        match tokio::time::timeout(self.block, self.rx.recv_async()).await {
            Ok(Ok(delivery)) => {
                self.in_flight.fetch_add(1, Ordering::Relaxed);
                Ok(Some(delivery))
            }
            Ok(Err(_)) => Err(ChannelError::Closed),
            Err(_) => Ok(None),
        }
    }

    async fn ack(&self, _delivery: &Delivery) -> Result<(), ChannelError> {
        self.settle();
        Ok(())
    }

    async fn nack(
        &self, delivery: &Delivery, requeue: bool,
    ) -> Result<(), ChannelError> {
        self.settle();
        if requeue {
            self.enqueue(delivery.payload.clone(), delivery.attempt + 1)?;
        }
        Ok(())
    }

    async fn dead_letter(
        &self, delivery: &Delivery, reason: &str,
    ) -> Result<(), ChannelError> {
        self.settle();
        self.dead_tx
            .send(DeadLetter {
                delivery: delivery.clone(),
                reason: reason.to_string(),
            })
            .map_err(|_| ChannelError::Closed)
    }
}
