use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

pub type ClientId = u64;

/// Delivery counts for one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastSummary {
    pub delivered: usize,
    pub failed: usize,
    /// Subscribers dropped because their connection is gone
    pub pruned: usize,
}

/// Set of connected relay clients.
///
/// Each client is represented by the sending half of its outbound queue; the
/// connection task owns the receiving half and writes to the socket.
/// Broadcasting never waits on a client: a full queue is a failed delivery
/// for that client only, a closed queue removes it.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    subscribers: Arc<RwLock<HashMap<ClientId, mpsc::Sender<String>>>>,
    next_id: Arc<AtomicU64>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client queue and returns its id
    pub async fn add(&self, tx: mpsc::Sender<String>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.subscribers.write().await.insert(id, tx);
        id
    }

    /// Removes a client. Returns false if it was already gone.
    pub async fn remove(&self, id: ClientId) -> bool {
        self.subscribers.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    /// Queues `message` for every current subscriber.
    pub async fn broadcast(&self, message: &str) -> BroadcastSummary {
        let mut summary = BroadcastSummary::default();
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for (id, tx) in subscribers.iter() {
                match tx.try_send(message.to_string()) {
                    Ok(()) => summary.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        debug!("SubscriberRegistry: client {} queue full, skipping", id);
                        summary.failed += 1;
                    }
                    Err(TrySendError::Closed(_)) => {
                        summary.failed += 1;
                        closed.push(*id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in closed {
                if subscribers.remove(&id).is_some() {
                    summary.pruned += 1;
                }
            }
        }

        summary
    }
}
