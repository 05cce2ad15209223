use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after successful mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    BatchCreated {
        batch_id: Uuid,
        product_id: Uuid,
        priority_level: i16,
    },
    /// Emitted by the expiry sweep with the number of batches flipped.
    BatchesSwept {
        updated: u64,
    },
    PrioritiesRefreshed {
        updated: u64,
    },
    ItemScanned {
        item_id: Uuid,
        batch_id: Uuid,
    },
    ItemStatusChanged {
        item_id: Uuid,
        old_status: String,
        new_status: String,
    },
}

/// Cloneable handle for publishing events onto the in-process channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background consumer for the event channel. Runs until every sender is
/// dropped. Today events are only logged; downstream subscribers (alerting,
/// webhooks) would hang off this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::BatchesSwept { updated } if *updated > 0 => {
                warn!(updated, "expiry sweep flipped batches to expired");
            }
            _ => {
                info!(?event, "domain event");
            }
        }
    }
    info!("event channel closed; processor exiting");
}
