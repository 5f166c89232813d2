use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the workflow services after a successful
/// transition. Carried over an injected channel instead of any ambient
/// global notification state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Disposal request lifecycle
    DisposalRequestCreated(Uuid),
    DisposalRequestSubmitted(Uuid),
    DisposalRequestApproved {
        request_id: Uuid,
        approver: Uuid,
    },
    DisposalRequestRejected {
        request_id: Uuid,
        reason: String,
    },
    DisposalRequestAssigned {
        request_id: Uuid,
        assignee: Uuid,
    },
    DisposalRequestUpdated(Uuid),
    DisposalRequestDeleted(Uuid),
    DisposalRequestCompleted(Uuid),

    // Disposal note lifecycle
    DisposalNoteCreated {
        note_id: Uuid,
        request_id: Uuid,
    },
    DisposalNoteApproved(Uuid),

    // Goods issue note lifecycle
    GoodsIssueNoteCreated(Uuid),
    GoodsIssueNoteCompleted(Uuid),

    // Picking
    PickConfirmed {
        allocation_id: Uuid,
        picked_package_quantity: i32,
    },
    RePickRequested {
        detail_id: Uuid,
        requested_by: Uuid,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes domain events from the channel and logs them. Downstream
/// notification fan-out hangs off this task rather than the request path.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::DisposalRequestRejected { request_id, reason } => {
                info!(request_id = %request_id, reason = %reason, "disposal request rejected");
            }
            Event::RePickRequested {
                detail_id,
                requested_by,
                reason,
            } => {
                info!(
                    detail_id = %detail_id,
                    requested_by = %requested_by,
                    reason = reason.as_deref().unwrap_or(""),
                    "re-pick requested"
                );
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    warn!("event channel closed; event processor shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::DisposalRequestCreated(Uuid::nil()))
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::DisposalRequestCreated(id)) => assert_eq!(id, Uuid::nil()),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::DisposalRequestDeleted(Uuid::nil())).await;
        assert!(result.is_err());
    }
}
