use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::RealtimeEvent;
use crate::service::duplication::EventOutcome;
use crate::service::WorkflowService;

pub const EVENT_BUFFER: usize = 256;

pub fn channel() -> (mpsc::Sender<RealtimeEvent>, mpsc::Receiver<RealtimeEvent>) {
    mpsc::channel(EVENT_BUFFER)
}

/// Apply completion events as they arrive, until every sender is dropped
pub fn spawn_event_loop(
    service: Arc<WorkflowService>,
    mut events: mpsc::Receiver<RealtimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match service.apply_event(&event).await {
                EventOutcome::Patched(row) => {
                    tracing::info!("Waybill {} completed (row {})", event.identifier(), row)
                }
                EventOutcome::NotFound => {
                    tracing::debug!("Waybill {} completed but not loaded locally", event.identifier())
                }
            }
        }
        tracing::info!("Realtime channel closed");
    })
}
