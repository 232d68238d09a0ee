//! Background signal dispatch task

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::broadcast::{EmergencyAction, EmergencyActionReceiver};

/// Deliver fired triggers to the receiver one at a time
pub async fn signal_dispatch_task(
    receiver: Arc<EmergencyActionReceiver>,
    mut dispatch_rx: mpsc::UnboundedReceiver<EmergencyAction>,
) {
    info!("Starting signal dispatch task");

    while let Some(action) = dispatch_rx.recv().await {
        debug!("Dispatching {}", action.action_name());
        receiver.handle(action);
    }

    info!("Signal dispatch channel closed, stopping dispatch task");
}
