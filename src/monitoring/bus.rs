/*!
 * Event Bus
 * Broadcast scheduler events to every live subscriber
 */

use super::events::SchedulerEvent;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Fan-out of scheduler events over unbounded flume channels
///
/// Disconnected subscribers are pruned on the next publish.
pub struct EventBus {
    subscribers: Mutex<Vec<flume::Sender<SchedulerEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new subscriber; it sees every event published after this call
    pub fn subscribe(&self) -> flume::Receiver<SchedulerEvent> {
        let (tx, rx) = flume::unbounded();
        let mut subscribers = self.subscribers.lock();
        subscribers.push(tx);
        debug!(subscribers = subscribers.len(), "event subscriber added");
        rx
    }

    /// Log and broadcast an event, returning the number of receivers reached
    pub fn publish(&self, event: &SchedulerEvent) -> usize {
        match event {
            SchedulerEvent::ProcessFailed { id, cause } => {
                warn!(id = *id, cause = %cause, "{}", event.name());
            }
            SchedulerEvent::CapacityChanged { capacity } => {
                info!(capacity = *capacity, "{}", event.name());
            }
            _ => {
                if let Some(id) = event.process_id() {
                    info!(id, "{}", event.name());
                }
            }
        }

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
