use crate::domain::jobs::JobEvent;
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct EventHub {
    sender: broadcast::Sender<JobEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        // Slow subscribers lag instead of blocking the supervisors
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Fails only when nobody is subscribed.
    pub fn publish(&self, event: JobEvent) -> Result<usize, broadcast::error::SendError<JobEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
