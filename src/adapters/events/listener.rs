use super::hub::EventHub;
use crate::domain::jobs::JobEventKind;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Log every job event published on `event_hub`.
pub fn start(event_hub: Arc<EventHub>) -> JoinHandle<()> {
    let mut rx = event_hub.subscribe();

    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "job event listener lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let stream = event.stream_name;
            match event.kind {
                JobEventKind::Started { pid } => info!(%stream, ?pid, "transcoder started"),
                JobEventKind::Exited { code: Some(0), .. } => {
                    info!(%stream, "transcoder finished")
                }
                JobEventKind::Exited { code, stderr } => warn!(
                    %stream,
                    ?code,
                    stderr = stderr.as_deref().unwrap_or(""),
                    "transcoder exited"
                ),
                JobEventKind::Terminated => info!(%stream, "transcoder terminated"),
                JobEventKind::Failed { error } => error!(%stream, %error, "transcoder error"),
                JobEventKind::LaunchFailed { error } => {
                    error!(%stream, %error, "transcoder could not be launched")
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::JobEvent;

    #[tokio::test]
    async fn test_listener_stops_when_hub_is_dropped() {
        let hub = Arc::new(EventHub::new());
        let task = start(hub.clone());

        hub.publish(JobEvent::new("stream_abc", JobEventKind::Started { pid: Some(1) }))
            .unwrap();
        drop(hub);

        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("listener should stop")
            .unwrap();
    }
}
