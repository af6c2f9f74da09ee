use crate::adapters::events::hub::EventHub;
use crate::domain::jobs::{JobEvent, JobEventKind};
use crate::ports::transcoder::TranscodeProcess;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a transcoder process owned by a background supervisor task.
///
/// The supervisor waits for the process to exit or for `terminate`, and
/// publishes every transition on the event hub. Dropping the handle without
/// calling `terminate` leaves the process running.
#[derive(Debug)]
pub struct JobHandle {
    pid: Option<u32>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn supervise(
        stream_name: String,
        mut process: Box<dyn TranscodeProcess>,
        events: Arc<EventHub>,
    ) -> Self {
        let (cancel, cancel_rx) = oneshot::channel::<()>();
        let pid = process.id();

        let task = tokio::spawn(async move {
            let _ = events.publish(JobEvent::new(&stream_name, JobEventKind::Started { pid }));

            let kind = tokio::select! {
                status = process.wait() => match status {
                    Ok(exit) => JobEventKind::Exited {
                        code: exit.code,
                        stderr: exit.stderr,
                    },
                    Err(e) => JobEventKind::Failed { error: e.to_string() },
                },
                Ok(()) = cancel_rx => match process.kill().await {
                    Ok(()) => JobEventKind::Terminated,
                    Err(e) => JobEventKind::Failed { error: e.to_string() },
                },
            };

            let _ = events.publish(JobEvent::new(&stream_name, kind));
        });

        Self {
            pid,
            cancel: Some(cancel),
            task,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the supervised process has not exited yet.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Ask the supervisor to kill the process. Does not wait for it.
    pub fn terminate(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}
