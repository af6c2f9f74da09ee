use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum JobEventKind {
    Started { pid: Option<u32> },
    /// The transcoder exited on its own. `stderr` holds the tail of its output.
    Exited {
        code: Option<i32>,
        stderr: Option<String>,
    },
    /// The transcoder was killed after a stop request.
    Terminated,
    Failed { error: String },
    /// The transcoder could not be spawned at all.
    LaunchFailed { error: String },
}

/// Lifecycle notification of a background transcoder job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEvent {
    pub stream_name: String,
    pub kind: JobEventKind,
}

impl JobEvent {
    pub fn new(stream_name: impl Into<String>, kind: JobEventKind) -> Self {
        Self {
            stream_name: stream_name.into(),
            kind,
        }
    }
}
