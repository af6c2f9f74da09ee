//! Fakes shared by the application and adapter tests.

use crate::domain::jobs::JobEvent;
use crate::ports::transcoder::{ProcessExit, TranscodeProcess, Transcoder};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

pub async fn next_event(rx: &mut broadcast::Receiver<JobEvent>) -> JobEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for job event")
        .expect("event hub closed")
}

/// Lets a test end a `FakeProcess` or check whether it was killed.
#[derive(Clone)]
pub struct ProcessControl {
    exit: Arc<Mutex<Option<oneshot::Sender<Option<i32>>>>>,
    killed: Arc<AtomicBool>,
}

impl ProcessControl {
    pub fn exit(&self, code: Option<i32>) {
        if let Some(tx) = self.exit.lock().unwrap().take() {
            let _ = tx.send(code);
        }
    }

    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

/// Process that runs until told to exit or killed.
pub struct FakeProcess {
    pid: Option<u32>,
    exit_rx: oneshot::Receiver<Option<i32>>,
    killed: Arc<AtomicBool>,
}

impl FakeProcess {
    pub fn new(pid: Option<u32>) -> (Self, ProcessControl) {
        let (tx, exit_rx) = oneshot::channel();
        let killed = Arc::new(AtomicBool::new(false));
        let control = ProcessControl {
            exit: Arc::new(Mutex::new(Some(tx))),
            killed: killed.clone(),
        };
        (
            Self {
                pid,
                exit_rx,
                killed,
            },
            control,
        )
    }
}

#[async_trait]
impl TranscodeProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        self.pid
    }

    async fn wait(&mut self) -> io::Result<ProcessExit> {
        match (&mut self.exit_rx).await {
            Ok(code) => Ok(ProcessExit { code, stderr: None }),
            Err(_) => std::future::pending().await,
        }
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Launch {
    pub source_url: String,
    pub playlist_path: PathBuf,
}

/// Transcoder that records its launches and hands out `FakeProcess`es.
#[derive(Clone, Default)]
pub struct FakeTranscoder {
    launches: Arc<Mutex<Vec<(Launch, ProcessControl)>>>,
    fail: Arc<AtomicBool>,
}

impl FakeTranscoder {
    pub fn failing() -> Self {
        let transcoder = Self::default();
        transcoder.fail.store(true, Ordering::SeqCst);
        transcoder
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launches
            .lock()
            .unwrap()
            .iter()
            .map(|(launch, _)| launch.clone())
            .collect()
    }

    pub fn control(&self, index: usize) -> ProcessControl {
        self.launches.lock().unwrap()[index].1.clone()
    }
}

impl Transcoder for FakeTranscoder {
    fn launch(
        &self,
        source_url: &str,
        playlist_path: &Path,
    ) -> io::Result<Box<dyn TranscodeProcess>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "ffmpeg not found"));
        }
        let mut launches = self.launches.lock().unwrap();
        let (process, control) = FakeProcess::new(Some(1000 + launches.len() as u32));
        launches.push((
            Launch {
                source_url: source_url.to_string(),
                playlist_path: playlist_path.to_path_buf(),
            },
            control,
        ));
        Ok(Box::new(process))
    }
}
