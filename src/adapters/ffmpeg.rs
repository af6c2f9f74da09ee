//! ffmpeg Transcoder implementation.

use crate::domain::hls::HlsWindow;
use crate::ports::transcoder::{ProcessExit, TranscodeProcess, Transcoder};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::task::JoinHandle;

/// Lines of ffmpeg stderr kept for the exit event.
const STDERR_TAIL_LINES: usize = 20;

/// Copies the source streams into a rolling HLS playlist without re-encoding.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    window: HlsWindow,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, window: HlsWindow) -> Self {
        Self {
            binary: binary.into(),
            window,
        }
    }

    fn command(&self, source_url: &str, playlist_path: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-nostdin")
            .arg("-loglevel")
            .arg("error")
            .arg("-re")
            .arg("-i")
            .arg(source_url)
            .arg("-c:v")
            .arg("copy")
            .arg("-c:a")
            .arg("copy")
            .args(self.window.ffmpeg_args())
            .arg(playlist_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }
}

impl Transcoder for FfmpegTranscoder {
    fn launch(
        &self,
        source_url: &str,
        playlist_path: &Path,
    ) -> io::Result<Box<dyn TranscodeProcess>> {
        let process = FfmpegProcess::spawn(self.command(source_url, playlist_path))?;
        Ok(Box::new(process))
    }
}

/// A spawned child whose stderr is drained in the background.
pub struct FfmpegProcess {
    child: Child,
    stderr: Option<JoinHandle<Vec<String>>>,
}

impl FfmpegProcess {
    /// Spawn `command` with stderr piped. Must be called inside a tokio runtime.
    pub fn spawn(mut command: Command) -> io::Result<Self> {
        let mut child = command.stderr(Stdio::piped()).spawn()?;
        let stderr = child.stderr.take().map(|pipe| tokio::spawn(stderr_tail(pipe)));
        Ok(Self { child, stderr })
    }
}

async fn stderr_tail(pipe: ChildStderr) -> Vec<String> {
    let mut lines = BufReader::new(pipe).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into()
}

#[async_trait]
impl TranscodeProcess for FfmpegProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<ProcessExit> {
        let code = self.child.wait().await?.code();
        let lines = match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = (!lines.is_empty()).then(|| lines.join("\n"));
        Ok(ProcessExit { code, stderr })
    }

    async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }
}
