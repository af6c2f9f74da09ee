use super::error::StreamError;
use super::supervisor::JobHandle;
use crate::adapters::events::hub::EventHub;
use crate::domain::hls::MediaPlaylist;
use crate::domain::jobs::{JobEvent, JobEventKind};
use crate::domain::stream::{StreamInfo, StreamLayout, StreamRecord, StreamStatus, VideoId};
use crate::ports::repository::StreamRepository;
use crate::ports::resolver::MediaResolver;
use crate::ports::transcoder::Transcoder;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

/// Owns the mapping from a video id to its persisted record, its running
/// transcoder job and its output directory.
pub struct StreamManager<R, V, T> {
    repo: R,
    resolver: V,
    transcoder: T,
    layout: StreamLayout,
    events: Arc<EventHub>,
    jobs: Mutex<HashMap<String, JobHandle>>,
    /// One lock per stream name, held for the whole of `start` and `stop`.
    lifecycle: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<R, V, T> StreamManager<R, V, T>
where
    R: StreamRepository,
    V: MediaResolver,
    T: Transcoder,
{
    pub fn new(
        repo: R,
        resolver: V,
        transcoder: T,
        layout: StreamLayout,
        events: Arc<EventHub>,
    ) -> Self {
        Self {
            repo,
            resolver,
            transcoder,
            layout,
            events,
            jobs: Mutex::new(HashMap::new()),
            lifecycle: Mutex::new(HashMap::new()),
        }
    }

    pub fn layout(&self) -> &StreamLayout {
        &self.layout
    }

    /// Register `video_id` and launch its transcoder.
    ///
    /// A record, once inserted, is kept even if a later step fails. A job
    /// that is still running for the id is kept and nothing is relaunched.
    pub async fn start(&self, video_id: &str) -> Result<StreamInfo, StreamError> {
        let video_id = VideoId::parse(video_id)?;
        let stream_name = video_id.stream_name();

        let guard = self.lock_lifecycle(&stream_name).await;
        let result = self.start_locked(video_id).await;
        self.unlock_lifecycle(&stream_name, guard).await;
        result
    }

    async fn start_locked(&self, video_id: VideoId) -> Result<StreamInfo, StreamError> {
        self.repo.insert(&video_id).await?;

        let paths = self.layout.paths(&video_id);
        tokio::fs::create_dir_all(&paths.output_dir)
            .await
            .map_err(|source| StreamError::Filesystem {
                path: paths.output_dir.clone(),
                source,
            })?;

        if self.is_running(&paths.stream_name).await {
            info!(stream = %paths.stream_name, "transcoder already running");
            return Ok(StreamInfo::new(video_id, paths, false));
        }

        let source_url = self.resolver.resolve(&video_id).await.map_err(|e| {
            error!(video_id = %video_id, error = %e, "failed to resolve stream url");
            e
        })?;

        let launched = match self.transcoder.launch(&source_url, &paths.playlist_path) {
            Ok(process) => {
                let handle =
                    JobHandle::supervise(paths.stream_name.clone(), process, self.events.clone());
                let replaced = self
                    .jobs
                    .lock()
                    .await
                    .insert(paths.stream_name.clone(), handle);
                if let Some(previous) = replaced {
                    previous.terminate();
                }
                info!(stream = %paths.stream_name, "streaming started");
                true
            }
            Err(e) => {
                error!(stream = %paths.stream_name, error = %e, "failed to launch transcoder");
                let _ = self.events.publish(JobEvent::new(
                    &paths.stream_name,
                    JobEventKind::LaunchFailed {
                        error: e.to_string(),
                    },
                ));
                false
            }
        };

        Ok(StreamInfo::new(video_id, paths, launched))
    }

    /// Unregister `video_id`, kill its job and delete its output.
    ///
    /// Stopping an unknown id succeeds.
    pub async fn stop(&self, video_id: &str) -> Result<(), StreamError> {
        let video_id = VideoId::parse(video_id)?;
        let stream_name = video_id.stream_name();

        let guard = self.lock_lifecycle(&stream_name).await;
        let result = self.stop_locked(video_id).await;
        self.unlock_lifecycle(&stream_name, guard).await;
        result
    }

    async fn stop_locked(&self, video_id: VideoId) -> Result<(), StreamError> {
        let removed = self.repo.remove(&video_id).await?;

        let paths = self.layout.paths(&video_id);
        let job = self.jobs.lock().await.remove(&paths.stream_name);
        let had_job = job.is_some();
        if let Some(job) = job {
            job.terminate();
        }

        match tokio::fs::remove_dir_all(&paths.output_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StreamError::Filesystem {
                    path: paths.output_dir,
                    source,
                })
            }
        }

        info!(stream = %paths.stream_name, removed, had_job, "stream removed");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<StreamRecord>, StreamError> {
        Ok(self.repo.list().await?)
    }

    /// Persisted streams with their job state and playlist progress.
    pub async fn overview(&self) -> Result<Vec<StreamStatus>, StreamError> {
        let records = self.list().await?;
        let mut statuses = Vec::with_capacity(records.len());

        for record in records {
            let paths = self.layout.paths(&record.video_id);
            let running = self.is_running(&paths.stream_name).await;
            let segments = match MediaPlaylist::read_from(&paths.playlist_path).await {
                Ok(Some(playlist)) => playlist.segments.len(),
                Ok(None) => 0,
                Err(e) => {
                    warn!(stream = %paths.stream_name, error = %e, "failed to read playlist");
                    0
                }
            };
            statuses.push(StreamStatus {
                video_id: record.video_id,
                stream_name: paths.stream_name,
                playlist_path: paths.playlist_path,
                running,
                segments,
            });
        }

        Ok(statuses)
    }

    /// Relaunch every persisted stream. Returns how many jobs were launched.
    pub async fn resume_persisted(&self) -> usize {
        let records = match self.list().await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to load persisted streams");
                return 0;
            }
        };

        let mut launched = 0;
        for record in records {
            match self.start(record.video_id.as_str()).await {
                Ok(info) if info.launched => launched += 1,
                Ok(_) => {}
                Err(e) => warn!(video_id = %record.video_id, error = %e, "failed to resume stream"),
            }
        }
        info!(launched, "resumed persisted streams");
        launched
    }

    async fn lock_lifecycle(&self, stream_name: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .lifecycle
            .lock()
            .await
            .entry(stream_name.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Release the stream lock and forget it if nobody else is waiting on it.
    async fn unlock_lifecycle(&self, stream_name: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.lifecycle.lock().await;
        if locks
            .get(stream_name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(stream_name);
        }
    }

    async fn is_running(&self, stream_name: &str) -> bool {
        self.jobs
            .lock()
            .await
            .get(stream_name)
            .map(JobHandle::is_running)
            .unwrap_or(false)
    }
}
