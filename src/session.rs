//! Processing session
//!
//! One session per user. It allows a single in-flight run, runs the audio
//! pipeline and the lyrics request side by side, and owns the one live
//! artifact handle wrapping the latest instrumental.
//!
//! Handles are released deterministically: when a new run starts, when
//! [`Session::release`] is called, or when the session is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{EncodedContainer, SeparationReport, SourceAudio};
use crate::error::{KaraokeError, Result};
use crate::input::{download_file_name, song_title, SourceInput};
use crate::lyrics::{Lyrics, LyricsRequest, LyricsService};
use crate::pipeline::Pipeline;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Artifacts
// ============================================================================

/// Live instrumental containers, keyed by handle ID
#[derive(Debug, Default)]
pub struct ArtifactRegistry {
    entries: Mutex<HashMap<Uuid, Arc<EncodedContainer>>>,
}

impl ArtifactRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a container and return the handle that owns its entry
    pub fn register(
        self: &Arc<Self>,
        container: EncodedContainer,
        file_name: impl Into<String>,
    ) -> ArtifactHandle {
        let id = Uuid::new_v4();
        let container = Arc::new(container);
        lock(&self.entries).insert(id, Arc::clone(&container));
        debug!(%id, "artifact registered");

        ArtifactHandle {
            id,
            file_name: file_name.into(),
            created_at: Utc::now(),
            container,
            registry: Arc::clone(self),
        }
    }

    /// Look up a live container
    pub fn get(&self, id: &Uuid) -> Option<Arc<EncodedContainer>> {
        lock(&self.entries).get(id).cloned()
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        lock(&self.entries).len()
    }
}

/// Owner of one registered container. Dropping it releases the entry.
#[derive(Debug)]
pub struct ArtifactHandle {
    id: Uuid,
    file_name: String,
    created_at: DateTime<Utc>,
    container: Arc<EncodedContainer>,
    registry: Arc<ArtifactRegistry>,
}

impl ArtifactHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Suggested download name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn container(&self) -> &EncodedContainer {
        &self.container
    }

    /// Write the container into `dir` under its download name
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.container.as_bytes())?;
        Ok(path)
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        lock(&self.registry.entries).remove(&self.id);
        debug!(id = %self.id, "artifact released");
    }
}

/// Serializable summary of a completed instrumental
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub bytes: usize,
    pub duration_secs: f64,
    pub checksum: String,
    pub report: SeparationReport,
}

// ============================================================================
// Session
// ============================================================================

/// Coarse state for the caller's UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingState {
    Idle,
    Processing,
    Ready,
    Error,
}

/// Held for the duration of one run; dropping it ends the run
pub struct RunGuard<'a> {
    session: &'a Session,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.session.processing.store(false, Ordering::Release);
    }
}

/// Result of one run. Audio and lyrics succeed or fail independently.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub title: String,
    /// Set for YouTube input
    pub video_id: Option<String>,
    /// `None` when there was no audio to process (YouTube input)
    pub instrumental: Option<Result<ArtifactInfo>>,
    /// `None` when lyrics are disabled
    pub lyrics: Option<Result<Lyrics>>,
}

struct CurrentArtifact {
    handle: ArtifactHandle,
    info: ArtifactInfo,
}

/// A user's processing session
pub struct Session {
    pipeline: Pipeline,
    lyrics: Option<Box<dyn LyricsService>>,
    registry: Arc<ArtifactRegistry>,
    processing: AtomicBool,
    state: Mutex<ProcessingState>,
    current: Mutex<Option<CurrentArtifact>>,
}

impl Session {
    pub fn new(pipeline: Pipeline, lyrics: Option<Box<dyn LyricsService>>) -> Self {
        Self {
            pipeline,
            lyrics,
            registry: ArtifactRegistry::new(),
            processing: AtomicBool::new(false),
            state: Mutex::new(ProcessingState::Idle),
            current: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    pub fn state(&self) -> ProcessingState {
        *lock(&self.state)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Claim the session for one run
    ///
    /// # Errors
    /// * `RunInProgress` - another run has not finished
    pub fn begin_run(&self) -> Result<RunGuard<'_>> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| KaraokeError::RunInProgress)?;
        Ok(RunGuard { session: self })
    }

    /// Release the current artifact handle, if any
    pub fn release(&self) {
        if let Some(current) = lock(&self.current).take() {
            info!(id = %current.handle.id(), "releasing previous instrumental");
        }
    }

    /// Summary of the live instrumental, if any
    pub fn current_artifact(&self) -> Option<ArtifactInfo> {
        lock(&self.current).as_ref().map(|current| current.info.clone())
    }

    /// The live instrumental's container, if any
    pub fn current_container(&self) -> Option<Arc<EncodedContainer>> {
        let id = lock(&self.current).as_ref().map(|current| current.handle.id())?;
        self.registry.get(&id)
    }

    /// Write the live instrumental into `dir`
    pub fn save_current(&self, dir: &Path) -> Result<Option<PathBuf>> {
        lock(&self.current)
            .as_ref()
            .map(|current| current.handle.save_to(dir))
            .transpose()
    }

    /// Process one submission.
    ///
    /// Uploads go through the audio pipeline while the lyrics request runs on
    /// a second thread; YouTube input only requests lyrics. Only
    /// `RunInProgress` is returned as an error; stage failures are reported
    /// inside the outcome.
    pub fn process(&self, input: &SourceInput, title: Option<&str>) -> Result<ProcessOutcome> {
        let _guard = self.begin_run()?;
        self.start_run();

        let title = song_title(title, input);
        let request = lyrics_request(&title, input);
        info!(title = %title, upload = input.audio().is_some(), "processing started");

        let (audio, lyrics) = std::thread::scope(|scope| {
            let lyrics_job = self
                .lyrics
                .as_deref()
                .map(|service| scope.spawn(move || service.transcribe(&request)));

            let audio = input
                .audio()
                .map(|source| self.pipeline.instrumental(source));

            let lyrics = lyrics_job.map(|job| {
                job.join().unwrap_or_else(|_| {
                    Err(KaraokeError::Transcription {
                        reason: "lyrics worker panicked".to_string(),
                    })
                })
            });

            (audio, lyrics)
        });

        Ok(self.finish_run(title, input, audio, lyrics))
    }

    /// Async variant of [`Session::process`]: both flows run on tokio's
    /// blocking pool and are joined.
    #[cfg(feature = "async-bridge")]
    pub async fn process_async(
        self: Arc<Self>,
        input: SourceInput,
        title: Option<String>,
    ) -> Result<ProcessOutcome> {
        let _guard = self.begin_run()?;
        self.start_run();

        let title = song_title(title.as_deref(), &input);
        let request = lyrics_request(&title, &input);

        let audio_job = input.audio().cloned().map(|source| {
            let session = Arc::clone(&self);
            tokio::task::spawn_blocking(move || session.pipeline.instrumental(&source))
        });
        let lyrics_job = self.lyrics.is_some().then(|| {
            let session = Arc::clone(&self);
            tokio::task::spawn_blocking(move || match session.lyrics.as_deref() {
                Some(service) => service.transcribe(&request),
                None => Err(KaraokeError::TranscriptionUnavailable {
                    reason: "lyrics disabled".to_string(),
                }),
            })
        });

        let audio = match audio_job {
            Some(job) => Some(job.await.unwrap_or_else(|e| {
                Err(KaraokeError::Decode {
                    reason: format!("audio worker failed: {}", e),
                    source: None,
                })
            })),
            None => None,
        };
        let lyrics = match lyrics_job {
            Some(job) => Some(job.await.unwrap_or_else(|e| {
                Err(KaraokeError::Transcription {
                    reason: format!("lyrics worker failed: {}", e),
                })
            })),
            None => None,
        };

        Ok(self.finish_run(title, &input, audio, lyrics))
    }

    fn start_run(&self) {
        self.release();
        *lock(&self.state) = ProcessingState::Processing;
    }

    fn finish_run(
        &self,
        title: String,
        input: &SourceInput,
        audio: Option<Result<(EncodedContainer, SeparationReport)>>,
        lyrics: Option<Result<Lyrics>>,
    ) -> ProcessOutcome {
        let instrumental = audio.map(|result| {
            result.map(|(container, report)| {
                let handle = self.registry.register(container, download_file_name(&title));
                let info = ArtifactInfo {
                    id: handle.id(),
                    file_name: handle.file_name().to_string(),
                    created_at: handle.created_at(),
                    bytes: handle.container().len(),
                    duration_secs: handle.container().duration_secs(),
                    checksum: handle.container().checksum(),
                    report,
                };
                *lock(&self.current) = Some(CurrentArtifact {
                    handle,
                    info: info.clone(),
                });
                info
            })
        });

        if let Some(Err(e)) = &instrumental {
            warn!(error_code = e.error_code(), "audio processing failed: {}", e);
        }
        if let Some(Err(e)) = &lyrics {
            warn!(error_code = e.error_code(), "lyrics request failed: {}", e);
        }

        let failed = matches!(instrumental, Some(Err(_)));
        *lock(&self.state) = if failed {
            ProcessingState::Error
        } else {
            ProcessingState::Ready
        };

        let video_id = match input {
            SourceInput::YouTube { video_id } => Some(video_id.clone()),
            SourceInput::Upload(_) => None,
        };

        ProcessOutcome {
            title,
            video_id,
            instrumental,
            lyrics,
        }
    }
}

fn lyrics_request(title: &str, input: &SourceInput) -> LyricsRequest {
    let request = LyricsRequest::new(title);
    match input.audio() {
        Some(source) => request.with_audio(SourceAudio::transcription_audio(source)),
        None => request,
    }
}
