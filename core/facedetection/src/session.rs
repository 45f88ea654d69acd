use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::error::FaceDetectionError;
use crate::pipeline::{CancelToken, DetectionOutcome, FacePipeline};

/// Runs pipelines off the caller's thread, one destination at a time.
///
/// Submitting a new image supersedes the run in flight: its token is
/// cancelled and it resolves to [`FaceDetectionError::Cancelled`] at its next
/// stage boundary, so a stale result never reaches the caller's view.
pub struct DetectionSession {
    pipeline: Arc<FacePipeline>,
    current: Mutex<Option<CancelToken>>,
}

impl DetectionSession {
    /// Share `pipeline` across the runs of this session.
    pub fn new(pipeline: Arc<FacePipeline>) -> Self {
        Self {
            pipeline,
            current: Mutex::new(None),
        }
    }

    /// Start a run on a worker thread, cancelling the previous one.
    pub fn submit(&self, path: impl Into<PathBuf>) -> Result<RunHandle, FaceDetectionError> {
        let path = path.into();
        let token = CancelToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            if !previous.is_cancelled() {
                log::debug!("superseding in-flight run for {}", path.display());
            }
            previous.cancel();
        }

        let pipeline = Arc::clone(&self.pipeline);
        let worker_token = token.clone();
        let handle = thread::Builder::new()
            .name("facedetection-run".into())
            .spawn(move || pipeline.run_with_cancel(&path, &worker_token))?;

        Ok(RunHandle { token, handle })
    }

    /// Cancel whatever run is in flight, if any.
    pub fn cancel_current(&self) {
        if let Some(token) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}

/// Handle to a submitted run.
pub struct RunHandle {
    token: CancelToken,
    handle: JoinHandle<Result<DetectionOutcome, FaceDetectionError>>,
}

impl RunHandle {
    /// Cancel this run only.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the worker has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run finishes. A panic in the worker is resumed here.
    ///
    /// A run cancelled after its last stage boundary still resolves to
    /// [`FaceDetectionError::Cancelled`].
    pub fn wait(self) -> Result<DetectionOutcome, FaceDetectionError> {
        let result = match self.handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        match result {
            Ok(_) if self.token.is_cancelled() => Err(FaceDetectionError::Cancelled),
            other => other,
        }
    }
}
