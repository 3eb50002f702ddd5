//! Hand-written service fakes for stage tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use montage_media::{MediaError, MediaResult, VideoSplitter};
use montage_ml_client::{
    DetectedShot, MatchRequest, MatchResponse, MatchingService, MlError, MlResult,
    ShotDetectionResponse, ShotDetector,
};
use montage_storage::{ClipPublisher, StorageError, StorageResult};

pub struct FakeDetector {
    response: Option<ShotDetectionResponse>,
    calls: AtomicUsize,
}

impl FakeDetector {
    pub fn succeeding(clips: Vec<DetectedShot>) -> Self {
        Self {
            response: Some(ShotDetectionResponse {
                success: true,
                version: "test".to_string(),
                clips,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unsuccessful() -> Self {
        Self {
            response: Some(ShotDetectionResponse::default()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShotDetector for FakeDetector {
    async fn detect(&self, _resource_id: &str) -> MlResult<ShotDetectionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| MlError::ServiceUnavailable("detect".to_string()))
    }
}

pub struct FakeSplitter {
    pieces: Option<usize>,
    out_dir: PathBuf,
    write_files: bool,
    calls: AtomicUsize,
}

impl FakeSplitter {
    pub fn with_pieces(pieces: usize) -> Self {
        Self {
            pieces: Some(pieces),
            out_dir: PathBuf::from("/work"),
            write_files: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Writes real piece files into `dir`.
    pub fn writing_into(dir: &Path, pieces: usize) -> Self {
        Self {
            pieces: Some(pieces),
            out_dir: dir.to_path_buf(),
            write_files: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            pieces: None,
            out_dir: PathBuf::from("/work"),
            write_files: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSplitter for FakeSplitter {
    async fn split(
        &self,
        local_path: &Path,
        _interval_secs: f64,
        _start_secs: f64,
        _end_secs: f64,
    ) -> MediaResult<Vec<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self
            .pieces
            .ok_or_else(|| MediaError::EmptySplit(local_path.to_path_buf()))?;
        let files: Vec<PathBuf> = (0..count)
            .map(|i| self.out_dir.join(format!("piece_{:03}.mp4", i)))
            .collect();
        if self.write_files {
            for file in &files {
                tokio::fs::write(file, b"piece").await?;
            }
        }
        Ok(files)
    }
}

pub struct FakePublisher {
    fail: bool,
    calls: AtomicUsize,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipPublisher for FakePublisher {
    async fn publish(&self, path: &Path) -> StorageResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StorageError::upload_failed(path.display().to_string()));
        }
        Ok(format!("published/{}", n))
    }
}

/// Matching service answering every request with the same response.
pub struct FakeMatching {
    response: Option<MatchResponse>,
    requests: Mutex<Vec<MatchRequest>>,
}

impl FakeMatching {
    pub fn answering(response: MatchResponse) -> Self {
        Self {
            response: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<MatchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MatchingService for FakeMatching {
    async fn match_script(&self, request: &MatchRequest) -> MlResult<MatchResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .clone()
            .ok_or_else(|| MlError::ServiceUnavailable("match".to_string()))
    }
}

/// Collects formatted log output on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Capture until the returned guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
