//! Splitting long shot clips into fixed-length pieces.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Cuts a window of a local video into consecutive pieces.
#[async_trait]
pub trait VideoSplitter: Send + Sync {
    /// Split `[start_secs, end_secs)` of `local_path` into pieces of
    /// `interval_secs` (the last one may be shorter).
    ///
    /// Returns the piece files in playback order.
    async fn split(
        &self,
        local_path: &Path,
        interval_secs: f64,
        start_secs: f64,
        end_secs: f64,
    ) -> MediaResult<Vec<PathBuf>>;
}

/// FFmpeg segment-muxer splitter writing pieces into a work directory.
#[derive(Debug, Clone)]
pub struct FfmpegSplitter {
    work_dir: PathBuf,
    runner: FfmpegRunner,
}

impl FfmpegSplitter {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            runner: FfmpegRunner::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl VideoSplitter for FfmpegSplitter {
    async fn split(
        &self,
        local_path: &Path,
        interval_secs: f64,
        start_secs: f64,
        end_secs: f64,
    ) -> MediaResult<Vec<PathBuf>> {
        if !local_path.exists() {
            return Err(MediaError::FileNotFound(local_path.to_path_buf()));
        }
        validate_window(interval_secs, start_secs, end_secs)?;

        tokio::fs::create_dir_all(&self.work_dir).await?;

        let prefix = piece_prefix(local_path, start_secs, end_secs);
        let ext = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let pattern = self.work_dir.join(format!("{}%03d.{}", prefix, ext));

        let cmd = FfmpegCommand::new(local_path, &pattern)
            .seek(start_secs)
            .duration(end_secs - start_secs)
            .stream_copy()
            .segment(interval_secs);

        debug!(
            source = %local_path.display(),
            start_secs,
            end_secs,
            interval_secs,
            "Splitting clip"
        );
        self.runner.run(&cmd).await?;

        let pieces = collect_pieces(&self.work_dir, &prefix).await?;
        if pieces.is_empty() {
            return Err(MediaError::EmptySplit(local_path.to_path_buf()));
        }

        info!(
            source = %local_path.display(),
            pieces = pieces.len(),
            "Split clip into pieces"
        );
        Ok(pieces)
    }
}

fn validate_window(interval_secs: f64, start_secs: f64, end_secs: f64) -> MediaResult<()> {
    if !(interval_secs > 0.0) {
        return Err(MediaError::invalid_window(format!(
            "interval must be positive, got {}",
            interval_secs
        )));
    }
    if start_secs < 0.0 || end_secs <= start_secs {
        return Err(MediaError::invalid_window(format!(
            "{:.3}s..{:.3}s",
            start_secs, end_secs
        )));
    }
    Ok(())
}

/// File-name prefix shared by all pieces of one split.
fn piece_prefix(local_path: &Path, start_secs: f64, end_secs: f64) -> String {
    let stem = local_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("clip");
    format!(
        "{}_{}_{}_",
        stem,
        (start_secs * 1000.0).round() as i64,
        (end_secs * 1000.0).round() as i64
    )
}

/// Piece files under `dir` starting with `prefix`, sorted by name.
///
/// The segment muxer zero-pads its counter, so name order is playback order.
async fn collect_pieces(dir: &Path, prefix: &str) -> MediaResult<Vec<PathBuf>> {
    let mut pieces = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let matches = name.to_str().is_some_and(|n| n.starts_with(prefix));
        if matches && entry.file_type().await?.is_file() {
            pieces.push(entry.path());
        }
    }
    pieces.sort();
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_window() {
        assert!(validate_window(10.0, 0.0, 25.0).is_ok());
        assert!(validate_window(0.0, 0.0, 25.0).is_err());
        assert!(validate_window(10.0, 5.0, 5.0).is_err());
        assert!(validate_window(10.0, -1.0, 5.0).is_err());
    }

    #[test]
    fn test_piece_prefix() {
        let prefix = piece_prefix(Path::new("/data/clips/v1_0003.mp4"), 1.2, 26.0);
        assert_eq!(prefix, "v1_0003_1200_26000_");
    }

    #[tokio::test]
    async fn test_collect_pieces_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a_0_1_002.mp4", "a_0_1_000.mp4", "other_000.mp4", "a_0_1_001.mp4"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let pieces = collect_pieces(dir.path(), "a_0_1_").await.unwrap();
        let names: Vec<_> = pieces
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_0_1_000.mp4", "a_0_1_001.mp4", "a_0_1_002.mp4"]);
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = FfmpegSplitter::new(dir.path());
        let err = splitter
            .split(&dir.path().join("missing.mp4"), 10.0, 0.0, 20.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
