//! Container transcoding on a bounded pool of `ffmpeg` workers

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::artifact::{AudioArtifact, AudioFormat};
use crate::{Error, Result};

/// Converts one audio artifact into another container
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Read `input` and write `output` in `output.format()`
    async fn transcode(&self, input: &AudioArtifact, output: &AudioArtifact) -> Result<()>;
}

/// Transcoder that shells out to `ffmpeg`
///
/// At most `workers` conversions run at once; additional callers wait for
/// a permit. The child process is killed if the calling future is dropped.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    permits: Arc<Semaphore>,
}

impl FfmpegTranscoder {
    /// Create a transcoder for a known `ffmpeg` binary
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            binary: binary.into(),
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Resolve `program` on `PATH` (or as a path) and create a transcoder
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the binary cannot be found
    pub fn locate(program: &str, workers: usize) -> Result<Self> {
        let binary = which::which(program)
            .map_err(|e| Error::Config(format!("ffmpeg not found ({program}): {e}")))?;
        tracing::debug!(path = %binary.display(), workers, "ffmpeg located");
        Ok(Self::new(binary, workers))
    }

    fn codec_args(format: AudioFormat) -> &'static [&'static str] {
        match format {
            AudioFormat::Mp3 => &["-vn", "-codec:a", "libmp3lame", "-q:a", "4", "-f", "mp3"],
            AudioFormat::OggOpus => &["-vn", "-codec:a", "libopus", "-b:a", "32k", "-f", "ogg"],
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &AudioArtifact, output: &AudioArtifact) -> Result<()> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Audio(format!("transcode pool closed: {e}")))?;

        let started = std::time::Instant::now();
        let result = tokio::process::Command::new(&self.binary)
            .args(["-nostdin", "-y", "-loglevel", "error", "-i"])
            .arg(input.path())
            .args(Self::codec_args(output.format()))
            .arg(output.path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Audio(format!("failed to run ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Audio(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        tracing::debug!(
            from = input.format().extension(),
            to = output.format().extension(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "transcode complete"
        );
        Ok(())
    }
}
