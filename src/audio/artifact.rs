//! Transient audio files with guaranteed cleanup
//!
//! Every file the bot writes for audio processing is an [`AudioArtifact`].
//! The artifact removes its file when released or dropped, so a stage that
//! fails, returns early or gets cancelled still cleans up after itself.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Container format of an audio artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Ogg/Opus, the messaging platform's native voice note container
    OggOpus,
    /// MP3, accepted by transcription and produced by synthesis
    Mp3,
}

impl AudioFormat {
    /// File extension without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::OggOpus => "ogg",
            Self::Mp3 => "mp3",
        }
    }

    /// MIME type for uploads
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::OggOpus => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
        }
    }
}

/// Creates audio artifacts inside a single scratch directory
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    dir: PathBuf,
}

impl ArtifactManager {
    /// Create a manager rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Resource(format!("cannot create artifact dir {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    /// Scratch directory holding live artifacts
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a uniquely named path for a file another stage will write
    ///
    /// Nothing is created on disk yet; dropping the artifact still removes
    /// whatever ends up at the path.
    #[must_use]
    pub fn reserve(&self, format: AudioFormat) -> AudioArtifact {
        let name = format!("{}.{}", uuid::Uuid::new_v4(), format.extension());
        AudioArtifact {
            path: self.dir.join(name),
            format,
            released: false,
        }
    }

    /// Write `bytes` to a new artifact
    ///
    /// # Errors
    ///
    /// Returns `Error::Resource` if the file cannot be written; any partial
    /// file is removed before returning
    pub async fn persist(&self, bytes: &[u8], format: AudioFormat) -> Result<AudioArtifact> {
        let artifact = self.reserve(format);
        tokio::fs::write(&artifact.path, bytes).await.map_err(|e| {
            Error::Resource(format!("cannot write {}: {e}", artifact.path.display()))
        })?;

        tracing::debug!(path = %artifact.path.display(), bytes = bytes.len(), "audio artifact created");
        Ok(artifact)
    }
}

/// Exclusive handle to one transient audio file
///
/// The file is deleted exactly once: by [`AudioArtifact::release`] or, if the
/// handle goes out of scope first, by `Drop`. Deletion problems are logged and
/// never surface as errors.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    format: AudioFormat,
    released: bool,
}

impl AudioArtifact {
    /// Location on disk
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container format
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Read the artifact's contents
    ///
    /// # Errors
    ///
    /// Returns `Error::Resource` if the file is missing or unreadable
    pub async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Resource(format!("cannot read {}: {e}", self.path.display())))
    }

    /// Delete the file now
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "audio artifact removed"),
            // Reserved but never written
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove audio artifact"
            ),
        }
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(Iterator::count).unwrap_or(0)
    }

    #[tokio::test]
    async fn persist_then_release_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(tmp.path()).unwrap();

        let artifact = manager.persist(b"voice", AudioFormat::OggOpus).await.unwrap();
        assert!(artifact.path().exists());
        assert_eq!(artifact.path().extension().unwrap(), "ogg");
        assert_eq!(artifact.read().await.unwrap(), b"voice");
        assert_eq!(file_count(tmp.path()), 1);

        artifact.release();
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn drop_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(tmp.path()).unwrap();

        {
            let _artifact = manager.persist(b"abc", AudioFormat::Mp3).await.unwrap();
            assert_eq!(file_count(tmp.path()), 1);
        }

        assert_eq!(file_count(tmp.path()), 0);
    }

    #[test]
    fn reserved_artifact_never_written_drops_quietly() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(tmp.path()).unwrap();

        let artifact = manager.reserve(AudioFormat::Mp3);
        assert!(!artifact.path().exists());
        drop(artifact);
        assert_eq!(file_count(tmp.path()), 0);
    }

    #[test]
    fn reserved_names_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(tmp.path()).unwrap();

        let a = manager.reserve(AudioFormat::Mp3);
        let b = manager.reserve(AudioFormat::Mp3);
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn read_missing_file_is_resource_error() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ArtifactManager::new(tmp.path()).unwrap();

        let artifact = manager.reserve(AudioFormat::OggOpus);
        assert!(matches!(artifact.read().await, Err(Error::Resource(_))));
    }

    #[test]
    fn creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("audios");
        let manager = ArtifactManager::new(&nested).unwrap();
        assert!(manager.dir().is_dir());
    }
}
