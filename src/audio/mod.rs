//! Audio processing
//!
//! Transient artifact files, `ffmpeg` transcoding and the voice pipeline
//! built on top of them.

mod artifact;
mod pipeline;
mod transcode;

pub use artifact::{ArtifactManager, AudioArtifact, AudioFormat};
pub use pipeline::{AudioPipeline, deliver};
pub use transcode::{FfmpegTranscoder, Transcoder};
