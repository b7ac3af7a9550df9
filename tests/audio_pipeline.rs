//! Audio pipeline integration tests
//!
//! Every path through the pipeline must leave the artifact directory exactly
//! as it found it.

use std::sync::Arc;
use std::time::Duration;

use polyglot_bot::audio::{AudioFormat, deliver};
use polyglot_bot::{Error, LanguageProfile};

mod common;
use common::{
    CopyTranscoder, FailingTranscoder, FakeSynthesizer, FakeTranscriber, PathSwappingTranscoder,
    RecordingTransport, SPEECH_BYTES, Sent, StalledTranscoder, file_count, pipeline,
};

// -- decode ---------------------------------------------------------------------

#[tokio::test]
async fn decode_returns_transcript_and_leaves_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = FakeTranscriber::new("guten morgen");
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        transcriber.clone(),
        FakeSynthesizer::new(),
    );

    let transcript = pipeline.decode_voice_note(b"OggS-voice").await.unwrap();

    assert_eq!(transcript, "guten morgen");
    assert_eq!(file_count(tmp.path()), 0);

    let seen = transcriber.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, b"OggS-voice");
    assert_eq!(seen[0].1, AudioFormat::Mp3);
}

#[tokio::test]
async fn failed_artifact_removal_keeps_the_transcript() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = FakeTranscriber::new("guten abend");
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(PathSwappingTranscoder),
        transcriber.clone(),
        FakeSynthesizer::new(),
    );

    let transcript = pipeline.decode_voice_note(b"OggS-voice").await.unwrap();

    assert_eq!(transcript, "guten abend");
    assert_eq!(transcriber.seen()[0].0, b"OggS-voice");

    // Only the undeletable native path is left; the converted file is gone
    let left: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(left.len(), 1);
    assert!(left[0].is_dir());
}

#[tokio::test]
async fn transcode_failure_cleans_partial_output() {
    let tmp = tempfile::tempdir().unwrap();
    let transcriber = FakeTranscriber::new("unused");
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(FailingTranscoder),
        transcriber.clone(),
        FakeSynthesizer::new(),
    );

    let err = pipeline.decode_voice_note(b"OggS-voice").await.unwrap_err();

    assert!(matches!(err, Error::Audio(_)));
    assert_eq!(file_count(tmp.path()), 0);
    assert!(transcriber.seen().is_empty());
}

#[tokio::test]
async fn transcription_failure_leaves_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::failing(),
        FakeSynthesizer::new(),
    );

    let err = pipeline.decode_voice_note(b"OggS-voice").await.unwrap_err();

    assert!(matches!(err, Error::Backend { .. }));
    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn persist_failure_is_resource_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("audios");
    let pipeline = pipeline(
        &dir,
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("unused"),
        FakeSynthesizer::new(),
    );

    // Artifact directory disappears underneath the pipeline
    std::fs::remove_dir(&dir).unwrap();

    let err = pipeline.decode_voice_note(b"OggS-voice").await.unwrap_err();
    assert!(matches!(err, Error::Resource(_)));
    assert!(!dir.exists());
}

#[tokio::test]
async fn cancelled_decode_leaves_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(StalledTranscoder),
        FakeTranscriber::new("unused"),
        FakeSynthesizer::new(),
    );

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        pipeline.decode_voice_note(b"OggS-voice"),
    )
    .await;

    assert!(outcome.is_err(), "stalled transcode should time out");
    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn concurrent_decodes_do_not_collide() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("ok"),
        FakeSynthesizer::new(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.decode_voice_note(format!("note-{i}").as_bytes()).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "ok");
    }
    assert_eq!(file_count(tmp.path()), 0);
}

// -- synthesize ---------------------------------------------------------------------

#[tokio::test]
async fn send_speech_uploads_and_removes_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let synthesizer = FakeSynthesizer::new();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("unused"),
        synthesizer.clone(),
    );
    let transport = RecordingTransport::new();
    let german = LanguageProfile::lookup("german").unwrap();

    pipeline
        .send_speech(transport.as_ref(), 7, "Hallo Welt", german, Some("listen"))
        .await
        .unwrap();

    assert_eq!(
        transport.sent().await,
        vec![Sent::Voice {
            recipient: 7,
            audio: SPEECH_BYTES.to_vec(),
            caption: Some("listen".to_string()),
        }]
    );
    assert_eq!(synthesizer.spoken(), vec![("Hallo Welt".to_string(), "de")]);
    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn synthesis_failure_creates_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("unused"),
        FakeSynthesizer::failing(),
    );
    let transport = RecordingTransport::new();

    let err = pipeline
        .send_speech(transport.as_ref(), 7, "hi", LanguageProfile::english(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Backend { .. }));
    assert!(transport.sent().await.is_empty());
    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn send_failure_still_removes_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("unused"),
        FakeSynthesizer::new(),
    );
    let transport = RecordingTransport::new();
    transport.make_unreachable(7);

    let err = pipeline
        .send_speech(transport.as_ref(), 7, "hi", LanguageProfile::english(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(file_count(tmp.path()), 0);
}

#[tokio::test]
async fn synthesized_artifact_lives_until_delivered() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        tmp.path(),
        Arc::new(CopyTranscoder),
        FakeTranscriber::new("unused"),
        FakeSynthesizer::new(),
    );
    let transport = RecordingTransport::new();

    let artifact = pipeline
        .synthesize_speech("hi", LanguageProfile::english())
        .await
        .unwrap();
    assert_eq!(artifact.format(), AudioFormat::Mp3);
    assert_eq!(file_count(tmp.path()), 1);

    deliver(transport.as_ref(), 3, artifact, None).await.unwrap();
    assert_eq!(file_count(tmp.path()), 0);
    assert_eq!(transport.voices_to(3).await, 1);
}
