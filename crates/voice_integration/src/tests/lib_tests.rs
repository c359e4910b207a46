use super::*;

#[test]
fn blob_concatenates_chunks_in_order() {
    let blob = AudioBlob::from_chunks(vec![b"RIFF".to_vec(), Vec::new(), b"WAVE".to_vec()]);
    assert_eq!(blob.bytes, b"RIFFWAVE".to_vec());
    assert_eq!(blob.file_name, "input.wav");
    assert_eq!(blob.mime_type, "audio/wav");
    assert_eq!(blob.len(), 8);
}

#[test]
fn clip_data_uri_uses_mp3_mime() {
    let clip = AudioClip::from_base64_mp3("SUQz").expect("decode");
    assert_eq!(clip.bytes, b"ID3".to_vec());
    assert_eq!(clip.data_uri(), "data:audio/mp3;base64,SUQz");
    assert_eq!(clip.file_extension(), "mp3");
}

#[test]
fn clip_rejects_invalid_base64() {
    assert!(AudioClip::from_base64_mp3("not base64!").is_err());
}

#[tokio::test]
async fn missing_devices_fail() {
    assert!(MissingMicrophone.open().await.is_err());
    let err = MissingAudioOutput
        .play(AudioClip::mp3(vec![1, 2, 3]))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("3 bytes"));
}

#[tokio::test]
async fn file_microphone_replays_file_in_chunks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("take.wav");
    std::fs::write(&path, b"0123456789").expect("write");

    let capture = FileMicrophone::new(&path)
        .with_chunk_bytes(4)
        .open()
        .await
        .expect("open");
    let chunks = capture.finish().await.expect("finish");
    assert_eq!(
        chunks,
        vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]
    );
    assert_eq!(AudioBlob::from_chunks(chunks).bytes, b"0123456789".to_vec());
}

#[tokio::test]
async fn file_microphone_fails_for_missing_or_empty_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = FileMicrophone::new(dir.path().join("nope.wav"));
    assert!(missing.open().await.is_err());

    let empty_path = dir.path().join("empty.wav");
    std::fs::write(&empty_path, b"").expect("write");
    assert!(FileMicrophone::new(&empty_path).open().await.is_err());
}

#[tokio::test]
async fn directory_output_numbers_clips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("speech");
    let output = DirectoryAudioOutput::new(&out_dir);

    output.play(AudioClip::mp3(b"one".to_vec())).await.expect("play");
    output.play(AudioClip::mp3(b"two".to_vec())).await.expect("play");

    assert_eq!(
        std::fs::read(out_dir.join("answer-1.mp3")).expect("first"),
        b"one".to_vec()
    );
    assert_eq!(
        std::fs::read(out_dir.join("answer-2.mp3")).expect("second"),
        b"two".to_vec()
    );
}
