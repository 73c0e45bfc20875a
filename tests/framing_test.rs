//! Framing tests - length-prefixed delimiting over split reads

use net_tetris::net::{encode_frame, ClientConfig, FrameError, FrameReader, DEFAULT_MAX_FRAME};
use tokio_test::io::Builder;

async fn collect_frames(reads: &[&[u8]]) -> (Vec<String>, Option<FrameError>) {
    collect_frames_with_limit(reads, DEFAULT_MAX_FRAME).await
}

async fn collect_frames_with_limit(
    reads: &[&[u8]],
    max_frame: usize,
) -> (Vec<String>, Option<FrameError>) {
    let mut builder = Builder::new();
    for chunk in reads {
        builder.read(chunk);
    }
    let mut reader = FrameReader::with_max_frame(builder.build(), max_frame);

    let mut frames = Vec::new();
    loop {
        match reader.next_frame().await {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => return (frames, None),
            Err(e) => return (frames, Some(e)),
        }
    }
}

#[tokio::test]
async fn test_hello_in_one_read() {
    let (frames, err) = collect_frames(&[b"5:hello"]).await;
    assert_eq!(frames, vec!["hello"]);
    assert!(err.is_none());
}

#[tokio::test]
async fn test_hello_across_two_reads() {
    let (frames, err) = collect_frames(&[b"5:he", b"llo"]).await;
    assert_eq!(frames, vec!["hello"]);
    assert!(err.is_none());
}

#[tokio::test]
async fn test_byte_at_a_time() {
    let wire = encode_frame("move_left");
    let chunks: Vec<&[u8]> = wire.chunks(1).collect();
    let (frames, _) = collect_frames(&chunks).await;
    assert_eq!(frames, vec!["move_left"]);
}

#[tokio::test]
async fn test_snapshot_frame_split_mid_payload() {
    let snapshot = "01".repeat(100);
    let wire = encode_frame(&snapshot);
    let (head, tail) = wire.split_at(57);
    let (frames, err) = collect_frames(&[head, tail]).await;
    assert_eq!(frames, vec![snapshot]);
    assert!(err.is_none());
}

#[tokio::test]
async fn test_order_is_preserved() {
    let mut wire = Vec::new();
    for payload in ["move_left", "rotate", "hard_drop"] {
        wire.extend(encode_frame(payload));
    }
    let (frames, _) = collect_frames(&[&wire]).await;
    assert_eq!(frames, vec!["move_left", "rotate", "hard_drop"]);
}

#[tokio::test]
async fn test_close_mid_payload_delivers_nothing() {
    let (frames, err) = collect_frames(&[b"5:he"]).await;
    assert!(frames.is_empty());
    assert!(matches!(
        err,
        Some(FrameError::TruncatedPayload {
            expected: 5,
            received: 2
        })
    ));
}

#[tokio::test]
async fn test_close_mid_prefix_delivers_nothing() {
    let (frames, err) = collect_frames(&[b"20"]).await;
    assert!(frames.is_empty());
    assert!(err.is_none());
}

#[tokio::test]
async fn test_garbage_prefix_recovers() {
    let (frames, err) = collect_frames(&[b"abc:", b"3:xyz"]).await;
    assert_eq!(frames, vec!["xyz"]);
    assert!(err.is_none());
}

#[tokio::test]
async fn test_overlong_prefix_ignores_read_boundaries() {
    let wire: &[u8] = b"1234567890123456789012:ab2:ok";
    let (one, _) = collect_frames(&[wire]).await;
    let (split, _) = collect_frames(&[&wire[..21], &wire[21..]]).await;
    let (bytewise, _) = collect_frames(&wire.chunks(1).collect::<Vec<_>>()).await;

    // "ab2" after the discarded prefix is itself malformed; "ok" is unframed.
    assert_eq!(one, Vec::<String>::new());
    assert_eq!(one, split);
    assert_eq!(one, bytewise);

    let (frames, err) = collect_frames(&[b"99999999999999999999999", b"9:5:hello"]).await;
    assert_eq!(frames, vec!["hello"]);
    assert!(err.is_none());
}

#[tokio::test]
async fn test_default_frame_limit_from_client_config() {
    let max_frame = ClientConfig::default().max_frame;
    assert_eq!(max_frame, DEFAULT_MAX_FRAME);

    let at_limit = "1".repeat(max_frame);
    let (frames, err) = collect_frames_with_limit(&[encode_frame(&at_limit).as_slice()], max_frame).await;
    assert_eq!(frames.len(), 1);
    assert!(err.is_none());

    let over = "1".repeat(max_frame + 1);
    let (frames, err) = collect_frames_with_limit(&[encode_frame(&over).as_slice()], max_frame).await;
    assert!(frames.is_empty());
    assert!(matches!(
        err,
        Some(FrameError::TooLarge { declared, limit })
            if declared == max_frame + 1 && limit == max_frame
    ));
}
