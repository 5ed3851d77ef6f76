use bytes::Bytes;
use futures::stream::StreamExt;
use proptest::prelude::*;

use super::{create_line_stream, line_stream};

async fn collect_lines(chunks: Vec<Vec<u8>>) -> Vec<String> {
    let chunks: Vec<Result<Bytes, reqwest::Error>> =
        chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
    let mut stream = line_stream(futures::stream::iter(chunks));
    let mut lines = Vec::new();
    while let Some(line) = stream.next().await {
        lines.push(line.unwrap());
    }
    lines
}

#[tokio::test]
async fn test_line_stream_handles_split_utf8() {
    let test_data = "data: Positive reactions\n\n".as_bytes();

    let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
        Ok(Bytes::from(&test_data[..10])),
        Ok(Bytes::from(&test_data[10..])),
    ];

    let mut stream = create_line_stream(create_mock_response(chunks));

    let mut results = Vec::new();
    while let Some(result) = stream.next().await {
        results.push(result);
    }

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap(), "data: Positive reactions");
}

#[tokio::test]
async fn test_line_stream_handles_lines_split_across_reads() {
    let line1 = "data: First event\n";
    let line2 = "data: Second event\n";
    let combined = format!("{line1}{line2}");
    let data = combined.as_bytes();
    let split_point = line1.len() + 5;

    let lines = collect_lines(vec![data[..split_point].to_vec(), data[split_point..].to_vec()]).await;

    assert_eq!(lines, vec!["data: First event", "data: Second event"]);
}

#[tokio::test]
async fn test_line_stream_handles_multibyte_utf8_split() {
    let multibyte_char = "✨";
    let event = format!("data: Star {multibyte_char}\n");
    let data = event.as_bytes().to_vec();

    let emoji_start = event.find(multibyte_char).unwrap();
    let split_in_emoji = emoji_start + 1;

    let lines = collect_lines(vec![data[..split_in_emoji].to_vec(), data[split_in_emoji..].to_vec()]).await;

    assert_eq!(lines, vec![format!("data: Star {multibyte_char}")]);
}

#[tokio::test]
async fn test_line_stream_strips_crlf_and_blank_lines() {
    let lines = collect_lines(vec![b"data: a\r\n\r\ndata: b\r\n".to_vec()]).await;
    assert_eq!(lines, vec!["data: a", "data: b"]);
}

#[tokio::test]
async fn test_line_stream_flushes_unterminated_tail() {
    let lines = collect_lines(vec![b"data: a\ndata: [DONE]".to_vec()]).await;
    assert_eq!(lines, vec!["data: a", "data: [DONE]"]);
}

#[tokio::test]
async fn test_line_stream_replaces_invalid_bytes_without_stalling() {
    let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Bytes, reqwest::Error>>();
    let mut stream = line_stream(rx);

    tx.unbounded_send(Ok(Bytes::from_static(b"data: bad \xff byte\n")))
        .unwrap();
    tx.unbounded_send(Ok(Bytes::from_static(b"data: next line\n")))
        .unwrap();

    // The sender stays open: both lines must arrive before EOF.
    let first = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
        .await
        .expect("line after an invalid byte was held back");
    assert_eq!(first.unwrap().unwrap(), "data: bad \u{FFFD} byte");
    let second = tokio::time::timeout(std::time::Duration::from_secs(1), stream.next())
        .await
        .expect("following line was held back");
    assert_eq!(second.unwrap().unwrap(), "data: next line");

    // An incomplete sequence is still carried to the next read.
    tx.unbounded_send(Ok(Bytes::from_static(b"data: caf\xc3"))).unwrap();
    tx.unbounded_send(Ok(Bytes::from_static(b"\xa9\n"))).unwrap();
    drop(tx);
    let lines: Vec<String> = stream.map(|line| line.unwrap()).collect().await;
    assert_eq!(lines, vec!["data: caf\u{e9}".to_string()]);
}

proptest! {
    #[test]
    fn split_points_never_change_lines(
        lines in proptest::collection::vec("[a-zé✨ ]{1,12}", 1..8),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let joined: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let bytes = joined.as_bytes();
        let mut offsets: Vec<usize> = cuts.iter().map(|c| c.index(bytes.len())).collect();
        offsets.sort_unstable();
        offsets.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for offset in offsets {
            chunks.push(bytes[start..offset].to_vec());
            start = offset;
        }
        chunks.push(bytes[start..].to_vec());

        let expected: Vec<String> = lines
            .iter()
            .map(|l| l.to_string())
            .filter(|l| !l.is_empty())
            .collect();
        let got = futures::executor::block_on(collect_lines(chunks));
        prop_assert_eq!(got, expected);
    }
}

fn create_mock_response(chunks: Vec<Result<Bytes, reqwest::Error>>) -> reqwest::Response {
    use http_body_util::StreamBody;
    use reqwest::Body;

    let frame_stream = futures::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| chunk.map(hyper::body::Frame::data)),
    );

    let body = StreamBody::new(frame_stream);
    let body = Body::wrap(body);

    let http_response = http::Response::builder().status(200).body(body).unwrap();

    http_response.into()
}
