use bytes::Bytes;
use futures::{StreamExt, stream};
use snowfall::streaming::{AssemblerState, StreamingTextAssembler, collect_reply};
use snowfall::TutorError;

type Chunk = Result<Bytes, std::io::Error>;

fn event(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
        })
    )
}

fn sample_body() -> String {
    let mut body = String::from(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
    );
    for piece in ["Bonjour", ", ", "ça va", " ? ", "日本語", " 🎉", "\n\"quoted\"\\"] {
        body.push_str(&event(piece));
    }
    body.push_str(": keep-alive\n\n");
    body.push_str("data: [DONE]\n\n");
    body
}

const EXPECTED: &str = "Bonjour, ça va ? 日本語 🎉\n\"quoted\"\\";

fn chunked(bytes: &[u8], size: usize) -> Vec<Chunk> {
    bytes
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

async fn fragments(chunks: Vec<Chunk>) -> Vec<String> {
    StreamingTextAssembler::new(stream::iter(chunks))
        .into_stream()
        .map(|f| f.expect("no read errors in fixture"))
        .collect()
        .await
}

#[tokio::test]
async fn test_output_independent_of_two_way_split() {
    let body = sample_body();
    let bytes = body.as_bytes();
    let baseline = fragments(chunked(bytes, bytes.len())).await;
    assert_eq!(baseline.concat(), EXPECTED);

    for split in 1..bytes.len() {
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&bytes[..split])),
            Ok(Bytes::copy_from_slice(&bytes[split..])),
        ];
        assert_eq!(fragments(chunks).await, baseline, "split at byte {}", split);
    }
}

#[tokio::test]
async fn test_output_independent_of_chunk_size() {
    let body = sample_body();
    for size in [1, 2, 3, 5, 7, 16, 64] {
        let out = fragments(chunked(body.as_bytes(), size)).await;
        assert_eq!(out.concat(), EXPECTED, "chunk size {}", size);
        assert_eq!(out.len(), 7);
    }
}

#[tokio::test]
async fn test_hello_then_done() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "data: [DONE]\n",
    );
    let mut assembler = StreamingTextAssembler::new(stream::iter(chunked(body.as_bytes(), 10)));

    assert_eq!(assembler.next_fragment().await.unwrap().unwrap(), "Hel");
    assert_eq!(assembler.next_fragment().await.unwrap().unwrap(), "lo");
    assert!(assembler.next_fragment().await.is_none());
    assert_eq!(assembler.state(), AssemblerState::Completed);
}

#[tokio::test]
async fn test_unterminated_final_line_is_flushed() {
    let chunks = vec![
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"the \"}}]}\n")),
        Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"con")),
        Ok(Bytes::from_static(b"tent\":\"end\"}}]}")),
    ];
    assert_eq!(fragments(chunks).await, vec!["the ", "end"]);
}

#[tokio::test]
async fn test_invalid_json_completes_quietly() {
    let chunks: Vec<Chunk> = vec![Ok(Bytes::from_static(b"data: {not valid json"))];
    let mut assembler = StreamingTextAssembler::new(stream::iter(chunks));

    assert!(assembler.next_fragment().await.is_none());
    assert_eq!(assembler.state(), AssemblerState::Completed);
    assert_eq!(assembler.malformed_events(), 1);
}

#[tokio::test]
async fn test_role_only_delta_emits_nothing() {
    let chunks = vec![Ok(Bytes::from_static(
        b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\ndata: [DONE]\n",
    ))];
    assert!(fragments(chunks).await.is_empty());
}

#[tokio::test]
async fn test_not_restartable() {
    let body = event("once");
    let mut assembler =
        StreamingTextAssembler::new(stream::iter(chunked(body.as_bytes(), body.len())));

    assert_eq!(collect_reply_by_ref(&mut assembler).await, "once");
    assert!(assembler.next_fragment().await.is_none());
    assert!(assembler.next_fragment().await.is_none());
}

async fn collect_reply_by_ref<S>(assembler: &mut StreamingTextAssembler<S>) -> String
where
    S: futures::Stream<Item = Chunk> + Unpin,
{
    let mut out = String::new();
    while let Some(fragment) = assembler.next_fragment().await {
        out.push_str(&fragment.unwrap());
    }
    out
}

#[tokio::test]
async fn test_partial_text_kept_before_read_error() {
    let chunks: Vec<Chunk> = vec![
        Ok(Bytes::from(event("kept"))),
        Err(std::io::Error::other("socket closed")),
    ];
    let items: Vec<_> = StreamingTextAssembler::new(stream::iter(chunks))
        .into_stream()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "kept");
    assert!(matches!(items[1], Err(TutorError::StreamRead(_))));
}

#[tokio::test]
async fn test_collect_reply_fails_on_read_error() {
    let chunks: Vec<Chunk> = vec![
        Ok(Bytes::from(event("a"))),
        Err(std::io::Error::other("reset")),
    ];
    let err = collect_reply(StreamingTextAssembler::new(stream::iter(chunks)))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("reset"));
}

#[tokio::test]
async fn test_pull_reads_one_chunk_at_a_time() {
    // second chunk is an error; it must not be touched until the first fragment is consumed
    let chunks: Vec<Chunk> = vec![
        Ok(Bytes::from(format!("{}{}", event("one"), event("two")))),
        Err(std::io::Error::other("later")),
    ];
    let mut assembler = StreamingTextAssembler::new(stream::iter(chunks));

    assert_eq!(assembler.next_fragment().await.unwrap().unwrap(), "one");
    assert_eq!(assembler.next_fragment().await.unwrap().unwrap(), "two");
    assert_eq!(assembler.state(), AssemblerState::Streaming);
    assert!(assembler.next_fragment().await.unwrap().is_err());
}

#[tokio::test]
async fn test_leading_byte_order_mark_ignored() {
    let body = format!("\u{FEFF}{}{}", event("first"), event("second"));
    assert_eq!(fragments(chunked(body.as_bytes(), 4096)).await, vec!["first", "second"]);
    // BOM cut across chunks
    assert_eq!(fragments(chunked(body.as_bytes(), 1)).await, vec!["first", "second"]);
}
