use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use csv_batch::{ParseError, ParseOptions, Parser, parse, parse_str};
use tokio::io::{AsyncRead, ReadBuf};

/// Yields the input in fixed-size chunks, one per read call.
struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk,
        }
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.data.len() {
            let end = (this.pos + this.chunk).min(this.data.len());
            buf.put_slice(&this.data[this.pos..end]);
            this.pos = end;
        }
        Poll::Ready(Ok(()))
    }
}

/// Fails with an I/O error after yielding a prefix.
struct FailingReader {
    prefix: &'static [u8],
    sent: bool,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.sent {
            this.sent = true;
            buf.put_slice(this.prefix);
            Poll::Ready(Ok(()))
        } else {
            Poll::Ready(Err(io::Error::other("source went away")))
        }
    }
}

const AWKWARD: &str = "a,\"b\"\"c\"\r\n\"d\ne\",f\r\n,g";

#[tokio::test]
async fn chunked_feeds_match_one_shot_parsing() {
    let mut one_shot = ParseOptions::new();
    one_shot.header = false;
    let expected = parse_str(AWKWARD, one_shot).await;

    let mut options = ParseOptions::new();
    options.header = false;
    let mut parser = Parser::new(options);
    let mut buf = [0u8; 4];
    for c in AWKWARD.chars() {
        parser.feed(c.encode_utf8(&mut buf)).await;
    }
    let result = parser.finish().await;

    assert_eq!(result.total_records, expected.total_records);
    assert_eq!(
        serde_json::to_value(result.into_accumulator().unwrap()).unwrap(),
        serde_json::to_value(expected.into_accumulator().unwrap()).unwrap()
    );
}

#[tokio::test]
async fn feeding_nothing_is_harmless() {
    let mut parser = Parser::new(ParseOptions::new());
    parser.feed("").await;
    parser.feed("a,b\n1,2").await;
    parser.feed("").await;
    let result = parser.finish().await;
    assert_eq!(result.total_records, 1);
}

#[tokio::test]
async fn byte_slices_are_valid_sources() {
    let csv: &[u8] = b"id,name\n1,Ada\n2,Grace";
    let result = parse(csv, ParseOptions::new()).await.unwrap();
    assert_eq!(result.total_records, 2);
}

#[tokio::test]
async fn multi_byte_sequences_survive_single_byte_reads() {
    let csv = "name,symbol\nπ,\u{221e}\ncafé,\u{20ac}";
    let reader = ChunkedReader::new(csv.as_bytes(), 1);
    let result = parse(reader, ParseOptions::new()).await.unwrap();

    assert_eq!(result.total_records, 2);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        records[0].get("name").and_then(csv_batch::Field::as_str),
        Some("π")
    );
    assert_eq!(
        records[1].get("symbol").and_then(csv_batch::Field::as_str),
        Some("\u{20ac}")
    );
}

#[tokio::test]
async fn invalid_utf8_is_a_fatal_source_error() {
    let bytes: &[u8] = b"a,b\n1,\xFF\n";
    let err = parse(bytes, ParseOptions::new()).await.unwrap_err();
    assert!(matches!(err, ParseError::Utf8 { offset: 6 }));
}

#[tokio::test]
async fn truncated_utf8_at_end_of_stream_is_fatal() {
    let mut bytes = b"a\n".to_vec();
    bytes.push(0xC3);
    let err = parse(&bytes[..], ParseOptions::new()).await.unwrap_err();
    assert!(matches!(err, ParseError::Utf8 { .. }));
}

#[tokio::test]
async fn source_failures_abort_without_a_result() {
    let reader = FailingReader {
        prefix: b"a,b\n1,2\n",
        sent: false,
    };
    let err = parse(reader, ParseOptions::new()).await.unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}
