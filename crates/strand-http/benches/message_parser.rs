use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use strand_http::{Content, HeaderSink, MessageParser, ParseError, ParserConfig};

// ============================================================================
// Test data: header blocks and framed bodies of increasing size
// ============================================================================

struct NullSink;

impl HeaderSink for NullSink {
    fn on_header(&mut self, _name: &str, _value: &str) -> Result<bool, ParseError> {
        Ok(false)
    }

    fn may_have_body(&self) -> bool {
        true
    }
}

fn small_header_block() -> Vec<u8> {
    b"Host: localhost\r\nAccept: */*\r\n\r\n".to_vec()
}

fn browser_header_block() -> Vec<u8> {
    b"Host: example.com\r\n\
      User-Agent: Mozilla/5.0\r\n\
      Accept: text/html,application/xhtml+xml\r\n\
      Accept-Language: en-US,en;q=0.9\r\n\
      Accept-Encoding: gzip, deflate, br\r\n\
      Connection: keep-alive\r\n\
      Cache-Control: no-cache\r\n\
      \r\n"
        .to_vec()
}

fn header_block_with(count: usize) -> Vec<u8> {
    let mut raw = String::new();
    for i in 0..count {
        use std::fmt::Write;
        write!(raw, "X-Custom-Header-{i}: value-{i}\r\n").unwrap();
    }
    raw.push_str("\r\n");
    raw.into_bytes()
}

fn length_framed_message(body_len: usize) -> Vec<u8> {
    let mut raw = format!("Content-Length: {body_len}\r\n\r\n").into_bytes();
    raw.extend(std::iter::repeat(b'x').take(body_len));
    raw
}

fn chunked_message(chunk_len: usize, chunks: usize) -> Vec<u8> {
    let mut raw = b"Transfer-Encoding: chunked\r\n\r\n".to_vec();
    for _ in 0..chunks {
        raw.extend_from_slice(format!("{chunk_len:x}\r\n").as_bytes());
        raw.extend(std::iter::repeat(b'x').take(chunk_len));
        raw.extend_from_slice(b"\r\n");
    }
    raw.extend_from_slice(b"0\r\n\r\n");
    raw
}

/// Parse one full message, discarding emitted headers and body slices.
fn consume_message(raw: &[u8]) {
    let mut parser = MessageParser::new(ParserConfig::default());
    let mut sink = NullSink;
    let mut input = Bytes::copy_from_slice(raw);

    assert!(parser.parse_headers(&mut sink, &mut input).unwrap());
    loop {
        match parser.parse_content(&mut sink, &mut input).unwrap() {
            Content::Data(_) => {}
            Content::Done => break,
            Content::NeedInput => break,
        }
    }
}

// ============================================================================
// Benchmarks: header block parsing
// ============================================================================

fn bench_header_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("headers");

    let blocks: Vec<(&str, Vec<u8>)> = vec![
        ("2_headers", small_header_block()),
        ("typical_browser", browser_header_block()),
        ("30_headers", header_block_with(30)),
        ("100_headers", header_block_with(100)),
    ];

    for (name, block) in &blocks {
        group.throughput(Throughput::Bytes(block.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), block, |b, block| {
            b.iter(|| {
                let mut parser = MessageParser::new(ParserConfig::default());
                let mut sink = NullSink;
                let mut input = Bytes::copy_from_slice(block);
                parser.parse_headers(&mut sink, &mut input).unwrap()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmarks: body framing
// ============================================================================

fn bench_body_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("body");

    let messages: Vec<(&str, Vec<u8>)> = vec![
        ("length_1k", length_framed_message(1024)),
        ("length_64k", length_framed_message(64 * 1024)),
        ("chunked_16x64", chunked_message(64, 16)),
        ("chunked_16x4k", chunked_message(4 * 1024, 16)),
    ];

    for (name, message) in &messages {
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), message, |b, message| {
            b.iter(|| consume_message(message));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmarks: incremental feeding
// ============================================================================

fn bench_incremental_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");

    let message = chunked_message(256, 8);
    group.throughput(Throughput::Bytes(message.len() as u64));

    for window in [16usize, 64, 256] {
        group.bench_with_input(
            BenchmarkId::new("window", window),
            &message,
            |b, message| {
                b.iter(|| {
                    let mut parser = MessageParser::new(ParserConfig::default());
                    let mut sink = NullSink;
                    let mut headers_done = false;

                    for piece in message.chunks(window) {
                        let mut input = Bytes::copy_from_slice(piece);
                        loop {
                            if !headers_done {
                                if !parser.parse_headers(&mut sink, &mut input).unwrap() {
                                    break;
                                }
                                headers_done = true;
                            }
                            match parser.parse_content(&mut sink, &mut input).unwrap() {
                                Content::Data(_) => {}
                                Content::Done => break,
                                Content::NeedInput => break,
                            }
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_header_parsing,
    bench_body_framing,
    bench_incremental_windows,
);
criterion_main!(benches);
