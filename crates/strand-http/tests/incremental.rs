//! Incrementality properties of the message parser.
//!
//! The core contract: however the input is split into windows, the emitted
//! header pairs and the concatenation of emitted body slices match what a
//! single-window parse produces.

use bytes::Bytes;
use proptest::prelude::*;
use strand_http::{Content, HeaderSink, MessageParser, ParseError, ParserConfig};

// ============================================================================
// Driver
// ============================================================================

#[derive(Default)]
struct CollectingSink {
    headers: Vec<(String, String)>,
    body_allowed: bool,
}

impl HeaderSink for CollectingSink {
    fn on_header(&mut self, name: &str, value: &str) -> Result<bool, ParseError> {
        self.headers.push((name.to_string(), value.to_string()));
        Ok(false)
    }

    fn may_have_body(&self) -> bool {
        self.body_allowed
    }
}

struct Outcome {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    complete: bool,
    /// Bytes left unconsumed once the message completed.
    leftover: Vec<u8>,
}

/// Feed the pieces to a fresh parser, collecting headers and body slices.
fn drive(pieces: &[Vec<u8>]) -> Result<Outcome, ParseError> {
    let mut parser = MessageParser::new(ParserConfig::default());
    let mut sink = CollectingSink {
        body_allowed: true,
        ..CollectingSink::default()
    };

    let mut body = Vec::new();
    let mut headers_done = false;
    let mut complete = false;
    let mut leftover = Vec::new();

    for (index, piece) in pieces.iter().enumerate() {
        let mut window = Bytes::from(piece.clone());
        loop {
            if complete {
                break;
            }
            if !headers_done {
                if !parser.parse_headers(&mut sink, &mut window)? {
                    break;
                }
                headers_done = parser.headers_complete();
                if !headers_done {
                    continue;
                }
            }
            match parser.parse_content(&mut sink, &mut window)? {
                Content::Data(slice) => body.extend_from_slice(&slice),
                Content::Done => complete = true,
                Content::NeedInput => {
                    if window.is_empty() {
                        break;
                    }
                }
            }
        }
        if complete {
            leftover.extend_from_slice(&window);
            for rest in &pieces[index + 1..] {
                leftover.extend_from_slice(rest);
            }
            break;
        }
    }

    Ok(Outcome {
        headers: sink.headers,
        body,
        complete,
        leftover,
    })
}

fn cut(raw: &[u8], mut cuts: Vec<usize>) -> Vec<Vec<u8>> {
    cuts.sort_unstable();
    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut prev = 0;
    for cut in cuts {
        pieces.push(raw[prev..cut].to_vec());
        prev = cut;
    }
    pieces.push(raw[prev..].to_vec());
    pieces
}

// ============================================================================
// Strategies
// ============================================================================

fn header_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("X-[A-Za-z0-9-]{1,12}").unwrap()
}

fn header_value() -> impl Strategy<Value = String> {
    // Printable ASCII without surrounding whitespace, so the trim step is
    // the identity on it.
    proptest::string::string_regex("[!-~]([ -~]{0,20}[!-~])?").unwrap()
}

prop_compose! {
    /// A Content-Length framed message plus the expected parse.
    fn length_message()(
        headers in prop::collection::vec((header_name(), header_value()), 0..6),
        body in prop::collection::vec(any::<u8>(), 0..200),
        crlf in any::<bool>(),
    ) -> (Vec<(String, String)>, Vec<u8>, Vec<u8>) {
        let eol = if crlf { "\r\n" } else { "\n" };
        let mut raw = Vec::new();
        for (name, value) in &headers {
            raw.extend_from_slice(format!("{name}: {value}{eol}").as_bytes());
        }
        raw.extend_from_slice(format!("Content-Length: {}{eol}{eol}", body.len()).as_bytes());
        raw.extend_from_slice(&body);

        let mut expected = headers;
        expected.push(("Content-Length".to_string(), body.len().to_string()));
        (expected, body, raw)
    }
}

prop_compose! {
    /// A chunked message built from an arbitrary body and an arbitrary
    /// partition of it into chunks.
    fn chunked_message()(
        body in prop::collection::vec(any::<u8>(), 0..200),
        seed in prop::collection::vec(1usize..32, 0..12),
        with_extension in any::<bool>(),
    ) -> (Vec<u8>, Vec<u8>) {
        let mut raw = b"Transfer-Encoding: chunked\r\n\r\n".to_vec();

        let mut offset = 0;
        let mut sizes = seed.into_iter();
        while offset < body.len() {
            let size = sizes.next().unwrap_or(body.len()).min(body.len() - offset);
            let chunk = &body[offset..offset + size];
            if with_extension {
                raw.extend_from_slice(format!("{size:x};name=value\r\n").as_bytes());
            } else {
                raw.extend_from_slice(format!("{size:x}\r\n").as_bytes());
            }
            raw.extend_from_slice(chunk);
            raw.extend_from_slice(b"\r\n");
            offset += size;
        }
        raw.extend_from_slice(b"0\r\n\r\n");
        (body, raw)
    }
}

fn with_cuts<T: std::fmt::Debug + Clone + 'static>(
    message: impl Strategy<Value = (T, Vec<u8>)>,
) -> impl Strategy<Value = (T, Vec<u8>, Vec<Vec<u8>>)> {
    message.prop_flat_map(|(expected, raw)| {
        let len = raw.len();
        (
            Just(expected),
            Just(raw),
            prop::collection::vec(0..=len, 0..5),
        )
            .prop_map(|(expected, raw, cuts)| {
                let pieces = cut(&raw, cuts);
                (expected, raw, pieces)
            })
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn split_points_do_not_change_the_parse(
        ((expected_headers, expected_body), _raw, pieces) in with_cuts(
            length_message().prop_map(|(h, b, raw)| ((h, b), raw))
        )
    ) {
        let outcome = drive(&pieces).unwrap();
        prop_assert!(outcome.complete);
        prop_assert_eq!(outcome.headers, expected_headers);
        prop_assert_eq!(outcome.body, expected_body);
    }

    #[test]
    fn chunked_bodies_round_trip(
        (expected_body, _raw, pieces) in with_cuts(chunked_message())
    ) {
        let outcome = drive(&pieces).unwrap();
        prop_assert!(outcome.complete);
        prop_assert_eq!(outcome.body, expected_body);
    }

    #[test]
    fn length_mode_consumes_exactly_the_declared_bytes(
        (expected_body, _raw, mut pieces) in with_cuts(
            length_message().prop_map(|(_, b, raw)| (b, raw))
        ),
        trailing in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        // Stick pipelined garbage after the message; none of it may be
        // consumed as body.
        match pieces.last_mut() {
            Some(last) => last.extend_from_slice(&trailing),
            None => pieces.push(trailing.clone()),
        }

        let outcome = drive(&pieces).unwrap();
        prop_assert!(outcome.complete);
        prop_assert_eq!(outcome.body.len(), expected_body.len());
        prop_assert_eq!(outcome.body, expected_body);
        prop_assert_eq!(outcome.leftover, trailing);
    }

    #[test]
    fn oversize_header_blocks_fail_at_any_split(
        cuts in prop::collection::vec(0usize..=8192, 0..5),
    ) {
        // An 8 KB block against the 4 KB cap of this parser.
        let mut raw = Vec::new();
        for i in 0..256 {
            raw.extend_from_slice(format!("X-Header-{i}: {}\r\n", "v".repeat(16)).as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        let raw = &raw[..8192.min(raw.len())];

        let config = ParserConfig::new().with_header_size_limit(4096);
        let mut parser = MessageParser::new(config);
        let mut sink = CollectingSink {
            body_allowed: true,
            ..CollectingSink::default()
        };

        let cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(raw.len())).collect();
        let mut failed = false;
        for piece in cut(raw, cuts) {
            let mut window = Bytes::from(piece);
            match parser.parse_headers(&mut sink, &mut window) {
                Ok(_) => {}
                Err(err) => {
                    prop_assert!(err.is_bad_request());
                    failed = true;
                    break;
                }
            }
        }
        prop_assert!(failed);
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn scenario_content_length_message() {
    let outcome = drive(&[b"Content-Length: 5\n\nhello".to_vec()]).unwrap();

    assert!(outcome.complete);
    assert_eq!(
        outcome.headers,
        vec![("Content-Length".to_string(), "5".to_string())]
    );
    assert_eq!(outcome.body, b"hello");
}

#[test]
fn scenario_chunked_message() {
    let outcome = drive(&[b"Transfer-Encoding: chunked\n\n5\nhello\n0\n\n".to_vec()]).unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.body, b"hello");
}

#[test]
fn scenario_chunked_with_extension_and_trailer() {
    let outcome = drive(&[
        b"Transfer-Encoding: chunked\n\n5;ext=1\nhello\n0\nX-Trailer: v\n\n".to_vec(),
    ])
    .unwrap();

    assert!(outcome.complete);
    assert_eq!(outcome.body, b"hello");
    assert_eq!(
        outcome.headers.last().unwrap(),
        &("X-Trailer".to_string(), "v".to_string())
    );
}

#[test]
fn byte_at_a_time_equals_one_shot() {
    let raw: &[u8] =
        b"Host: example.com\r\nTransfer-Encoding: chunked\r\n\r\n6\r\nstrand\r\n3;x\r\nend\r\n0\r\nX-T: 1\r\n\r\n";

    let single = drive(&[raw.to_vec()]).unwrap();
    let pieces: Vec<Vec<u8>> = raw.iter().map(|&b| vec![b]).collect();
    let split = drive(&pieces).unwrap();

    assert!(single.complete && split.complete);
    assert_eq!(single.headers, split.headers);
    assert_eq!(single.body, split.body);
    assert_eq!(split.body, b"strandend");
}
