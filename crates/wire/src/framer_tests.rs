// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::error::PARSE_ERROR;

fn messages(frames: &[Frame]) -> Vec<Value> {
    frames
        .iter()
        .filter_map(|f| match f {
            Frame::Message(v) => Some(v.clone()),
            Frame::Invalid(_) => None,
        })
        .collect()
}

#[test]
fn split_chunk_yields_one_message() {
    let mut framer = LineFramer::default();

    assert!(framer.push(br#"{"id":2,"meth"#).is_empty());
    assert_eq!(framer.buffered(), 13);

    let frames = framer.push(b"od\":\"ready\"}\n");
    assert_eq!(frames, vec![Frame::Message(json!({"id": 2, "method": "ready"}))]);
    assert_eq!(framer.buffered(), 0);
}

#[test]
fn chunk_without_delimiter_only_grows_the_buffer() {
    let mut framer = LineFramer::default();
    assert!(framer.push(b"{\"id\":").is_empty());
    assert!(framer.push(b"1,").is_empty());
    assert_eq!(framer.buffered(), 8);
}

#[test]
fn several_lines_in_one_chunk_keep_arrival_order() {
    let mut framer = LineFramer::default();
    let frames = framer.push(b"{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n{\"id\":");

    assert_eq!(messages(&frames), vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    assert_eq!(framer.buffered(), 6);
}

#[yare::parameterized(
    empty_line      = { b"\n\n{\"id\":1}\n" as &[u8] },
    whitespace_line = { b"   \t\n{\"id\":1}\n" },
    crlf            = { b"\r\n{\"id\":1}\r\n" },
)]
fn blank_lines_are_dropped(input: &[u8]) {
    let mut framer = LineFramer::default();
    assert_eq!(framer.push(input), vec![Frame::Message(json!({"id": 1}))]);
}

#[test]
fn malformed_line_does_not_stop_later_lines() {
    let mut framer = LineFramer::default();
    let frames = framer.push(b"{not json}\n{\"id\":5,\"method\":\"ready\"}\n");

    assert_eq!(frames.len(), 2);
    match &frames[0] {
        Frame::Invalid(error) => {
            assert_eq!(error.code, PARSE_ERROR);
            assert!(error.message.starts_with("Parse error"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert_eq!(frames[1], Frame::Message(json!({"id": 5, "method": "ready"})));
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let mut framer = LineFramer::default();
    let frames = framer.push(b"\xff\xfe\n");
    assert!(matches!(&frames[..], [Frame::Invalid(e)] if e.code == PARSE_ERROR));
}

#[test]
fn multibyte_characters_split_across_chunks_survive() {
    let line = "{\"name\":\"café\"}\n".as_bytes();
    let split = line.iter().position(|b| *b == 0xc3).unwrap() + 1;

    let mut framer = LineFramer::default();
    assert!(framer.push(&line[..split]).is_empty());
    assert_eq!(framer.push(&line[split..]), vec![Frame::Message(json!({"name": "café"}))]);
}

#[test]
fn oversized_line_is_reported_once_and_skipped() {
    let mut framer = LineFramer::new(8);

    let frames = framer.push(b"{\"id\":123456");
    assert!(matches!(&frames[..], [Frame::Invalid(e)] if e.code == PARSE_ERROR));

    // Rest of the oversized line is discarded silently
    assert!(framer.push(b"7890}").is_empty());
    let frames = framer.push(b"\n{\"id\":1}\n");
    assert_eq!(frames, vec![Frame::Message(json!({"id": 1}))]);
}

#[test]
fn complete_oversized_line_is_rejected() {
    let mut framer = LineFramer::new(4);
    let frames = framer.push(b"{\"id\":10}\n[]\n");

    assert_eq!(frames.len(), 2);
    assert!(matches!(&frames[0], Frame::Invalid(_)));
    assert_eq!(frames[1], Frame::Message(json!([])));
}

#[test]
fn decode_eof_drops_incomplete_fragment() {
    let mut framer = LineFramer::default();
    let mut buf = BytesMut::from(&b"{\"id\":1}\n{\"id\""[..]);

    assert_eq!(framer.decode_eof(&mut buf).unwrap(), Some(Frame::Message(json!({"id": 1}))));
    assert_eq!(framer.decode_eof(&mut buf).unwrap(), None);
    assert!(buf.is_empty());
}
