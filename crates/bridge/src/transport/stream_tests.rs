// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_wire::{ResponseEnvelope, PARSE_ERROR};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

#[tokio::test]
async fn frames_arrive_across_chunk_boundaries() {
    let (mut driver, bridge) = tokio::io::duplex(256);
    let (reader, writer) = tokio::io::split(bridge);
    let (mut source, _sink) = StreamTransport::new(reader, writer, 1024).split();

    driver.write_all(br#"{"id":2,"meth"#).await.unwrap();
    driver.write_all(b"od\":\"ready\"}\n\n   \nnot json\n").await.unwrap();
    drop(driver);

    match source.recv().await.unwrap().unwrap() {
        Frame::Message(value) => assert_eq!(value, json!({"id": 2, "method": "ready"})),
        other => panic!("expected message, got {other:?}"),
    }
    match source.recv().await.unwrap().unwrap() {
        Frame::Invalid(error) => assert_eq!(error.code, PARSE_ERROR),
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(source.recv().await.is_none());
    assert_eq!(source.end_of_input(), EndOfInput::StreamEnded);
}

#[tokio::test]
async fn sink_writes_one_line_per_message() {
    let (mut driver, bridge) = tokio::io::duplex(256);
    let (reader, writer) = tokio::io::split(bridge);
    let (_source, mut sink) = StreamTransport::new(reader, writer, 1024).split();

    sink.send(&ResponseEnvelope::ready().into()).await.unwrap();
    sink.close().await.unwrap();

    let mut buf = vec![0u8; 64];
    let n = driver.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"{\"id\":0,\"result\":{\"ready\":true}}\n");
}
