// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end behavior of the `orb-bridge` binary over stdio.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(10);

struct Worker {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: mpsc::Receiver<String>,
}

impl Worker {
    fn spawn(args: &[&str]) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_orb-bridge"))
            .args(args)
            .env("ORB_LOG", "debug")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn orb-bridge");
        let stdout = child.stdout.take().unwrap();
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        let stdin = child.stdin.take();
        Self { child, stdin, lines }
    }

    fn write(&mut self, bytes: &[u8]) {
        let stdin = self.stdin.as_mut().unwrap();
        stdin.write_all(bytes).unwrap();
        stdin.flush().unwrap();
    }

    fn next(&self) -> Value {
        let line = self.lines.recv_timeout(TIMEOUT).expect("line from bridge");
        serde_json::from_str(&line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
    }

    /// Next message that is not a notification.
    fn response(&self) -> Value {
        loop {
            let message = self.next();
            if message.get("notification").is_none() {
                return message;
            }
        }
    }

    fn signal(&self, signal: Signal) {
        kill(Pid::from_raw(self.child.id() as i32), signal).unwrap();
    }

    /// Stdout closes, then the process exits.
    fn wait_exit(mut self) -> (Vec<String>, std::process::ExitStatus) {
        let mut rest = Vec::new();
        loop {
            match self.lines.recv_timeout(TIMEOUT) {
                Ok(line) => rest.push(line),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => panic!("stdout never closed: {rest:?}"),
            }
        }
        (rest, self.child.wait().unwrap())
    }
}

#[test]
fn first_message_is_readiness() {
    let worker = Worker::spawn(&[]);
    assert_eq!(worker.next(), json!({"id": 0, "result": {"ready": true}}));
}

#[test]
fn malformed_line_is_reported_and_processing_continues() {
    let mut worker = Worker::spawn(&[]);
    worker.next();

    worker.write(b"not json\n");
    let error = worker.response();
    assert_eq!(error["id"], Value::Null);
    assert_eq!(error["error"]["code"], json!(-32700));

    worker.write(b"{\"id\":1,\"method\":\"ready\"}\n");
    assert_eq!(worker.response(), json!({"id": 1, "result": {"ready": true}}));
}

#[test]
fn request_split_across_writes_is_reassembled() {
    let mut worker = Worker::spawn(&[]);
    worker.next();

    worker.write(br#"{"id":2,"meth"#);
    thread::sleep(Duration::from_millis(50));
    worker.write(b"od\":\"ready\"}\n");
    assert_eq!(worker.response(), json!({"id": 2, "result": {"ready": true}}));
}

#[test]
fn sigterm_exits_without_answering_unfinished_input() {
    let mut worker = Worker::spawn(&[]);
    worker.next();
    worker.write(b"{\"id\":1,\"method\":\"connect\",\"params\":{\"config\":{}}}\n");
    assert_eq!(worker.response()["result"], json!({"connected": true}));

    // A request still being received when the signal lands is never answered.
    worker.write(br#"{"id":2,"method":"close""#);
    thread::sleep(Duration::from_millis(50));
    worker.signal(Signal::SIGTERM);
    let (rest, status) = worker.wait_exit();
    assert!(rest.is_empty(), "unexpected output after SIGTERM: {rest:?}");
    assert!(status.success(), "{status:?}");
}

#[test]
fn end_of_input_exits_cleanly() {
    let mut worker = Worker::spawn(&[]);
    worker.next();
    worker.write(b"{\"id\":1,\"method\":\"ready\"}\n");
    worker.response();

    worker.stdin.take();
    let (_, status) = worker.wait_exit();
    assert!(status.success(), "{status:?}");
}

#[test]
fn crud_round_trip_over_stdio() {
    let mut worker = Worker::spawn(&[]);
    worker.next();

    let requests = [
        json!({"id": 1, "method": "connect", "params": {"config": {"dialect": "memory"}}}),
        json!({"id": 2, "method": "defineModel", "params": {
            "name": "User",
            "attributes": {"name": {"type": "STRING", "allowNull": false}}
        }}),
        json!({"id": 3, "method": "create", "params": {"model": "User", "data": {"name": "Ada"}}}),
        json!({"id": 4, "method": "findAll", "params": {"model": "User"}}),
        json!({"id": 5, "method": "create", "params": {"model": "User", "data": {}}}),
        json!({"id": 6, "method": "close"}),
    ];
    let mut responses = Vec::new();
    for request in requests {
        worker.write(format!("{request}\n").as_bytes());
        responses.push(worker.response());
    }

    assert_eq!(responses[0]["result"], json!({"connected": true}));
    assert_eq!(responses[1]["result"]["defined"], json!(true));
    assert_eq!(responses[2]["result"], json!({"id": 1, "name": "Ada"}));
    assert_eq!(responses[3]["result"], json!([{"id": 1, "name": "Ada"}]));
    assert_eq!(responses[4]["id"], json!(5));
    assert_eq!(responses[4]["error"]["name"], json!("ValidationError"));
    assert_eq!(responses[5]["result"], json!({"closed": true}));
}

#[test]
fn log_file_flag_writes_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("bridge.log");
    let mut worker = Worker::spawn(&["--log-file", path.to_str().unwrap()]);
    worker.next();
    worker.stdin.take();
    let (_, status) = worker.wait_exit();
    assert!(status.success());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("bridge ready"), "{contents}");
}
