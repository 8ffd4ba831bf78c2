// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for stream framing and response envelope shape.

use proptest::prelude::*;
use serde_json::{json, Value};

use super::*;

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (any::<u32>(), "[a-zA-Z]{1,12}")
            .prop_map(|(id, method)| json!({"id": id, "method": method}).to_string()),
        "[a-z \\t]{0,6}".prop_map(|s| s),
        "\\{[a-z:\"]{0,10}".prop_map(|s| s),
        ".{0,24}".prop_map(|s| s.replace('\n', " ")),
    ]
}

fn frames_of(input: &[u8], cuts: &[usize]) -> Vec<Frame> {
    let mut framer = LineFramer::default();
    let mut frames = Vec::new();
    let mut start = 0;
    for cut in cuts {
        let cut = (*cut).clamp(start, input.len());
        frames.extend(framer.push(&input[start..cut]));
        start = cut;
    }
    frames.extend(framer.push(&input[start..]));
    frames
}

proptest! {
    /// How the stream is chunked never changes which frames come out.
    #[test]
    fn chunking_does_not_change_frames(
        lines in prop::collection::vec(arb_line(), 0..12),
        mut cuts in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let input: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let input = input.as_bytes();
        let whole = frames_of(input, &[]);

        for cut in cuts.iter_mut() {
            *cut %= input.len() + 1;
        }
        cuts.sort_unstable();
        prop_assert_eq!(frames_of(input, &cuts), whole.clone());

        let non_blank = lines.iter().filter(|l| !l.trim().is_empty()).count();
        prop_assert_eq!(whole.len(), non_blank);
    }

    /// Whatever the worker emits parses back with exactly one of result/error.
    #[test]
    fn responses_parse_with_result_xor_error(id in any::<i64>(), ok in any::<bool>(), text in ".{0,16}") {
        let response = if ok {
            ResponseEnvelope::success(CorrelationId::from(id), Value::String(text))
        } else {
            ResponseEnvelope::failure(CorrelationId::from(id), ErrorDetail::internal(text))
        };
        let line = encode(&WorkerMessage::from(response.clone())).unwrap();
        prop_assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let parsed: Value = serde_json::from_slice(&line).unwrap();
        prop_assert!(parsed.get("result").is_some() != parsed.get("error").is_some());
        prop_assert_eq!(decode(std::str::from_utf8(&line).unwrap()).unwrap(), WorkerMessage::from(response));
    }
}
