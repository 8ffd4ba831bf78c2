// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use similar_asserts::assert_eq;

use super::*;

fn hoist(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(hoist_include_options(map)),
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn include_order_moves_to_top_level_with_path() {
    let hoisted = hoist(json!({
        "order": [["name", "ASC"]],
        "include": [{"as": "posts", "order": [["createdAt", "DESC"]]}]
    }));
    assert_eq!(
        hoisted,
        json!({
            "order": [["name", "ASC"], ["posts", "createdAt", "DESC"]],
            "include": [{"as": "posts"}]
        })
    );
}

#[test]
fn single_order_pair_is_one_term() {
    let hoisted = hoist(json!({"include": {"association": "posts", "order": ["title", "desc"]}}));
    assert_eq!(hoisted["order"], json!([["posts", "title", "desc"]]));
    assert_eq!(hoisted["include"], json!({"association": "posts"}));
}

#[test]
fn nested_includes_extend_the_path() {
    let hoisted = hoist(json!({
        "include": [{
            "as": "posts",
            "include": [{"as": "comments", "order": [["id", "ASC"]], "group": "postId"}]
        }]
    }));
    assert_eq!(hoisted["order"], json!([["posts", "comments", "id", "ASC"]]));
    assert_eq!(hoisted["group"], json!([["posts", "comments", "postId"]]));
}

#[test]
fn null_include_order_and_group_are_not_hoisted() {
    let options = json!({
        "order": [["name", "ASC"]],
        "include": [{"as": "posts", "order": null, "group": null}]
    });
    assert_eq!(hoist(options.clone()), options);
}

#[test]
fn separate_includes_keep_their_options() {
    let options = json!({
        "include": [{"as": "posts", "separate": true, "order": [["id", "DESC"]]}]
    });
    assert_eq!(hoist(options.clone()), options);
}

#[test]
fn anonymous_includes_are_left_alone() {
    let options = json!({"include": [{"model": "Post", "order": [["id", "DESC"]]}]});
    assert_eq!(hoist(options.clone()), options);
}

#[test]
fn scalar_top_level_group_is_promoted() {
    let hoisted = hoist(json!({
        "group": "name",
        "include": [{"as": "posts", "group": ["id"]}]
    }));
    assert_eq!(hoisted["group"], json!(["name", ["posts", "id"]]));
}

#[test]
fn prepare_hoists_only_when_enabled() {
    let raw = json!({"include": [{"as": "posts", "order": [["id", "DESC"]]}], "limit": null});
    let plain = prepare(raw.clone(), &BridgeOptions::default()).unwrap();
    assert!(plain.order.is_none());
    assert!(plain.limit.is_none());

    let enabled = BridgeOptions { hoist_include_options: true, ..BridgeOptions::default() };
    let hoisted = prepare(raw, &enabled).unwrap();
    assert_eq!(hoisted.order, Some(json!([["posts", "id", "DESC"]])));
}

#[test]
fn malformed_options_are_invalid_params() {
    let err = prepare(json!({"limit": "ten"}), &BridgeOptions::default()).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidParams(ref m) if m.starts_with("options: ")), "{err}");
}
