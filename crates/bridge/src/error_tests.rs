// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use orb_delegate::{DelegateErrorKind, DriverError};
use orb_wire::ErrorDetail;

use super::*;

#[yare::parameterized(
    unknown_method = { BridgeError::UnknownMethod("bogus".into()), "Unknown method: bogus", -32601 },
    not_connected  = { BridgeError::NotConnected, "Not connected. Call connect first.", -32603 },
    missing_model  = { BridgeError::ModelNotFound("User".into()), "Model \"User\" not found. Define it first.", -32603 },
    missing_source = { BridgeError::SourceModelNotFound("Post".into()), "Source model \"Post\" not found. Define it first.", -32603 },
    usage          = { BridgeError::Usage("Column name is required for max operation".into()), "Column name is required for max operation", -32602 },
)]
fn protocol_errors_project_message_and_code(error: BridgeError, message: &str, code: i64) {
    let detail = ErrorDetail::from_failure(&error);
    assert_eq!(detail.message, message);
    assert_eq!(detail.code, code);
    assert!(detail.original.is_none());
    assert!(detail.sql.is_none());
}

#[test]
fn delegate_errors_keep_cause_and_statement() {
    let error = BridgeError::from(
        DelegateError::new(DelegateErrorKind::UniqueConstraint, "Validation error")
            .with_original(DriverError::new("duplicate key value", "23505"))
            .with_sql("create \"users\" {}"),
    );

    let detail = ErrorDetail::from_failure(&error);
    assert_eq!(detail.name, "UniqueConstraintError");
    assert_eq!(detail.message, "Validation error");
    assert_eq!(detail.code, -32603);
    let original = detail.original.unwrap();
    assert_eq!(original.message, "duplicate key value");
    assert_eq!(original.code.as_deref(), Some("23505"));
    assert_eq!(detail.sql.as_deref(), Some("create \"users\" {}"));
    assert_eq!(
        detail.stack,
        "UniqueConstraintError: Validation error\n    caused by: duplicate key value"
    );
}

#[test]
fn normalizing_twice_is_stable() {
    let once = ErrorDetail::from_failure(&BridgeError::NotConnected);
    assert_eq!(ErrorDetail::from_failure(&once), once);
}
