// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[derive(Debug)]
struct DriverError;

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("duplicate key value")
    }
}

impl StdError for DriverError {}

#[derive(Debug)]
struct ConstraintError {
    cause: DriverError,
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation error")
    }
}

impl StdError for ConstraintError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.cause)
    }
}

impl Failure for ConstraintError {
    fn name(&self) -> &str {
        "UniqueConstraintError"
    }

    fn original(&self) -> Option<OriginalCause> {
        Some(OriginalCause { message: self.cause.to_string(), code: Some("23505".to_string()) })
    }

    fn sql(&self) -> Option<&str> {
        Some("INSERT INTO users")
    }
}

#[derive(Debug)]
struct Silent;

impl fmt::Display for Silent {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl StdError for Silent {}

impl Failure for Silent {
    fn name(&self) -> &str {
        ""
    }
}

#[test]
fn flattens_original_cause_and_sql() {
    let detail = ErrorDetail::from_failure(&ConstraintError { cause: DriverError });

    assert_eq!(detail.name, "UniqueConstraintError");
    assert_eq!(detail.message, "Validation error");
    assert_eq!(detail.code, INTERNAL_ERROR);
    assert_eq!(
        detail.original,
        Some(OriginalCause {
            message: "duplicate key value".to_string(),
            code: Some("23505".to_string())
        })
    );
    assert_eq!(detail.sql.as_deref(), Some("INSERT INTO users"));
    assert_eq!(
        detail.stack,
        "UniqueConstraintError: Validation error\n    caused by: duplicate key value"
    );
}

#[test]
fn empty_fields_fall_back() {
    let detail = ErrorDetail::from_failure(&Silent);

    assert_eq!(detail.name, "Error");
    assert_eq!(detail.message, "Silent");
    assert_eq!(detail.code, INTERNAL_ERROR);
    assert!(detail.original.is_none());
    assert!(detail.sql.is_none());
}

#[test]
fn normalization_is_idempotent() {
    let once = ErrorDetail::from_failure(&ConstraintError { cause: DriverError });
    let twice = ErrorDetail::from_failure(&once);
    assert_eq!(once, twice);

    let parse = ErrorDetail::parse_error("expected value at line 1 column 1");
    assert_eq!(ErrorDetail::from_failure(&parse), parse);
}

#[test]
fn absent_optional_fields_are_not_serialized() {
    let detail = ErrorDetail::internal("boom");
    let json = serde_json::to_value(&detail).unwrap();

    assert_eq!(json["name"], "Error");
    assert_eq!(json["message"], "boom");
    assert_eq!(json["code"], INTERNAL_ERROR);
    assert!(json.get("original").is_none());
    assert!(json.get("sql").is_none());
}

#[test]
fn sparse_error_objects_deserialize_with_defaults() {
    // Shape emitted by older workers for uncaught failures
    let detail: ErrorDetail =
        serde_json::from_str(r#"{"message":"Uncaught exception: boom","stack":"at x"}"#).unwrap();

    assert_eq!(detail.name, "Error");
    assert_eq!(detail.code, INTERNAL_ERROR);
    assert_eq!(detail.message, "Uncaught exception: boom");
}

#[test]
fn std_errors_render_their_source_chain() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let detail = ErrorDetail::from_std(&io);

    assert_eq!(detail.message, "pipe closed");
    assert_eq!(detail.stack, "Error: pipe closed");
}
