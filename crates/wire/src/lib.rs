// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge wire protocol.
//!
//! Wire format (byte stream): one JSON value per line, newline-terminated.
//! Message ports carry the same envelopes as structured values.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod envelope;
mod error;
mod framer;
mod id;
mod wire;

pub use envelope::{
    decode_request, Notification, Outcome, Rejection, RequestEnvelope, ResponseEnvelope,
    WorkerMessage,
};
pub use error::{
    ErrorDetail, Failure, OriginalCause, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
pub use framer::{Frame, LineFramer, DEFAULT_MAX_FRAME_BYTES};
pub use id::CorrelationId;
pub use wire::{decode, encode, read_message, write_message, ProtocolError};

#[cfg(test)]
mod property_tests;
