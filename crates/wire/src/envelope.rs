// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request, response and notification envelopes.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorDetail, INVALID_REQUEST};
use crate::id::CorrelationId;

/// Request from the driving process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub id: CorrelationId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(id: impl Into<CorrelationId>, method: impl Into<String>) -> Self {
        Self { id: id.into(), method: method.into(), params: None }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Either the value an operation produced or why it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(ErrorDetail),
}

/// Response to exactly one request.
///
/// On the wire this is `{"id":..,"result":..}` or `{"id":..,"error":..}`;
/// never both, never neither.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub id: CorrelationId,
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    pub fn success(id: CorrelationId, result: Value) -> Self {
        Self { id, outcome: Outcome::Result(result) }
    }

    pub fn failure(id: CorrelationId, error: ErrorDetail) -> Self {
        Self { id, outcome: Outcome::Error(error) }
    }

    /// Unsolicited readiness signal, sent once before any request is read.
    pub fn ready() -> Self {
        Self::success(CorrelationId::ready(), serde_json::json!({ "ready": true }))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("id", &self.id)?;
        match &self.outcome {
            Outcome::Result(value) => map.serialize_entry("result", value)?,
            Outcome::Error(error) => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResponseEnvelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        response_from_map(map).map_err(de::Error::custom)
    }
}

fn response_from_map(mut map: Map<String, Value>) -> Result<ResponseEnvelope, String> {
    let id = match map.remove("id") {
        Some(id) => CorrelationId::deserialize(id).map_err(|e| format!("invalid id: {e}"))?,
        None => CorrelationId::Null,
    };
    let outcome = match (map.remove("result"), map.remove("error")) {
        (Some(result), None) => Outcome::Result(result),
        (None, Some(error)) => Outcome::Error(
            ErrorDetail::deserialize(error).map_err(|e| format!("invalid error: {e}"))?,
        ),
        (Some(_), Some(_)) => return Err("response carries both result and error".to_string()),
        (None, None) => return Err("response carries neither result nor error".to_string()),
    };
    Ok(ResponseEnvelope { id, outcome })
}

/// Fire-and-forget message with no correlation id.
///
/// Serialized flat: `{"notification":"sql_log","sql":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub notification: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Notification {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { notification: kind.into(), payload: Map::new() }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Log line for the driving process.
    pub fn log(level: &str, message: impl Into<String>) -> Self {
        Self::new("log").with("level", level).with("message", message.into())
    }

    /// Statement issued by the delegate.
    pub fn sql_log(sql: impl Into<String>) -> Self {
        Self::new("sql_log").with("sql", sql.into())
    }
}

/// Anything the worker writes to the driving process.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Response(ResponseEnvelope),
    Notification(Notification),
}

impl WorkerMessage {
    /// Correlation id, if this is a response.
    pub fn id(&self) -> Option<&CorrelationId> {
        match self {
            Self::Response(response) => Some(&response.id),
            Self::Notification(_) => None,
        }
    }

    pub fn into_response(self) -> Option<ResponseEnvelope> {
        match self {
            Self::Response(response) => Some(response),
            Self::Notification(_) => None,
        }
    }
}

impl From<ResponseEnvelope> for WorkerMessage {
    fn from(response: ResponseEnvelope) -> Self {
        Self::Response(response)
    }
}

impl From<Notification> for WorkerMessage {
    fn from(notification: Notification) -> Self {
        Self::Notification(notification)
    }
}

impl Serialize for WorkerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Response(response) => response.serialize(serializer),
            Self::Notification(notification) => notification.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for WorkerMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        if map.contains_key("notification") {
            Notification::deserialize(Value::Object(map))
                .map(Self::Notification)
                .map_err(de::Error::custom)
        } else {
            response_from_map(map).map(Self::Response).map_err(de::Error::custom)
        }
    }
}

/// A value that parsed as JSON but could not be accepted as a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Best-effort id salvaged from the value, null when unavailable.
    pub id: CorrelationId,
    pub error: ErrorDetail,
}

impl Rejection {
    pub fn into_response(self) -> ResponseEnvelope {
        ResponseEnvelope::failure(self.id, self.error)
    }
}

/// Decode one framed JSON value into a request envelope.
pub fn decode_request(value: Value) -> Result<RequestEnvelope, Rejection> {
    let id = value
        .get("id")
        .cloned()
        .and_then(|id| CorrelationId::deserialize(id).ok())
        .unwrap_or_default();
    RequestEnvelope::deserialize(value).map_err(|e| Rejection {
        id,
        error: ErrorDetail::new(INVALID_REQUEST, format!("Invalid request: {e}"))
            .with_name("InvalidRequest"),
    })
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
