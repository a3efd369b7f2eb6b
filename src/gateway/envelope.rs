use serde::Deserialize;
use serde_json::Value;

use super::{GatewayError, ResponseKind};
use crate::consts::SUCCESS_CODE;

const FALLBACK_MESSAGE: &str = "unknown error";

/// The `{code, message, data}` wrapper around every backend payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// What a successful call resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Blob(Vec<u8>),
}

impl Payload {
    pub fn into_json(self) -> Result<Value, GatewayError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::Blob(_) => Err(GatewayError::Decode(
                "expected a JSON payload, got binary".to_string(),
            )),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Blob(bytes) => bytes,
            Self::Json(value) => value.to_string().into_bytes(),
        }
    }
}

fn envelope_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Envelope>(body)
        .ok()
        .and_then(|env| env.message)
        .filter(|m| !m.is_empty())
}

/// Turn a received status and body into the caller's payload or an error.
///
/// Only status 200 with envelope code 200 succeeds for JSON calls; blob
/// calls succeed on status 200 alone.
pub fn classify(status: u16, body: &[u8], expect: ResponseKind) -> Result<Payload, GatewayError> {
    if !(200..300).contains(&status) {
        let message = envelope_message(body).unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or(FALLBACK_MESSAGE)
                .to_string()
        });
        return Err(GatewayError::http_status(status, message));
    }

    if status != 200 {
        return Err(GatewayError::Api {
            code: i64::from(status),
            message: envelope_message(body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        });
    }

    if expect == ResponseKind::Blob {
        return Ok(Payload::Blob(body.to_vec()));
    }

    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

    if envelope.code != SUCCESS_CODE {
        return Err(GatewayError::Api {
            code: envelope.code,
            message: envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        });
    }

    Ok(Payload::Json(envelope.data.unwrap_or(Value::Null)))
}
