//! Transaction classification and call-payload decoding.
//!
//! Pure functions mapping the node's declared transaction type to a semantic
//! kind, and digging the real recipient out of contract-call payloads. A
//! call payload is a base64-encoded UTF-8 JSON object; when its `Function`
//! field is the literal `"transfer"`, the first element of `Args` names the
//! nested recipient. Every decode failure degrades to "no recipient", never
//! to an error.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;

/// Semantic kind of a transaction, derived from the node's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// A plain value transfer (`binary`).
    Transfer,
    /// A contract invocation (`call`).
    Call,
    /// A contract deployment (`deploy`).
    Deploy,
    /// Any other declared type.
    Unknown,
}

impl TxKind {
    /// Parse the node's declared type string.
    pub fn parse(declared: &str) -> Self {
        match declared {
            "binary" => TxKind::Transfer,
            "call" => TxKind::Call,
            "deploy" => TxKind::Deploy,
            _ => TxKind::Unknown,
        }
    }
}

/// The JSON shape of a contract-call payload.
#[derive(Debug, Deserialize)]
struct CallPayload {
    #[serde(rename = "Function")]
    function: String,
    #[serde(rename = "Args", default)]
    args: Vec<serde_json::Value>,
}

/// Extract the nested transfer recipient from a call payload.
///
/// Returns `None` for anything other than a well-formed `transfer` call:
/// malformed base64, invalid UTF-8 or JSON, a different function, or a
/// missing first argument.
pub fn extract_transfer_recipient(data: &str) -> Option<String> {
    let bytes = match STANDARD.decode(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("call payload is not valid base64: {}", e);
            return None;
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("call payload is not valid UTF-8: {}", e);
            return None;
        }
    };
    let payload: CallPayload = match serde_json::from_str(&text) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("call payload is not valid JSON: {}", e);
            return None;
        }
    };

    if payload.function != "transfer" {
        return None;
    }
    payload
        .args
        .first()
        .and_then(|arg| arg.as_str())
        .map(str::to_string)
}

/// Decode a genesis-block payload for storage.
///
/// The genesis block's plain transfers are the one historical case where the
/// payload is stored as decoded text; on any decode failure the raw payload
/// is kept as received.
pub fn decode_genesis_payload(kind: TxKind, data: &str) -> String {
    if data.is_empty() {
        return String::new();
    }
    if kind == TxKind::Transfer {
        if let Ok(bytes) = STANDARD.decode(data) {
            if let Ok(text) = String::from_utf8(bytes) {
                return text;
            }
        }
        debug!("genesis payload is not decodable, keeping raw form");
    }
    data.to_string()
}
