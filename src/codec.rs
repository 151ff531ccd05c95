//! Wire shape of one state slot: `{ data, version, deleted? }`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::validate::{self, Validation};

/// Failure to read a state slot as a versioned payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed state payload: {}", .reasons.join("; "))]
pub struct DecodeError {
    pub reasons: Vec<String>,
}

impl DecodeError {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }
}

/// The unit stored in one state slot.
#[derive(Debug, Clone, PartialEq)]
pub struct WirePayload {
    pub data: Value,
    pub version: u64,
    pub deleted: bool,
}

impl WirePayload {
    /// Content object as written to the remote store.
    ///
    /// `deleted` is only emitted when set, so live records carry exactly
    /// `{data, version}`.
    pub fn to_content(&self) -> Value {
        let mut content = Map::new();
        content.insert("data".into(), self.data.clone());
        content.insert("version".into(), Value::from(self.version));
        if self.deleted {
            content.insert("deleted".into(), Value::Bool(true));
        }
        Value::Object(content)
    }
}

pub fn encode(data: Value, version: u64, deleted: bool) -> WirePayload {
    WirePayload {
        data,
        version,
        deleted,
    }
}

/// Validate and split a raw state content object.
pub fn decode(content: &Value) -> Result<WirePayload, DecodeError> {
    let Value::Object(fields) = content else {
        return Err(DecodeError::new(vec![format!(
            "content was not a JSON object: {}",
            content
        )]));
    };

    let data = validate::json_object(fields.get("data"), "data").map(|m| Value::Object(m.clone()));
    let version = validate::non_negative_integer(fields.get("version"), "version");
    let deleted = validate::optional_bool(fields.get("deleted"), "deleted", false);

    match data.zip(version).zip(deleted) {
        Validation::Valid(((data, version), deleted)) => Ok(WirePayload {
            data,
            version,
            deleted,
        }),
        Validation::Invalid(reasons) => Err(DecodeError::new(reasons)),
    }
}

/// Serialize a domain value; it must come out as a JSON object.
pub fn encode_data<T: Serialize>(data: &T) -> Result<Value, DecodeError> {
    let value = serde_json::to_value(data).map_err(|e| DecodeError::new(vec![e.to_string()]))?;
    validate::json_object(Some(&value), "data")
        .into_result()
        .map_err(DecodeError::new)?;
    Ok(value)
}

pub fn decode_data<T: DeserializeOwned>(data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|e| {
        DecodeError::new(vec![format!("data did not match the record type: {}", e)])
    })
}
