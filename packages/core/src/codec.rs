//! Tagged JSON envelopes for persisted client records.
//!
//! Every client state and consensus state record is stored as a JSON object
//! carrying a `"type"` field naming the client type it belongs to. Decoding
//! a record as the wrong concrete type is a hard [`CodecError::TypeMismatch`],
//! never a silent coercion.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors raised while encoding or decoding tagged records.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The record's type tag does not name the expected client type.
    #[error("record type mismatch, expected: {expected}, got: {actual}")]
    TypeMismatch {
        /// The client type the caller expected to decode.
        expected: String,
        /// The tag found in the record.
        actual: String,
    },

    /// The record is not a JSON object of the requested shape.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Encodes a record under the given type tag.
///
/// # Errors
/// Returns [`CodecError::Malformed`] if the value does not serialize to a
/// JSON object (the tag has nowhere to live otherwise).
pub fn encode_tagged<T: Serialize>(tag: &str, value: &T) -> Result<Vec<u8>, CodecError> {
    let mut json =
        serde_json::to_value(value).map_err(|err| CodecError::Malformed(err.to_string()))?;
    let Some(object) = json.as_object_mut() else {
        return Err(CodecError::Malformed(
            "tagged records must serialize to JSON objects".to_string(),
        ));
    };
    object.insert(
        "type".to_string(),
        serde_json::Value::String(tag.to_string()),
    );
    serde_json::to_vec(&json).map_err(|err| CodecError::Malformed(err.to_string()))
}

/// Decodes a record, requiring its type tag to equal `expected_tag`.
///
/// # Errors
/// Returns [`CodecError::TypeMismatch`] if the tag names another type, and
/// [`CodecError::Malformed`] if the payload is not a tagged object or the
/// remaining fields fail to decode as `T`.
pub fn decode_tagged<T: DeserializeOwned>(
    expected_tag: &str,
    bz: &[u8],
) -> Result<T, CodecError> {
    let mut json: serde_json::Value =
        serde_json::from_slice(bz).map_err(|err| CodecError::Malformed(err.to_string()))?;
    let Some(object) = json.as_object_mut() else {
        return Err(CodecError::Malformed(
            "tagged records must be JSON objects".to_string(),
        ));
    };
    let actual = object
        .remove("type")
        .and_then(|tag| tag.as_str().map(ToString::to_string))
        .ok_or_else(|| CodecError::Malformed("record is missing its type tag".to_string()))?;
    if actual != expected_tag {
        return Err(CodecError::TypeMismatch {
            expected: expected_tag.to_string(),
            actual,
        });
    }
    serde_json::from_value(json).map_err(|err| CodecError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::{decode_tagged, encode_tagged, CodecError};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct State {
        sequence: u64,
    }

    #[test]
    fn test_roundtrip() {
        let bz = encode_tagged("solomachine", &State { sequence: 3 }).unwrap();
        let decoded: State = decode_tagged("solomachine", &bz).unwrap();
        assert_eq!(State { sequence: 3 }, decoded);
    }

    #[test]
    fn test_wrong_tag_is_type_mismatch() {
        let bz = encode_tagged("wasm", &State { sequence: 3 }).unwrap();
        let err = decode_tagged::<State>("solomachine", &bz).unwrap_err();
        assert_eq!(
            CodecError::TypeMismatch {
                expected: "solomachine".to_string(),
                actual: "wasm".to_string(),
            },
            err
        );
    }

    #[test]
    fn test_missing_tag_is_malformed() {
        let err = decode_tagged::<State>("solomachine", br#"{"sequence":3}"#).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = decode_tagged::<State>("solomachine", b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }
}
