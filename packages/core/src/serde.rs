//! This module provides custom serde implementations.

/// Serialize a byte vector as a lowercase hex string.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Implements the serde `serialize` function for bytes as hex.
    ///
    /// # Errors
    /// Returns an error if the serializer rejects the string.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Implements the serde `deserialize` function for hex-encoded bytes.
    ///
    /// # Errors
    /// Returns an error if the string is not valid hex.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Record {
        #[serde(with = "super::hex_bytes")]
        payload: Vec<u8>,
    }

    #[test]
    fn test_hex_roundtrip() {
        let record = Record {
            payload: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let encoded = serde_json::to_string(&record).unwrap();
        assert_eq!(r#"{"payload":"deadbeef"}"#, encoded);
        assert_eq!(record, serde_json::from_str(&encoded).unwrap());
    }

    #[test]
    fn test_rejects_non_hex() {
        serde_json::from_str::<Record>(r#"{"payload":"zz"}"#).unwrap_err();
    }
}
