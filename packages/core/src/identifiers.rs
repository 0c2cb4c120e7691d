//! Client type and client identifier types.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// The tag naming one registered client type implementation, e.g.
/// `solomachine` or `wasm`. Lowercase alphanumerics and dashes only.
#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
#[serde(transparent)]
pub struct ClientType(String);

impl ClientType {
    /// Creates a client type after validating its character set.
    ///
    /// # Errors
    /// Returns [`ClientError::MalformedClientId`] if the tag is empty, starts
    /// or ends with a dash, or contains anything outside `[a-z0-9-]`.
    pub fn new(tag: impl Into<String>) -> Result<Self, ClientError> {
        let tag = tag.into();
        let valid = !tag.is_empty()
            && !tag.starts_with('-')
            && !tag.ends_with('-')
            && tag
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if valid {
            Ok(Self(tag))
        } else {
            Err(ClientError::MalformedClientId(format!(
                "invalid client type tag: {tag:?}"
            )))
        }
    }

    /// The tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClientType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A client identifier of the form `{client_type}-{sequence}`.
///
/// Immutable once created; doubles as the client's store namespace prefix.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Debug)]
pub struct ClientId {
    client_type: ClientType,
    sequence: u64,
}

impl ClientId {
    /// Forms an identifier from a client type and its allocated sequence.
    #[must_use]
    pub const fn new(client_type: ClientType, sequence: u64) -> Self {
        Self {
            client_type,
            sequence,
        }
    }

    /// The type tag encoded in the identifier.
    #[must_use]
    pub const fn client_type(&self) -> &ClientType {
        &self.client_type
    }

    /// The allocation sequence encoded in the identifier.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.client_type, self.sequence)
    }
}

impl FromStr for ClientId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (client_type, sequence) = s
            .rsplit_once('-')
            .ok_or_else(|| ClientError::MalformedClientId(s.to_string()))?;
        let sequence = sequence
            .parse()
            .map_err(|_| ClientError::MalformedClientId(s.to_string()))?;
        Ok(Self {
            client_type: ClientType::new(client_type)?,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ClientId, ClientType};

    #[test]
    fn test_parse_roundtrip() {
        let id: ClientId = "solomachine-7".parse().unwrap();
        assert_eq!("solomachine", id.client_type().as_str());
        assert_eq!(7, id.sequence());
        assert_eq!("solomachine-7", id.to_string());
    }

    #[rstest]
    #[case("")]
    #[case("solomachine")]
    #[case("-3")]
    #[case("solomachine-")]
    #[case("solomachine-x")]
    #[case("Solo-1")]
    #[case("solo machine-1")]
    fn test_rejects_malformed_identifiers(#[case] raw: &str) {
        raw.parse::<ClientId>().unwrap_err();
    }

    #[test]
    fn test_type_tag_with_inner_dashes() {
        let id: ClientId = "some-wasm-client-12".parse().unwrap();
        assert_eq!("some-wasm-client", id.client_type().as_str());
        assert_eq!(12, id.sequence());
    }

    #[test]
    fn test_rejects_invalid_type_tags() {
        ClientType::new("UPPER").unwrap_err();
        ClientType::new("trailing-").unwrap_err();
        ClientType::new("").unwrap_err();
    }
}
