//! Client identifiers assigned by the relay at connect time.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alphabet for generated identifiers: lowercase base36.
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a generated identifier in characters.
const ID_LEN: usize = 7;

/// Short random identifier naming a connected client for the duration of its
/// connection.
///
/// Identifiers are unique among simultaneously connected clients in practice
/// (7 base36 characters give ~78 billion values; collisions are not checked)
/// and may be reused across the relay's lifetime after a client disconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_expected_length() {
        let id = ClientId::generate();
        assert_eq!(id.as_str().len(), 7);
    }

    #[test]
    fn generated_id_stays_in_alphabet() {
        for _ in 0..100 {
            let id = ClientId::generate();
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()),
                "unexpected character in {id}"
            );
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ClientId::from("a1b2c3d");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a1b2c3d\"");
    }

    #[test]
    fn display_matches_inner() {
        let id = ClientId::from("xyz1234");
        assert_eq!(id.to_string(), "xyz1234");
    }
}
