//! Authorization tokens used for device search and unlock.
//!
//! A [`Token`] is opaque to the bridge. It is produced from a hex string by
//! a [`crate::sdk::TokenGenerator`]; the bridge only stores, compares and
//! forwards it.

use std::fmt;

/// Opaque authorization token.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Vec<u8>);

impl Token {
    /// Wraps raw token bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decodes a hex string. Returns `None` for empty or malformed input.
    #[must_use]
    pub fn from_hex(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        hex::decode(trimmed).ok().map(Self)
    }

    /// Raw token bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.to_hex())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_hex() {
        let token = Token::from_hex("ab12");
        assert_eq!(token.map(|t| t.as_bytes().to_vec()), Some(vec![0xab, 0x12]));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Token::from_hex("").is_none());
        assert!(Token::from_hex("   ").is_none());
        assert!(Token::from_hex("abc").is_none());
        assert!(Token::from_hex("zz").is_none());
    }

    #[test]
    fn renders_lowercase() {
        let token = Token::from_hex("AB12");
        assert_eq!(token.map(|t| t.to_string()), Some("ab12".to_string()));
    }
}
