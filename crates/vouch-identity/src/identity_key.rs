//! Serialized identity keys.
//!
//! An identity key is a 32-byte Curve25519 public key prefixed with the
//! DJB type byte, giving a 33-byte serialized form. That serialized form is
//! what fingerprints hash and what the wire format carries as base64.
//!
//! Base64 output is unpadded. Input is accepted with or without padding.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{IdentityError, Result};

/// Type byte prefixed to Curve25519 public keys.
pub const DJB_KEY_TYPE: u8 = 0x05;

/// Length of a raw public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of a serialized identity key in bytes.
pub const IDENTITY_KEY_LEN: usize = PUBLIC_KEY_LEN + 1;

/// A serialized identity public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey([u8; IDENTITY_KEY_LEN]);

impl IdentityKey {
    /// Wrap a raw 32-byte public key.
    pub fn from_public_bytes(public: [u8; PUBLIC_KEY_LEN]) -> Self {
        let mut bytes = [0u8; IDENTITY_KEY_LEN];
        bytes[0] = DJB_KEY_TYPE;
        bytes[1..].copy_from_slice(&public);
        Self(bytes)
    }

    /// Parse a serialized identity key.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not 33 bytes or the type byte is
    /// not [`DJB_KEY_TYPE`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != IDENTITY_KEY_LEN {
            return Err(IdentityError::InvalidKeyLength {
                expected: IDENTITY_KEY_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0] != DJB_KEY_TYPE {
            return Err(IdentityError::InvalidIdentityKey(format!(
                "unsupported key type 0x{:02x}",
                bytes[0]
            )));
        }
        let mut arr = [0u8; IDENTITY_KEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Parse a base64 encoded identity key, padded or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid base64 or does not decode
    /// to a valid serialized key.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        let decoded = if encoded.ends_with('=') {
            STANDARD.decode(encoded)
        } else {
            STANDARD_NO_PAD.decode(encoded)
        }
        .map_err(|e| IdentityError::InvalidIdentityKey(e.to_string()))?;
        Self::from_bytes(&decoded)
    }

    /// Unpadded base64 of the serialized key.
    pub fn to_base64(&self) -> String {
        STANDARD_NO_PAD.encode(self.0)
    }

    /// The 33-byte serialized key.
    pub fn serialize(&self) -> &[u8; IDENTITY_KEY_LEN] {
        &self.0
    }

    /// The raw public key without its type byte.
    pub fn public_key_bytes(&self) -> &[u8] {
        &self.0[1..]
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({}...)", &self.to_base64()[..8])
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for IdentityKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base64(s)
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_base64(&value)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.to_base64()
    }
}

impl AsRef<[u8]> for IdentityKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
