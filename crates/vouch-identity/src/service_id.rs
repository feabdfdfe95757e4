//! Service identifiers.
//!
//! Every account is addressed by an ACI (account identity) and may also
//! expose a PNI (phone number identity). Both wrap a UUID; they differ in
//! their string and binary forms:
//!
//! | Kind | String form           | Binary form               |
//! |------|-----------------------|---------------------------|
//! | ACI  | `<uuid>`              | 16 UUID bytes             |
//! | PNI  | `PNI:<uuid>`          | `0x01` + 16 UUID bytes    |
//!
//! The binary form is the stable identifier fed into version 2
//! fingerprints, so it must never change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{IdentityError, Result};

/// String prefix that marks a PNI.
pub const PNI_PREFIX: &str = "PNI:";

/// Binary type byte that marks a PNI.
const PNI_TYPE_BYTE: u8 = 0x01;

/// Identifier of an account on the messaging service.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceId {
    /// Account identity.
    Aci(Uuid),
    /// Phone number identity.
    Pni(Uuid),
}

impl ServiceId {
    /// Parse a service identifier from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidServiceId`] if the input is empty,
    /// is not a UUID, or carries an unknown prefix.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::InvalidServiceId {
                value: value.to_string(),
                reason: "empty".into(),
            });
        }

        let (raw, is_pni) = match trimmed.strip_prefix(PNI_PREFIX) {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let uuid = Uuid::parse_str(raw).map_err(|e| IdentityError::InvalidServiceId {
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        Ok(if is_pni {
            Self::Pni(uuid)
        } else {
            Self::Aci(uuid)
        })
    }

    /// Parse a service identifier from its binary form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidServiceId`] for any length other
    /// than 16 or 17 bytes, or an unknown type byte.
    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            16 => Ok(Self::Aci(Uuid::from_slice(bytes).map_err(|e| {
                IdentityError::InvalidServiceId {
                    value: hex::encode(bytes),
                    reason: e.to_string(),
                }
            })?)),
            17 if bytes[0] == PNI_TYPE_BYTE => {
                Ok(Self::Pni(Uuid::from_slice(&bytes[1..]).map_err(|e| {
                    IdentityError::InvalidServiceId {
                        value: hex::encode(bytes),
                        reason: e.to_string(),
                    }
                })?))
            }
            _ => Err(IdentityError::InvalidServiceId {
                value: hex::encode(bytes),
                reason: format!("unexpected binary length {}", bytes.len()),
            }),
        }
    }

    /// Binary form used as the version 2 fingerprint identifier.
    pub fn to_binary(&self) -> Vec<u8> {
        match self {
            Self::Aci(uuid) => uuid.as_bytes().to_vec(),
            Self::Pni(uuid) => {
                let mut out = Vec::with_capacity(17);
                out.push(PNI_TYPE_BYTE);
                out.extend_from_slice(uuid.as_bytes());
                out
            }
        }
    }

    /// Generate a random ACI.
    pub fn random_aci() -> Self {
        Self::Aci(Uuid::new_v4())
    }

    /// The wrapped UUID.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Aci(uuid) | Self::Pni(uuid) => *uuid,
        }
    }

    /// Check if this is an account identity.
    pub fn is_aci(&self) -> bool {
        matches!(self, Self::Aci(_))
    }

    /// Check if this is a phone number identity.
    pub fn is_pni(&self) -> bool {
        matches!(self, Self::Pni(_))
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aci(uuid) => write!(f, "{}", uuid.hyphenated()),
            Self::Pni(uuid) => write!(f, "{}{}", PNI_PREFIX, uuid.hyphenated()),
        }
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self)
    }
}

impl FromStr for ServiceId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServiceId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.to_string()
    }
}
