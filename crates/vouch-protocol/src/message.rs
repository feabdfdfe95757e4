//! Introduction wire format.
//!
//! Introductions travel as the body of an ordinary text message:
//!
//! ```text
//! <MARKER><SEPARATOR>[
//!   {
//!     "name": "Bob",
//!     "number": "+14153333333",
//!     "service_ID": "796abedb-ca4e-4f18-8803-1fde5b921f9f",
//!     "identity_key_base64": "BSAhIiMkJSYnKCkqKywtLi8wMTIzNDU2Nzg5Ojs8PT4/",
//!     "safety_number": "51575 21099 ..."
//!   }
//! ]
//! ```
//!
//! A body that does not start with [`MARKER`] is plain text and decodes to
//! `None`. A body that does start with it must carry a non-empty array of
//! well-formed introducees, otherwise decoding fails. Unknown numbers are
//! sent as `"undisclosed"`.

use std::fmt;

use serde::{Deserialize, Serialize};
use vouch_identity::{IdentityKey, ServiceId};

use crate::limits::{
    FINGERPRINT_DIGITS, FINGERPRINT_SEGMENT_DIGITS, MAX_INTRODUCEES, MAX_MESSAGE_BYTES,
    MAX_NAME_CHARS, MAX_NUMBER_CHARS,
};
use crate::{ProtocolError, Result};

/// Marks a message body as an introduction.
pub const MARKER: &str = "QOikEX9PPGIuXfiejT9nC2SsDB8d9AG0dUPQ9gERBQ8qHF30Xj --- This message is part of an experimental feature and not meant to be read by humans --- Introduction Data:\n";

/// Separates the marker from the JSON payload.
pub const SEPARATOR: &str = "\n";

/// Placeholder for a number the introducer did not disclose.
pub const UNDISCLOSED: &str = "undisclosed";

/// A 60-digit safety number as predicted by the introducer.
///
/// Whitespace is ignored on input, so both the grouped display form and
/// the bare digit string are accepted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PredictedFingerprint(String);

impl PredictedFingerprint {
    /// Parse a safety number, ignoring whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] unless exactly 60 ASCII
    /// digits remain.
    pub fn new(value: &str) -> Result<Self> {
        let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != FINGERPRINT_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidField {
                field: "safety_number",
                reason: format!("expected {} digits", FINGERPRINT_DIGITS),
            });
        }
        Ok(Self(digits))
    }

    /// The bare 60 digits.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Digits in space separated groups of five.
    pub fn to_grouped(&self) -> String {
        group_digits(&self.0)
    }
}

/// Format a digit string in space separated groups of five.
pub fn group_digits(digits: &str) -> String {
    digits
        .as_bytes()
        .chunks(FINGERPRINT_SEGMENT_DIGITS)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Debug for PredictedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PredictedFingerprint({}...)", &self.0[..10])
    }
}

impl fmt::Display for PredictedFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_grouped())
    }
}

impl TryFrom<String> for PredictedFingerprint {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<PredictedFingerprint> for String {
    fn from(fp: PredictedFingerprint) -> Self {
        fp.to_grouped()
    }
}

/// One introduced contact, as carried on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroduceePayload {
    /// Display name at introduction time.
    pub name: String,
    /// Phone number, if the introducer disclosed it.
    #[serde(with = "undisclosed")]
    pub number: Option<String>,
    /// The introducee's service id.
    #[serde(rename = "service_ID")]
    pub service_id: ServiceId,
    /// The key the introducer vouches for.
    #[serde(rename = "identity_key_base64")]
    pub identity_key: IdentityKey,
    /// Safety number between the receiver and the introducee, as computed
    /// by the introducer.
    #[serde(rename = "safety_number")]
    pub predicted_fingerprint: PredictedFingerprint,
}

impl IntroduceePayload {
    /// Check field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] for an empty or overlong
    /// name, or an overlong number.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ProtocolError::InvalidField {
                field: "name",
                reason: "empty".into(),
            });
        }
        let name_chars = self.name.chars().count();
        if name_chars > MAX_NAME_CHARS {
            return Err(ProtocolError::InvalidField {
                field: "name",
                reason: format!("{} characters exceeds {}", name_chars, MAX_NAME_CHARS),
            });
        }
        if let Some(number) = &self.number {
            let number_chars = number.chars().count();
            if number_chars > MAX_NUMBER_CHARS {
                return Err(ProtocolError::InvalidField {
                    field: "number",
                    reason: format!("{} characters exceeds {}", number_chars, MAX_NUMBER_CHARS),
                });
            }
        }
        Ok(())
    }
}

/// Check if a message body is an introduction.
pub fn is_introduction(body: &str) -> bool {
    body.trim_start().starts_with(MARKER)
}

/// Encode introducees into a message body.
///
/// # Errors
///
/// Fails for an empty list, too many introducees, an invalid payload, or
/// an encoded body above [`MAX_MESSAGE_BYTES`].
pub fn encode(payloads: &[IntroduceePayload]) -> Result<String> {
    check_count(payloads.len())?;
    for payload in payloads {
        payload.validate()?;
    }

    let json = serde_json::to_string_pretty(payloads)
        .map_err(|e| ProtocolError::Encoding(e.to_string()))?;
    let body = format!("{}{}{}", MARKER, SEPARATOR, json);

    if body.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::TooLarge {
            what: "message",
            actual: body.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    Ok(body)
}

/// Decode a message body.
///
/// Returns `Ok(None)` if the body is not an introduction.
///
/// # Errors
///
/// Fails if the body is an introduction but oversized, not a JSON array
/// of introducees, empty, or contains an invalid introducee.
pub fn decode(body: &str) -> Result<Option<Vec<IntroduceePayload>>> {
    let Some(rest) = body.trim_start().strip_prefix(MARKER) else {
        return Ok(None);
    };

    if body.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::TooLarge {
            what: "message",
            actual: body.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }

    let json = rest.strip_prefix(SEPARATOR).unwrap_or(rest);
    let payloads: Vec<IntroduceePayload> =
        serde_json::from_str(json).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    check_count(payloads.len())?;
    for payload in &payloads {
        payload.validate()?;
    }
    Ok(Some(payloads))
}

fn check_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(ProtocolError::Empty);
    }
    if count > MAX_INTRODUCEES {
        return Err(ProtocolError::TooLarge {
            what: "introducee list",
            actual: count,
            max: MAX_INTRODUCEES,
        });
    }
    Ok(())
}

/// Serde support for numbers sent as `"undisclosed"` when unknown.
mod undisclosed {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::UNDISCLOSED;

    pub fn serialize<S>(number: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(number.as_deref().unwrap_or(UNDISCLOSED))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|n| !n.trim().is_empty() && n != UNDISCLOSED))
    }
}
