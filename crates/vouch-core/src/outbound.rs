//! Outbound introductions.
//!
//! An introduction tells `recipient` about one or more contacts. For each
//! contact the sender predicts the safety number the recipient will see
//! with that contact, so the recipient can check the vouched key later.
//! The service checks unlock status before calling into this module; see
//! [`IntroductionService::prepare_introduction`].
//!
//! [`IntroductionService::prepare_introduction`]: crate::IntroductionService::prepare_introduction

use serde::{Deserialize, Serialize};
use vouch_identity::{IdentityKey, ServiceId};
use vouch_protocol::{message, IntroduceePayload};

use crate::error::Result;
use crate::safety::SafetyNumber;

/// A contact to introduce, as the sender knows them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundContact {
    /// The contact.
    pub service_id: ServiceId,
    /// Display name to send.
    pub name: String,
    /// Phone number to send, if disclosed.
    pub number: Option<String>,
}

/// A prepared introduction, ready to encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundIntroduction {
    /// Who receives the introduction.
    pub recipient: ServiceId,
    /// One payload per introduced contact.
    pub payloads: Vec<IntroduceePayload>,
}

impl OutboundIntroduction {
    /// Encode as a message body.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the payloads exceed the wire limits.
    pub fn encode(&self) -> Result<String> {
        Ok(message::encode(&self.payloads)?)
    }
}

/// Build the payload introducing `contact` to `recipient`.
///
/// # Errors
///
/// Returns a protocol error if the contact's fields exceed the wire limits.
pub fn introduce(
    recipient: ServiceId,
    recipient_key: IdentityKey,
    contact: &OutboundContact,
    contact_key: IdentityKey,
) -> Result<IntroduceePayload> {
    let predicted =
        SafetyNumber::for_services(recipient, recipient_key, contact.service_id, contact_key)
            .to_predicted()?;

    let payload = IntroduceePayload {
        name: contact.name.clone(),
        number: contact.number.clone(),
        service_id: contact.service_id,
        identity_key: contact_key,
        predicted_fingerprint: predicted,
    };
    payload.validate()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    fn contact(name: &str) -> OutboundContact {
        OutboundContact {
            service_id: ServiceId::random_aci(),
            name: name.into(),
            number: None,
        }
    }

    #[test]
    fn test_prediction_matches_recipient_view() {
        let recipient = ServiceId::random_aci();
        let recipient_key = IdentityKey::from_public_bytes([1; 32]);
        let carol = contact("Carol");
        let carol_key = IdentityKey::from_public_bytes([2; 32]);

        let payload = introduce(recipient, recipient_key, &carol, carol_key).unwrap();

        // The recipient computes with itself as the local party.
        let seen = SafetyNumber::for_services(recipient, recipient_key, carol.service_id, carol_key);
        assert!(seen.matches(&payload.predicted_fingerprint));
        // So does Carol, computing from the other side.
        let carol_sees =
            SafetyNumber::for_services(carol.service_id, carol_key, recipient, recipient_key);
        assert!(carol_sees.matches(&payload.predicted_fingerprint));
    }

    #[test]
    fn test_encode_decodes() {
        let recipient = ServiceId::random_aci();
        let key = IdentityKey::from_public_bytes([1; 32]);
        let payloads = vec![
            introduce(recipient, key, &contact("Carol"), IdentityKey::from_public_bytes([2; 32]))
                .unwrap(),
        ];
        let outbound = OutboundIntroduction {
            recipient,
            payloads: payloads.clone(),
        };

        let body = outbound.encode().unwrap();
        assert_eq!(message::decode(&body).unwrap(), Some(payloads));
    }

    #[test]
    fn test_rejects_invalid_contact() {
        let mut nameless = contact("Carol");
        nameless.name = " ".into();
        let key = IdentityKey::from_public_bytes([1; 32]);

        assert!(matches!(
            introduce(ServiceId::random_aci(), key, &nameless, key),
            Err(CoreError::Protocol(_))
        ));
    }
}
