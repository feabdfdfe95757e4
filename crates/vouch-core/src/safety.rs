//! Safety numbers for identity verification.
//!
//! A safety number is the pair of per-party fingerprints two users compare
//! out-of-band to confirm they hold each other's real identity keys. The
//! derivation matches the widely deployed numeric fingerprint scheme, so an
//! introducer and an introducee's client compute the same digits.
//!
//! # Derivation
//!
//! For each party:
//!
//! 1. Start from `0x0000 || identity_key || stable_identifier`
//! 2. Hash with SHA-512 together with the identity key, 5200 times
//! 3. Read six 5-byte big-endian chunks, each reduced modulo 100000
//!
//! That yields 30 digits per party. The displayable number puts the
//! smaller of the two digit strings first, so both sides see the same 60
//! digits. The value itself is not symmetric: it remembers which party
//! is local, and so does the scannable form.
//!
//! # Identifier Versions
//!
//! - **Version 1**: the stable identifier is the phone number text
//! - **Version 2**: the stable identifier is the binary service id
//!
//! # Example
//!
//! ```
//! use vouch_core::safety::{FingerprintParty, SafetyNumber};
//! use vouch_identity::{IdentityKey, ServiceId};
//!
//! let alice = FingerprintParty::service(ServiceId::random_aci(), IdentityKey::from_public_bytes([1; 32]));
//! let bob = FingerprintParty::service(ServiceId::random_aci(), IdentityKey::from_public_bytes([2; 32]));
//!
//! let alice_sees = SafetyNumber::compute(&alice, &bob).unwrap();
//! let bob_sees = SafetyNumber::compute(&bob, &alice).unwrap();
//!
//! // Same digits on both sides
//! assert_eq!(alice_sees.display_digits(), bob_sees.display_digits());
//! println!("Verify: {}", alice_sees);
//! ```

use std::fmt;

use sha2::{Digest, Sha512};
use vouch_identity::{IdentityKey, ServiceId};
use vouch_protocol::PredictedFingerprint;

use crate::error::{CoreError, Result};

/// Hash iterations per party.
pub const ITERATIONS: usize = 5200;

/// Digits contributed by each party.
pub const PARTY_DIGITS: usize = 30;

/// Prefix of every per-party hash input.
const HASH_VERSION: [u8; 2] = [0x00, 0x00];

/// Version byte of the scannable form.
const SCANNABLE_VERSION: u8 = 0x00;

/// Bytes of each party's hash carried in the scannable form.
const SCANNABLE_HASH_LEN: usize = 32;

/// Stable identifier bound into a party's fingerprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StableIdentifier {
    /// Version 1: phone number.
    PhoneNumber(String),
    /// Version 2: service id.
    Service(ServiceId),
}

impl StableIdentifier {
    /// Identifier version.
    pub fn version(&self) -> u8 {
        match self {
            Self::PhoneNumber(_) => 1,
            Self::Service(_) => 2,
        }
    }

    /// Bytes fed into the hash.
    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::PhoneNumber(number) => number.as_bytes().to_vec(),
            Self::Service(id) => id.to_binary(),
        }
    }
}

/// One side of a safety number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FingerprintParty {
    /// Who.
    pub identifier: StableIdentifier,
    /// Their identity key.
    pub identity_key: IdentityKey,
}

impl FingerprintParty {
    /// Version 2 party.
    pub fn service(id: ServiceId, identity_key: IdentityKey) -> Self {
        Self {
            identifier: StableIdentifier::Service(id),
            identity_key,
        }
    }

    /// Version 1 party.
    pub fn phone_number(number: impl Into<String>, identity_key: IdentityKey) -> Self {
        Self {
            identifier: StableIdentifier::PhoneNumber(number.into()),
            identity_key,
        }
    }

    fn iterated_hash(&self) -> [u8; 64] {
        let key = self.identity_key.serialize();

        let mut hasher = Sha512::new();
        hasher.update(HASH_VERSION);
        hasher.update(key);
        hasher.update(self.identifier.to_bytes());
        hasher.update(key);
        let mut hash = hasher.finalize_reset();

        for _ in 1..ITERATIONS {
            hasher.update(hash);
            hasher.update(key);
            hash = hasher.finalize_reset();
        }

        let mut out = [0u8; 64];
        out.copy_from_slice(&hash);
        out
    }
}

/// A safety number between a local and a remote party.
///
/// Equality is order-sensitive: computing with the roles swapped gives the
/// same [`display_digits`](SafetyNumber::display_digits) but a different
/// value.
#[derive(Clone, PartialEq, Eq)]
pub struct SafetyNumber {
    version: u8,
    local_digits: String,
    remote_digits: String,
    local_hash: [u8; SCANNABLE_HASH_LEN],
    remote_hash: [u8; SCANNABLE_HASH_LEN],
}

impl SafetyNumber {
    /// Compute the safety number between `local` and `remote`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FingerprintVersionMismatch`] if the parties use
    /// identifiers of different versions.
    pub fn compute(local: &FingerprintParty, remote: &FingerprintParty) -> Result<Self> {
        let version = local.identifier.version();
        if version != remote.identifier.version() {
            return Err(CoreError::FingerprintVersionMismatch {
                local: version,
                remote: remote.identifier.version(),
            });
        }

        let local_full = local.iterated_hash();
        let remote_full = remote.iterated_hash();

        Ok(Self {
            version,
            local_digits: encode_digits(&local_full),
            remote_digits: encode_digits(&remote_full),
            local_hash: truncate(&local_full),
            remote_hash: truncate(&remote_full),
        })
    }

    /// Version 2 safety number between two service ids.
    pub fn for_services(
        local: ServiceId,
        local_key: IdentityKey,
        remote: ServiceId,
        remote_key: IdentityKey,
    ) -> Self {
        let local_full = FingerprintParty::service(local, local_key).iterated_hash();
        let remote_full = FingerprintParty::service(remote, remote_key).iterated_hash();

        Self {
            version: 2,
            local_digits: encode_digits(&local_full),
            remote_digits: encode_digits(&remote_full),
            local_hash: truncate(&local_full),
            remote_hash: truncate(&remote_full),
        }
    }

    /// Identifier version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The local party's 30 digits.
    pub fn local_digits(&self) -> &str {
        &self.local_digits
    }

    /// The remote party's 30 digits.
    pub fn remote_digits(&self) -> &str {
        &self.remote_digits
    }

    /// The 60 displayed digits, smaller half first.
    pub fn display_digits(&self) -> String {
        if self.local_digits <= self.remote_digits {
            format!("{}{}", self.local_digits, self.remote_digits)
        } else {
            format!("{}{}", self.remote_digits, self.local_digits)
        }
    }

    /// The displayed digits as 12 groups of 5.
    pub fn to_numeric_string(&self) -> String {
        vouch_protocol::message::group_digits(&self.display_digits())
    }

    /// Hex payload for QR codes: version bytes, then the local and remote
    /// hash prefixes.
    pub fn to_qr_string(&self) -> String {
        let mut bytes = Vec::with_capacity(2 + 2 * SCANNABLE_HASH_LEN);
        bytes.push(SCANNABLE_VERSION);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.local_hash);
        bytes.extend_from_slice(&self.remote_hash);
        hex::encode(bytes)
    }

    /// Check the displayed digits against an introducer's prediction.
    pub fn matches(&self, predicted: &PredictedFingerprint) -> bool {
        self.display_digits() == predicted.digits()
    }

    /// The displayed digits as a predicted fingerprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the digits fail validation.
    pub fn to_predicted(&self) -> Result<PredictedFingerprint> {
        Ok(PredictedFingerprint::new(&self.display_digits())?)
    }
}

impl fmt::Debug for SafetyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.display_digits();
        write!(f, "SafetyNumber(v{}, {}...)", self.version, &digits[..10])
    }
}

impl fmt::Display for SafetyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_numeric_string())
    }
}

fn encode_digits(hash: &[u8; 64]) -> String {
    let mut out = String::with_capacity(PARTY_DIGITS);
    for chunk in hash.chunks_exact(5).take(PARTY_DIGITS / 5) {
        let value = chunk
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        out.push_str(&format!("{:05}", value % 100_000));
    }
    out
}

fn truncate(hash: &[u8; 64]) -> [u8; SCANNABLE_HASH_LEN] {
    let mut out = [0u8; SCANNABLE_HASH_LEN];
    out.copy_from_slice(&hash[..SCANNABLE_HASH_LEN]);
    out
}
