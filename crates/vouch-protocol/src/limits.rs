//! Protocol limits.
//!
//! Introductions arrive from other users and are decoded before anything
//! about them is trusted, so every size is bounded up front.

/// Maximum size of an introduction message body in bytes (256 KiB).
pub const MAX_MESSAGE_BYTES: usize = 256 * 1024;

/// Maximum number of introducees in one message.
pub const MAX_INTRODUCEES: usize = 64;

/// Maximum introducee name length in characters.
pub const MAX_NAME_CHARS: usize = 256;

/// Maximum phone number length in characters.
pub const MAX_NUMBER_CHARS: usize = 64;

/// Digits in a safety number.
pub const FINGERPRINT_DIGITS: usize = 60;

/// Digits per displayed safety number segment.
pub const FINGERPRINT_SEGMENT_DIGITS: usize = 5;
