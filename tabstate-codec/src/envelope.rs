//! The versioned envelope written for every storage key.

use crate::error::{CodecError, CodecResult};
use crate::obfuscate::{obfuscate, try_deobfuscate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tabstate_types::Timestamp;

/// A value plus the metadata needed to read it back later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DurableEntry {
    /// The stored value.
    pub value: Value,
    /// Envelope format version.
    pub version: u32,
    /// When the entry was written.
    pub timestamp: Timestamp,
    /// When the entry stops being readable, if ever.
    #[serde(default)]
    pub expires: Option<Timestamp>,
}

impl DurableEntry {
    /// Current envelope format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Wraps `value` as written at `now`, expiring after `expires_in` if given.
    #[must_use]
    pub fn new(value: Value, now: Timestamp, expires_in: Option<Duration>) -> Self {
        Self {
            value,
            version: Self::CURRENT_VERSION,
            timestamp: now,
            expires: expires_in.map(|d| now.saturating_add(d)),
        }
    }

    /// Returns true once `now` has moved past the expiry time.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires.is_some_and(|expires| expires.is_before(&now))
    }
}

/// Serializes an entry to its JSON string form.
pub fn encode(entry: &DurableEntry) -> CodecResult<String> {
    Ok(serde_json::to_string(entry)?)
}

/// Serializes an entry, obfuscating the result when asked to.
pub fn encode_with(entry: &DurableEntry, obfuscated: bool) -> CodecResult<String> {
    let json = encode(entry)?;
    Ok(if obfuscated { obfuscate(&json) } else { json })
}

/// Parses an entry, rejecting envelopes from a newer format version.
pub fn decode(raw: &str) -> CodecResult<DurableEntry> {
    let entry: DurableEntry = serde_json::from_str(raw)?;
    if entry.version > DurableEntry::CURRENT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: entry.version,
            supported: DurableEntry::CURRENT_VERSION,
        });
    }
    Ok(entry)
}

/// Parses an entry that may have been obfuscated.
///
/// When `obfuscated` is set and the input carries the marker, it is reversed
/// first. Input without the marker is parsed as-is, so a plain entry read
/// with the flag still decodes.
pub fn decode_with(raw: &str, obfuscated: bool) -> CodecResult<DurableEntry> {
    if obfuscated && crate::obfuscate::is_obfuscated(raw) {
        return decode(&try_deobfuscate(raw)?);
    }
    decode(raw)
}
