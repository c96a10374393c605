//! Reversible, non-cryptographic obfuscation.
//!
//! The transform XORs the UTF-8 bytes with a fixed repeating mask, encodes
//! the result as base64 and prepends [`OBFUSCATION_PREFIX`]. It only deters
//! casual inspection of the medium.

use crate::error::{CodecError, CodecResult};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Marker prepended to every obfuscated string.
pub const OBFUSCATION_PREFIX: &str = "obf1:";

const MASK: &[u8] = b"tabstate";

fn apply_mask(bytes: &mut [u8]) {
    for (byte, mask) in bytes.iter_mut().zip(MASK.iter().cycle()) {
        *byte ^= mask;
    }
}

/// Obfuscates a string. Always succeeds.
pub fn obfuscate(plain: &str) -> String {
    let mut bytes = plain.as_bytes().to_vec();
    apply_mask(&mut bytes);
    format!("{OBFUSCATION_PREFIX}{}", STANDARD.encode(&bytes))
}

/// Returns true if `input` carries the obfuscation marker.
pub fn is_obfuscated(input: &str) -> bool {
    input.starts_with(OBFUSCATION_PREFIX)
}

/// Reverses [`obfuscate`], reporting why reversal failed.
pub fn try_deobfuscate(input: &str) -> CodecResult<String> {
    let encoded = input
        .strip_prefix(OBFUSCATION_PREFIX)
        .ok_or_else(|| CodecError::Obfuscation("missing obfuscation marker".to_string()))?;

    let mut bytes = STANDARD
        .decode(encoded)
        .map_err(|e| CodecError::Obfuscation(format!("invalid base64: {}", e)))?;
    apply_mask(&mut bytes);

    String::from_utf8(bytes).map_err(|e| CodecError::Obfuscation(format!("invalid UTF-8: {}", e)))
}

/// Reverses [`obfuscate`]. Input that was never obfuscated (or cannot be
/// reversed) is returned unchanged.
pub fn deobfuscate(input: &str) -> String {
    try_deobfuscate(input).unwrap_or_else(|_| input.to_string())
}
