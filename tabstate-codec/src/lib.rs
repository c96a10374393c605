//! Durable entry codec for tabstate.
//!
//! Values persisted by the storage layer are wrapped in a [`DurableEntry`]
//! envelope carrying a format version, the write time and an optional expiry,
//! then serialized to a JSON string. The string may additionally be passed
//! through [`obfuscate`], a reversible transform that keeps entries from
//! being readable at a glance.
//!
//! # Obfuscation is not encryption
//!
//! [`obfuscate`] uses a fixed, public key and provides no confidentiality or
//! integrity. Anyone with access to the medium can reverse it. Do not store
//! secrets behind it.

mod envelope;
mod error;
mod obfuscate;

pub use envelope::{DurableEntry, decode, decode_with, encode, encode_with};
pub use error::{CodecError, CodecResult};
pub use obfuscate::{OBFUSCATION_PREFIX, deobfuscate, is_obfuscated, obfuscate, try_deobfuscate};
