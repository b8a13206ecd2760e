//! Serialized forms of an [`Entry`].

use crate::{CodecError, Entry};
use std::fmt;
use std::str::FromStr;

/// Serialization form used by the serialized view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Structured text (JSON). Zero-valued fields are omitted.
    #[default]
    Json,
    /// Compact binary (MessagePack, field-name keyed maps).
    MessagePack,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::MessagePack => f.write_str("msgpack"),
        }
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" => Ok(Format::MessagePack),
            other => Err(CodecError::UnknownFormat(other.to_string())),
        }
    }
}

pub fn to_json(entry: &Entry) -> Result<String, CodecError> {
    Ok(serde_json::to_string(entry)?)
}

pub fn from_json(text: &str) -> Result<Entry, CodecError> {
    Ok(serde_json::from_str(text)?)
}

pub fn to_msgpack(entry: &Entry) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(entry)?)
}

pub fn from_msgpack(data: &[u8]) -> Result<Entry, CodecError> {
    Ok(rmp_serde::from_slice(data)?)
}

/// Encode an entry in the given form.
pub fn encode(entry: &Entry, format: Format) -> Result<Vec<u8>, CodecError> {
    match format {
        Format::Json => Ok(serde_json::to_vec(entry)?),
        Format::MessagePack => to_msgpack(entry),
    }
}

/// Decode an entry from the given form.
pub fn decode(data: &[u8], format: Format) -> Result<Entry, CodecError> {
    match format {
        Format::Json => Ok(serde_json::from_slice(data)?),
        Format::MessagePack => from_msgpack(data),
    }
}
