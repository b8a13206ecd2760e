//! recordbase-common: the in-memory entry model.
//!
//! An [`Entry`] is one record in the store, identified by `tenant` and
//! `primary_key`. Attributes, columns and files are keyed maps here even
//! though the wire carries them as repeated name/value pairs; the
//! translation lives in `recordbase-client::convert`.
//!
//! [`format`] renders the model as JSON (structured text) or MessagePack
//! (compact binary) for callers crossing a process or language boundary.

pub mod format;

mod bytes;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use format::Format;

// ---------------------------------------------------------------------------
// FileInfo
// ---------------------------------------------------------------------------

/// One file association on an entry.
///
/// `name` duplicates the map key so a `FileInfo` is self-describing when
/// serialized on its own. `data` is empty unless the caller asked for file
/// contents; `size` is authoritative either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(with = "bytes::blob", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,

    #[serde(skip_serializing_if = "is_zero_i32")]
    pub size: i32,

    #[serde(skip_serializing_if = "is_zero")]
    pub created_at: i64,

    #[serde(skip_serializing_if = "is_zero")]
    pub updated_at: i64,

    #[serde(skip_serializing_if = "is_zero")]
    pub deleted_at: i64,
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A single record.
///
/// A lookup of a missing key yields `Entry::default()`: absence and
/// emptiness are not distinguished at this layer. Zero-valued fields are
/// omitted from the serialized forms and decode back to the same zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tenant: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub primary_key: String,

    /// Set by the store; ignored on writes.
    #[serde(skip_serializing_if = "is_zero")]
    pub version: i64,

    #[serde(skip_serializing_if = "is_zero")]
    pub created_at: i64,

    #[serde(skip_serializing_if = "is_zero")]
    pub updated_at: i64,

    /// Non-zero marks a tombstone.
    #[serde(skip_serializing_if = "is_zero")]
    pub deleted_at: i64,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Caller-significant order.
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(with = "bytes::blob_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, Vec<u8>>,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileInfo>,
}

impl Entry {
    /// Create an empty entry with the given identity.
    pub fn new(tenant: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            primary_key: primary_key.into(),
            ..Self::default()
        }
    }

    /// Set a string attribute, replacing any previous value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set a binary column, replacing any previous value.
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns `true` for the zero-valued entry (what a not-found lookup yields).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if the store has tombstoned this entry.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at != 0
    }

    /// Check that the entry can be submitted as a write.
    pub fn check_identity(&self) -> Result<(), CodecError> {
        if self.tenant.is_empty() {
            return Err(CodecError::MissingIdentity("tenant"));
        }
        if self.primary_key.is_empty() {
            return Err(CodecError::MissingIdentity("primary_key"));
        }
        Ok(())
    }
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

/// Read an explicit `null` as the empty collection.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("entry is missing {0}")]
    MissingIdentity(&'static str),

    #[error("malformed JSON entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode MessagePack entry: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("malformed MessagePack entry: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("unknown serialization format: {0}")]
    UnknownFormat(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
