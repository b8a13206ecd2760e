//! Adapter views over [`Instance`] for callers that do not want the
//! structured [`Entry`](recordbase_common::Entry).
//!
//! The map view renders the canonical entry as a JSON object, so a missing
//! record shows up as an empty map. The serialized view takes and returns
//! entries as JSON text or MessagePack bytes; incoming payloads are decoded
//! before any network call.

use crate::error::{ClientError, Result};
use crate::Instance;
use recordbase_common::format::{self, Format};
use recordbase_common::CodecError;
use serde_json::{Map, Value};

impl Instance {
    /// Get an entry as a generic map. Zero-valued fields are omitted.
    pub async fn get_map(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        timeout_ms: i64,
    ) -> Result<Map<String, Value>> {
        let entry = self
            .get(tenant, primary_key, include_file_contents, timeout_ms)
            .await?;
        to_map(&entry)
    }

    /// Get an entry serialized in `format`.
    pub async fn get_serialized(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        format: Format,
        timeout_ms: i64,
    ) -> Result<Vec<u8>> {
        let entry = self
            .get(tenant, primary_key, include_file_contents, timeout_ms)
            .await?;
        Ok(format::encode(&entry, format)?)
    }

    /// Get an entry as JSON text.
    pub async fn get_json(
        &self,
        tenant: &str,
        primary_key: &str,
        include_file_contents: bool,
        timeout_ms: i64,
    ) -> Result<String> {
        let entry = self
            .get(tenant, primary_key, include_file_contents, timeout_ms)
            .await?;
        Ok(format::to_json(&entry)?)
    }

    /// Merge a serialized entry.
    pub async fn merge_serialized(
        &self,
        payload: &[u8],
        format: Format,
        timeout_ms: i64,
    ) -> Result<()> {
        let entry = format::decode(payload, format)?;
        self.merge(&entry, timeout_ms).await
    }

    /// Replace with a serialized entry.
    pub async fn replace_serialized(
        &self,
        payload: &[u8],
        format: Format,
        timeout_ms: i64,
    ) -> Result<()> {
        let entry = format::decode(payload, format)?;
        self.replace(&entry, timeout_ms).await
    }
}

pub(crate) fn to_map(entry: &recordbase_common::Entry) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(entry).map_err(CodecError::from)?;
    serde_json::from_value(value)
        .map_err(CodecError::from)
        .map_err(ClientError::from)
}
