//! Conversions between proto types and the entry model.
//!
//! The wire carries attributes, columns and files as repeated name/value
//! pairs; the model keys them by name. On decode a later pair with the same
//! name overwrites an earlier one. On encode one pair is emitted per key in
//! map order, which the store must not rely on.

use recordbase_common::{CodecError, Entry, FileInfo};
use recordbase_proto::record as pb;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Attributes / columns
// ---------------------------------------------------------------------------

pub fn attributes_from_proto(pairs: Vec<pb::AttributeEntry>) -> BTreeMap<String, String> {
    pairs.into_iter().map(|p| (p.name, p.value)).collect()
}

pub fn attributes_to_proto(attributes: &BTreeMap<String, String>) -> Vec<pb::AttributeEntry> {
    attributes
        .iter()
        .map(|(name, value)| pb::AttributeEntry {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

pub fn columns_from_proto(pairs: Vec<pb::ColumnEntry>) -> BTreeMap<String, Vec<u8>> {
    pairs.into_iter().map(|p| (p.name, p.value)).collect()
}

pub fn columns_to_proto(columns: &BTreeMap<String, Vec<u8>>) -> Vec<pb::ColumnEntry> {
    columns
        .iter()
        .map(|(name, value)| pb::ColumnEntry {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn file_info_from_proto(file: pb::FileEntry) -> FileInfo {
    FileInfo {
        name: file.name,
        data: file.data,
        size: file.size,
        created_at: file.created_at,
        updated_at: file.updated_at,
        deleted_at: file.deleted_at,
    }
}

/// The map key is authoritative for the wire name.
pub fn file_info_to_proto(name: &str, info: &FileInfo) -> pb::FileEntry {
    pb::FileEntry {
        name: name.to_string(),
        data: info.data.clone(),
        size: info.size,
        created_at: info.created_at,
        updated_at: info.updated_at,
        deleted_at: info.deleted_at,
    }
}

pub fn files_from_proto(files: Vec<pb::FileEntry>) -> BTreeMap<String, FileInfo> {
    files
        .into_iter()
        .map(|f| (f.name.clone(), file_info_from_proto(f)))
        .collect()
}

pub fn files_to_proto(files: &BTreeMap<String, FileInfo>) -> Vec<pb::FileEntry> {
    files
        .iter()
        .map(|(name, info)| file_info_to_proto(name, info))
        .collect()
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

pub fn entry_from_proto(resp: pb::GetResponse) -> Entry {
    Entry {
        tenant: resp.tenant,
        primary_key: resp.primary_key,
        version: resp.version,
        created_at: resp.created_at,
        updated_at: resp.updated_at,
        deleted_at: resp.deleted_at,
        attributes: attributes_from_proto(resp.attributes),
        tags: resp.tags,
        columns: columns_from_proto(resp.columns),
        files: files_from_proto(resp.files),
    }
}

pub fn entry_to_proto(entry: &Entry) -> pb::GetResponse {
    pb::GetResponse {
        tenant: entry.tenant.clone(),
        primary_key: entry.primary_key.clone(),
        version: entry.version,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        deleted_at: entry.deleted_at,
        attributes: attributes_to_proto(&entry.attributes),
        tags: entry.tags.clone(),
        columns: columns_to_proto(&entry.columns),
        files: files_to_proto(&entry.files),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn get_request(tenant: &str, primary_key: &str, include_file_contents: bool) -> pb::GetRequest {
    pb::GetRequest {
        tenant: tenant.to_string(),
        primary_key: primary_key.to_string(),
        file_contents: include_file_contents,
    }
}

/// Build a write request. Files and store-managed fields (version,
/// timestamps) are not submitted.
pub fn update_request(
    entry: &Entry,
    update_type: pb::UpdateType,
) -> Result<pb::UpdateRequest, CodecError> {
    entry.check_identity()?;
    Ok(pb::UpdateRequest {
        tenant: entry.tenant.clone(),
        primary_key: entry.primary_key.clone(),
        update_type: update_type.into(),
        attributes: attributes_to_proto(&entry.attributes),
        tags: entry.tags.clone(),
        columns: columns_to_proto(&entry.columns),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
