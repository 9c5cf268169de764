//! AIFM bundle manifest access
//!
//! An AIFM bundle is a ZIP archive carrying a `manifest.json` member with
//! untyped JSON metadata. Field layout varies between producing tools, so
//! display fields are resolved through fallback chains of dotted paths
//! rather than a rigid schema.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use zip::ZipArchive;

use crate::Result;

/// Archive member holding the bundle metadata
pub const MANIFEST_MEMBER: &str = "manifest.json";

/// Placeholder shown for metadata fields the manifest does not provide
pub const FIELD_PLACEHOLDER: &str = "—";

/// Read and parse `manifest.json` from an AIFM bundle.
///
/// A bundle without a manifest member yields an empty JSON object; an
/// unreadable archive or unparseable manifest is an error.
pub fn read_manifest(aifm_path: &Path) -> Result<Value> {
    let file = File::open(aifm_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut member = match archive.by_name(MANIFEST_MEMBER) {
        Ok(m) => m,
        Err(zip::result::ZipError::FileNotFound) => {
            return Ok(Value::Object(Default::default()));
        }
        Err(e) => return Err(e.into()),
    };
    let mut raw = Vec::new();
    member.read_to_end(&mut raw)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Traverse a JSON value along a dotted path (`"origin.primary_url"`).
///
/// Returns `None` when any step is missing or the intermediate value is not
/// an object.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = value;
    for part in path.split('.') {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Render a JSON value for display, treating empty strings as absent
fn as_display(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// First non-empty value along a chain of dotted paths
fn first_of(manifest: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|p| lookup(manifest, p).and_then(as_display))
}

/// Display metadata extracted from a bundle manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackFields {
    pub author: String,
    pub ai_system: String,
    pub tier: String,
    pub mode: String,
    pub origin_url: String,
}

impl TrackFields {
    /// Extract display fields from a parsed manifest.
    ///
    /// Each field tries a chain of known manifest layouts before falling
    /// back to the placeholder (origin_url falls back to empty, so the UI
    /// can suppress the link entirely).
    pub fn from_manifest(manifest: &Value) -> Self {
        Self {
            author: first_of(manifest, &["creator.name", "author"])
                .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            ai_system: first_of(manifest, &["origin.ai_platform", "ai.system", "ai_system"])
                .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            tier: first_of(manifest, &["verification.tier", "tier"])
                .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            mode: first_of(manifest, &["mode", "aifx.governance.mode"])
                .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string()),
            origin_url: first_of(manifest, &["origin.primary_url", "origin_url", "origin.url"])
                .unwrap_or_default(),
        }
    }

    /// Fields for a bundle whose manifest could not be read
    pub fn placeholder() -> Self {
        Self::from_manifest(&Value::Null)
    }
}
