//! Structural validation of the raw topology document.
//!
//! Validation runs on the raw YAML value before deserialization so the
//! failure taxonomy belongs to this module rather than to serde. It fails
//! fast on the first offending record and never attempts partial recovery.

use serde_yaml::Value;

/// Fields every connection entry must carry.
pub const REQUIRED_LINK_FIELDS: [&str; 4] = ["device1", "intf1", "device2", "intf2"];

/// Structural problems in a topology document.
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("Topology file is not a YAML mapping")]
    NotAMapping,

    #[error("Missing 'connections' section")]
    MissingConnections,

    #[error("'connections' must be a sequence of connection entries")]
    ConnectionsNotASequence,

    #[error("Connection at index {index} is not a mapping")]
    ConnectionNotAMapping { index: usize },

    #[error("Connection at index {index} is missing required string field '{field}'")]
    MissingLinkField { index: usize, field: &'static str },

    #[error("Invalid subnet pool '{value}': {reason}")]
    InvalidSubnetPool { value: String, reason: String },
}

/// Check a parsed topology document for structural correctness.
///
/// Rejects, in order: a non-mapping top level, a missing `connections` key,
/// a `connections` value that is not a sequence, and any connection entry
/// that is not a mapping or lacks one of the four required string fields.
/// Pure check; no allocation has happened yet.
pub fn validate(doc: &Value) -> Result<(), StructuralError> {
    if !doc.is_mapping() {
        return Err(StructuralError::NotAMapping);
    }

    let connections = doc
        .get("connections")
        .ok_or(StructuralError::MissingConnections)?;
    let entries = connections
        .as_sequence()
        .ok_or(StructuralError::ConnectionsNotASequence)?;

    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_mapping() {
            return Err(StructuralError::ConnectionNotAMapping { index });
        }
        for field in REQUIRED_LINK_FIELDS {
            if entry.get(field).and_then(Value::as_str).is_none() {
                return Err(StructuralError::MissingLinkField { index, field });
            }
        }
    }

    Ok(())
}
