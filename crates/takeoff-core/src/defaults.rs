//! Built-in starter groups
//!
//! The starter groups ship as a JSON document embedded in the crate and are
//! loaded through the regular serde model.

use crate::collection::GroupCollection;

const BUILTIN_GROUPS_JSON: &str = include_str!("builtin_groups.json");

/// The starter calculation groups (Lighting, Channels, Structured Cabling,
/// CCTV, Electrical Cable Tray, Network Cable Tray, Conduit, Audio and Video)
///
/// # Panics
///
/// Never in practice: the embedded document is fixed at compile time and
/// `tests::test_builtin_groups_load` parses it on every test run.
pub fn builtin_groups() -> GroupCollection {
    serde_json::from_str(BUILTIN_GROUPS_JSON).expect("embedded builtin groups are valid")
}

/// The raw embedded document
pub fn builtin_groups_json() -> &'static str {
    BUILTIN_GROUPS_JSON
}
