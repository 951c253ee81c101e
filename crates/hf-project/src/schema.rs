//! Project schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectDef {
    pub handle: String,
    /// Kind label, e.g. `fan` or `air_loop`.
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeDef>,
    /// Pointer fields by label, each holding the handle of its target.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AttributeDef {
    Real { value: f64 },
    Integer { value: i64 },
    Text { value: String },
    Flag { value: bool },
}

/// One edge, written in flow direction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub from: String,
    pub from_port: String,
    pub to: String,
    pub to_port: String,
}
