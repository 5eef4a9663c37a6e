//! Product metadata.
//!
//! A tagged union keyed on `metadata_type`. The catalog only cares that
//! the tag is one it knows; the shape of each variant is a contract with
//! the producers and consumers of that product family. `simple` is the
//! catch-all for anything without a dedicated shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metadata_type", rename_all = "snake_case")]
pub enum Metadata {
    /// Free-form key/value metadata.
    Simple {
        #[serde(default, flatten)]
        fields: BTreeMap<String, serde_json::Value>,
    },
    /// A set of related sky maps sharing a pixelisation.
    MapSet {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pixelisation: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        telescope: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instrument: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        release: Option<String>,
    },
    /// A tabular source catalog.
    Catalog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        telescope: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        release: Option<String>,
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row_count: Option<u64>,
    },
    /// A bare numeric array with units.
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<String>,
        #[serde(default)]
        shape: Vec<u64>,
    },
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata::Simple {
            fields: BTreeMap::new(),
        }
    }
}

impl Metadata {
    /// The discriminator string as it appears on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            Metadata::Simple { .. } => "simple",
            Metadata::MapSet { .. } => "map_set",
            Metadata::Catalog { .. } => "catalog",
            Metadata::Numeric { .. } => "numeric",
        }
    }
}
