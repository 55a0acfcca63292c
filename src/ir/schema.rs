//! Package metadata and the complete schema document

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{CanonicalType, TypeName};

/// Namespace binding: a short prefix and the URI it stands for
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Namespace {
    pub prefix: String,
    pub origin_uri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, origin_uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            origin_uri: origin_uri.into(),
        }
    }
}

// Written as a `[prefix, uri]` pair
impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.prefix, &self.origin_uri).serialize(serializer)
    }
}

/// Package header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageInfo {
    pub package: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<TypeName>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<Namespace>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, serde_json::Value>,
}

impl PackageInfo {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }
}

/// A complete schema: header plus ordered type table
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalSchema {
    pub info: PackageInfo,
    pub types: Vec<CanonicalType>,
}

impl CanonicalSchema {
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalType> {
        self.types.iter().find(|t| t.name == name)
    }
}
