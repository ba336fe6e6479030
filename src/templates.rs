//! Template Document - Compiler Output
//!
//! Field names and nesting are the deployment compatibility surface:
//! `AWSTemplateFormatVersion`, `Description`, `Parameters`, `Resources`, `Outputs`.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::value::{PropertyMap, PropertyValue};

pub const FORMAT_VERSION: &str = "2010-09-09";

pub type LogicalId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion", default)]
    pub format_version: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    /// Passed through untouched; names here are valid `Ref` targets.
    #[serde(
        rename = "Parameters",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub parameters: IndexMap<String, serde_json::Value>,
    #[serde(rename = "Resources", default)]
    pub resources: IndexMap<LogicalId, Resource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: description.into(),
            parameters: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub type_name: String,
    #[serde(rename = "Properties", default)]
    pub properties: PropertyMap,
    #[serde(
        rename = "DependsOn",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<LogicalId>,
}

impl Resource {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: PropertyMap::new(),
            depends_on: vec![],
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> &mut Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    /// Add an explicit dependency once.
    pub fn depend_on(&mut self, logical_id: impl Into<LogicalId>) -> &mut Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "Value")]
    pub value: PropertyValue,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    pub fn new(value: PropertyValue, description: impl Into<String>) -> Self {
        Self {
            value,
            description: Some(description.into()),
        }
    }
}

/// `DependsOn` may be written as a single id or a list of ids.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}
