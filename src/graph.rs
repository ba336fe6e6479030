//! Architecture Graph - Generator Input
//!
//! Nodes and edges as drawn by the editor. Read-only to this crate.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::value::{PropertyMap, PropertyValue};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Failed to read graph: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Closed set of resource tags the editor can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Vpc,
    Subnet,
    SecurityGroup,
    Ec2,
    S3,
    Lambda,
    Rds,
    Dynamodb,
    ApiGateway,
    Sns,
    Sqs,
    IamRole,
    /// Any tag this compiler does not know how to emit.
    #[serde(other)]
    Unsupported,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::SecurityGroup => "security-group",
            Self::Ec2 => "ec2",
            Self::S3 => "s3",
            Self::Lambda => "lambda",
            Self::Rds => "rds",
            Self::Dynamodb => "dynamodb",
            Self::ApiGateway => "api-gateway",
            Self::Sns => "sns",
            Self::Sqs => "sqs",
            Self::IamRole => "iam-role",
            Self::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureNode {
    pub id: String,
    pub resource_type: NodeKind,
    #[serde(default)]
    pub attributes: PropertyMap,
}

impl ArchitectureNode {
    pub fn new(id: impl Into<String>, resource_type: NodeKind) -> Self {
        Self {
            id: id.into(),
            resource_type,
            attributes: PropertyMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&PropertyValue> {
        self.attributes.get(key)
    }

    /// Attribute as a non-empty string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.attribute(key)
            .and_then(PropertyValue::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.attribute(key).map_or(false, PropertyValue::is_truthy)
    }

    pub fn number(&self, key: &str) -> Option<i64> {
        self.attribute(key).and_then(PropertyValue::as_i64)
    }

    /// Attribute holding one id or a list of ids.
    pub fn ids(&self, key: &str) -> Vec<String> {
        match self.attribute(key) {
            Some(PropertyValue::String(id)) if !id.is_empty() => vec![id.clone()],
            Some(PropertyValue::List(items)) => items
                .iter()
                .filter_map(PropertyValue::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => vec![],
        }
    }
}

/// Directed `source -> target` relationship between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureEdge {
    pub source: String,
    pub target: String,
}

impl ArchitectureEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// On-disk graph document consumed by the CLI and the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureGraph {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub nodes: Vec<ArchitectureNode>,
    #[serde(default)]
    pub edges: Vec<ArchitectureEdge>,
}

impl ArchitectureGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            nodes: vec![],
            edges: vec![],
        }
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let node: ArchitectureNode = serde_json::from_value(json!({
            "id": "k8s1",
            "resourceType": "eks-cluster"
        }))
        .unwrap();
        assert_eq!(node.resource_type, NodeKind::Unsupported);
        assert!(node.attributes.is_empty());
    }

    #[test]
    fn test_kebab_case_tags() {
        let node: ArchitectureNode = serde_json::from_value(json!({
            "id": "sg1",
            "resourceType": "security-group",
            "attributes": {"description": "web"}
        }))
        .unwrap();
        assert_eq!(node.resource_type, NodeKind::SecurityGroup);
        assert_eq!(node.text("description"), Some("web"));
    }

    #[test]
    fn test_ids_accepts_single_or_list() {
        let single = ArchitectureNode::new("a", NodeKind::Ec2).with_attribute("subnetId", "sub1");
        assert_eq!(single.ids("subnetId"), vec!["sub1"]);

        let many = ArchitectureNode::new("b", NodeKind::Ec2).with_attribute(
            "securityGroupIds",
            PropertyValue::list(["sg1".into(), "sg2".into()]),
        );
        assert_eq!(many.ids("securityGroupIds"), vec!["sg1", "sg2"]);
    }

    #[test]
    fn test_load_graph_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"name": "demo", "nodes": [{"id": "vpc1", "resourceType": "vpc"}], "edges": []}"#,
        )
        .unwrap();

        let graph = ArchitectureGraph::load(&path).unwrap();
        assert_eq!(graph.name, "demo");
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.description.is_none());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ArchitectureGraph::load(Path::new("/nonexistent/graph.json")).unwrap_err();
        assert!(matches!(err, GraphError::Io(_)));
    }
}
