//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use infraforge_core::{
    codes, hashing::canonical_json, ArchitectureGraph, ArchitectureNode, CompilationPipeline,
    NodeKind, ValidatorConfig,
};

fn create_valid_graph() -> ArchitectureGraph {
    let mut graph = ArchitectureGraph::new("web-app");
    graph.nodes = vec![
        ArchitectureNode::new("vpc1", NodeKind::Vpc),
        ArchitectureNode::new("web", NodeKind::SecurityGroup)
            .with_attribute("description", "web tier"),
        ArchitectureNode::new("assets", NodeKind::S3),
    ];
    graph
}

fn create_invalid_graph() -> ArchitectureGraph {
    let mut graph = ArchitectureGraph::new("broken");
    // Security group without a description
    graph.nodes = vec![ArchitectureNode::new("web", NodeKind::SecurityGroup)];
    graph
}

#[test]
fn invariant_compile_calls_validate() {
    // compile must reject a graph whose template has errors
    let pipeline = CompilationPipeline::default();

    let result = pipeline.compile(&create_invalid_graph());

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Validation failed"));
    assert!(err.to_string().contains("GroupDescription"));
}

#[test]
fn invariant_valid_graph_compiles() {
    let pipeline = CompilationPipeline::default();

    let compiled = pipeline.compile(&create_valid_graph()).unwrap();
    assert!(compiled.validation.valid);
    assert_eq!(compiled.name, "web-app");
    assert_eq!(compiled.template_hash.len(), 64);
    assert_eq!(compiled.template.resources.len(), 3);
}

#[test]
fn invariant_hashes_stable() {
    // Same inputs must produce same fingerprints
    let pipeline = CompilationPipeline::default();

    let c1 = pipeline.compile(&create_valid_graph()).unwrap();
    let c2 = pipeline.compile(&create_valid_graph()).unwrap();

    assert_eq!(c1.graph_hash, c2.graph_hash);
    assert_eq!(c1.template_hash, c2.template_hash);
    // Every compilation gets its own id
    assert_ne!(c1.id, c2.id);
}

#[test]
fn invariant_draft_never_rejects() {
    let pipeline = CompilationPipeline::default();

    let draft = pipeline.draft(&create_invalid_graph());
    assert!(!draft.validation.valid);
    assert_eq!(draft.template.resources.len(), 1);
}

#[test]
fn invariant_canonical_json_deterministic() {
    use serde_json::json;

    let obj1 = json!({"z": 1, "a": 2, "m": {"b": 1, "a": 2}});
    let obj2 = json!({"a": 2, "m": {"a": 2, "b": 1}, "z": 1});

    let c1 = canonical_json(&obj1).unwrap();
    let c2 = canonical_json(&obj2).unwrap();

    assert_eq!(c1, c2);
}

#[test]
fn invariant_suppression_cannot_hide_errors() {
    let config = ValidatorConfig {
        suppress: vec![codes::INVALID_PROPERTY.into(), codes::UNKNOWN_PROPERTY.into()],
        ..Default::default()
    };
    let pipeline = CompilationPipeline::new(config);

    let draft = pipeline.draft(&create_invalid_graph());
    assert!(!draft.validation.valid);
    assert!(draft.validation.has_code(codes::INVALID_PROPERTY));
}

#[test]
fn invariant_suppressed_warning_is_dropped() {
    let config = ValidatorConfig {
        suppress: vec![codes::DATABASE_SINGLE_AZ.into()],
        ..Default::default()
    };
    let mut graph = ArchitectureGraph::new("db");
    graph.nodes = vec![ArchitectureNode::new("orders", NodeKind::Rds)];

    let noisy = CompilationPipeline::default().draft(&graph);
    let quiet = CompilationPipeline::new(config).draft(&graph);

    assert!(noisy.validation.has_code(codes::DATABASE_SINGLE_AZ));
    assert!(!quiet.validation.has_code(codes::DATABASE_SINGLE_AZ));
    assert!(quiet.validation.valid);
}

#[test]
fn invariant_validation_result_structure() {
    let pipeline = CompilationPipeline::default();

    let result = pipeline.draft(&create_invalid_graph()).validation;

    assert!(!result.valid);
    assert!(!result.errors.is_empty());
    for d in result.diagnostics() {
        assert!(!d.code.is_empty());
        assert!(!d.message.is_empty());
    }
}

#[test]
fn invariant_text_validation_short_circuits_on_syntax() {
    let pipeline = CompilationPipeline::default();

    let result = pipeline.validate_text(r#"{"Resources": "#);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, codes::SYNTAX);
}
