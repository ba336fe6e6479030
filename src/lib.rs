//! InfraForge Core - Infrastructure Template Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. Graphs Are Input, Templates Are Output
//! 2. Generation Is Total
//! 3. Validation Is Data, Never a Panic
//! 4. Errors Block, Warnings Advise
//! 5. Deterministic Output

pub mod catalog;
pub mod generator;
pub mod graph;
pub mod hashing;
pub mod pipeline;
pub mod rules;
pub mod templates;
pub mod validation;
pub mod value;

pub use catalog::{ResourceSpec, ResourceType};
pub use graph::{ArchitectureEdge, ArchitectureGraph, ArchitectureNode, GraphError, NodeKind};
pub use hashing::{canonical_json, compute_graph_hash, compute_template_hash};
pub use pipeline::{CompilationPipeline, CompiledTemplate, Draft, PipelineError};
pub use templates::{Output, Resource, Template, FORMAT_VERSION};
pub use validation::{
    codes, Diagnostic, Severity, ValidationPass, ValidationResult, Validator, ValidatorConfig,
};
pub use value::{PropertyMap, PropertyValue};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile an architecture graph into a template. Never fails.
pub fn generate(
    nodes: &[ArchitectureNode],
    edges: &[ArchitectureEdge],
    name: &str,
    description: Option<&str>,
) -> Template {
    generator::generate(nodes, edges, name, description)
}

/// Run every validation pass with the default configuration.
pub fn validate(template: &Template) -> ValidationResult {
    Validator::new().validate(template)
}

/// Parse serialized template text, then validate it.
pub fn validate_syntax(raw: &str) -> ValidationResult {
    Validator::new().validate_syntax(raw)
}
