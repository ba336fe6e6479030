//! Compilation Pipeline - Single Entry Point
//!
//! CRITICAL: compile MUST call validate internally. No bypass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::generator::generate;
use crate::graph::ArchitectureGraph;
use crate::hashing::{compute_graph_hash, compute_template_hash};
use crate::templates::Template;
use crate::validation::{ValidationResult, Validator, ValidatorConfig};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Generated template with its diagnostics, valid or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub template: Template,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTemplate {
    pub id: String,
    pub name: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub graph_hash: String,
    pub template_hash: String,
    pub validation: ValidationResult,
    pub template: Template,
}

/// The compilation pipeline - single entry point for graph compilation
pub struct CompilationPipeline {
    validator: Validator,
}

impl CompilationPipeline {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            validator: Validator::with_config(config),
        }
    }

    /// Validate a template.
    ///
    /// This is the ONLY validation entry point.
    pub fn validate(&self, template: &Template) -> ValidationResult {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(template)
    }

    /// Validate serialized template text; parse failures short-circuit.
    pub fn validate_text(&self, raw: &str) -> ValidationResult {
        match Template::from_json(raw) {
            Ok(template) => self.validate(&template),
            Err(e) => ValidationResult::syntax_error(&e),
        }
    }

    /// Generate and validate without rejecting; for live editing.
    pub fn draft(&self, graph: &ArchitectureGraph) -> Draft {
        let template = generate_from(graph);
        let validation = self.validate(&template);
        Draft { template, validation }
    }

    /// Compile a graph
    ///
    /// CRITICAL: This ALWAYS validates. Templates with errors are rejected.
    pub fn compile(&self, graph: &ArchitectureGraph) -> Result<CompiledTemplate, PipelineError> {
        let Draft { template, validation } = self.draft(graph);

        if !validation.valid {
            let messages: Vec<_> = validation.errors.iter().map(|d| d.to_string()).collect();
            return Err(PipelineError::ValidationFailed(messages.join("; ")));
        }

        let compiled = CompiledTemplate {
            id: Uuid::new_v4().to_string(),
            name: graph.name.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            graph_hash: compute_graph_hash(graph, ENGINE_VERSION)?,
            template_hash: compute_template_hash(&template)?,
            validation,
            template,
        };
        info!(id = %compiled.id, name = %compiled.name, "graph compiled");
        Ok(compiled)
    }
}

fn generate_from(graph: &ArchitectureGraph) -> Template {
    generate(
        &graph.nodes,
        &graph.edges,
        &graph.name,
        graph.description.as_deref(),
    )
}

impl Default for CompilationPipeline {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}
