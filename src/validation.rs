//! Validation System - Passes Produce Diagnostics
//!
//! Passes produce structured diagnostics.
//! The orchestrator aggregates them; errors decide validity, warnings never do.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::rules::{BestPracticesPass, DependencyPass, ResourcePass, StructuralPass};
use crate::templates::Template;

/// Stable diagnostic codes.
pub mod codes {
    pub const SYNTAX: &str = "E0001";
    pub const FORMAT_VERSION: &str = "E1001";
    pub const NO_RESOURCES: &str = "E1002";
    pub const INVALID_LOGICAL_ID: &str = "E1003";
    pub const LOGICAL_ID_TOO_LONG: &str = "E1004";
    pub const DESCRIPTION_TOO_LONG: &str = "E1005";
    pub const MISSING_PROPERTY: &str = "E2001";
    pub const INVALID_PROPERTY: &str = "E2002";
    pub const UNKNOWN_TYPE: &str = "W2001";
    pub const UNKNOWN_PROPERTY: &str = "W2002";
    pub const DANGLING_DEPENDENCY: &str = "E3001";
    pub const DANGLING_REFERENCE: &str = "E3002";
    pub const CIRCULAR_DEPENDENCY: &str = "E3003";
    pub const DANGLING_OUTPUT: &str = "E3004";
    pub const REFERENCE_DEPTH: &str = "W3001";
    pub const DEPENDENCY_DEPTH: &str = "W3002";
    pub const BUCKET_UNENCRYPTED: &str = "W4001";
    pub const DATABASE_UNENCRYPTED: &str = "W4002";
    pub const DATABASE_SINGLE_AZ: &str = "W4003";
    pub const FUNCTION_LONG_TIMEOUT: &str = "W4004";
    pub const OPEN_INGRESS: &str = "W4005";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    fn new(code: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
            resource_id: None,
            property: None,
        }
    }

    pub fn for_resource(mut self, logical_id: impl Into<String>) -> Self {
        self.resource_id = Some(logical_id.into());
        self
    }

    pub fn on_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code)?;
        match (&self.resource_id, &self.property) {
            (Some(id), Some(property)) => write!(f, " {}.{}", id, property)?,
            (Some(id), None) => write!(f, " {}", id)?,
            (None, Some(property)) => write!(f, " {}", property)?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            diagnostics.into_iter().partition(Diagnostic::is_error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn syntax_error(error: &serde_json::Error) -> Self {
        Self::from_diagnostics(vec![Diagnostic::error(
            codes::SYNTAX,
            format!("Template could not be parsed: {}", error),
        )])
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics().any(|d| d.code == code)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Caller policy for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// Warning codes to drop from reports. Errors are never suppressed.
    #[serde(default)]
    pub suppress: Vec<String>,
    #[serde(default = "default_true")]
    pub best_practices: bool,
    #[serde(default = "default_reference_depth")]
    pub max_reference_depth: usize,
    #[serde(default = "default_dependency_depth")]
    pub max_dependency_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_reference_depth() -> usize {
    64
}

fn default_dependency_depth() -> usize {
    1024
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            suppress: vec![],
            best_practices: true,
            max_reference_depth: default_reference_depth(),
            max_dependency_depth: default_dependency_depth(),
        }
    }
}

impl ValidatorConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn keeps(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.is_error() || !self.suppress.iter().any(|code| *code == diagnostic.code)
    }
}

/// One validation pass over a whole template.
pub trait ValidationPass: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, template: &Template, config: &ValidatorConfig) -> Vec<Diagnostic>;
}

/// Validator runs the passes in order and aggregates their diagnostics.
pub struct Validator {
    config: ValidatorConfig,
    passes: Vec<Box<dyn ValidationPass>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        let mut passes: Vec<Box<dyn ValidationPass>> = vec![
            Box::new(StructuralPass),
            Box::new(ResourcePass),
            Box::new(DependencyPass),
        ];
        if config.best_practices {
            passes.push(Box::new(BestPracticesPass));
        }
        Self { config, passes }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, template: &Template) -> ValidationResult {
        let mut all_diagnostics = vec![];

        for pass in &self.passes {
            let diagnostics = pass.check(template, &self.config);
            debug!(pass = pass.name(), count = diagnostics.len(), "validation pass finished");
            all_diagnostics.extend(diagnostics);
        }

        all_diagnostics.retain(|d| self.config.keeps(d));
        let result = ValidationResult::from_diagnostics(all_diagnostics);
        info!(
            resources = template.resources.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "template validated"
        );
        result
    }

    /// Parse the serialized form first; a parse failure short-circuits.
    pub fn validate_syntax(&self, raw: &str) -> ValidationResult {
        match Template::from_json(raw) {
            Ok(template) => self.validate(&template),
            Err(e) => {
                debug!(error = %e, "template failed to parse");
                ValidationResult::syntax_error(&e)
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
