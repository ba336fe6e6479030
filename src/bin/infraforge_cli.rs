//! InfraForge CLI - Bridge interface for the editor
//!
//! Commands: generate, validate, compile, catalog
//! Outputs JSON to stdout; `validate` and `compile` also render text with --format text
//! Returns 2 on validation failure, 1 on I/O or configuration failure

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::fmt::Display;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use infraforge_core::{
    ArchitectureGraph, CompilationPipeline, PipelineError, ResourceType, ValidationResult,
    ValidatorConfig,
};

#[derive(Parser)]
#[command(name = "infraforge-cli")]
#[command(about = "InfraForge CLI - Infrastructure Template Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a validator configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format for validate and compile (generate and catalog always emit JSON)
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a template from an architecture graph
    Generate {
        /// Graph file (ArchitectureGraph JSON)
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Validate a template
    Validate {
        /// Template file, or "-" for stdin
        #[arg(short, long)]
        template: String,
    },

    /// Generate, validate and fingerprint a graph
    Compile {
        /// Graph file (ArchitectureGraph JSON)
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// List the resource specification catalog
    Catalog,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("infraforge_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            print_json(&json!({ "error": format!("Failed to load config: {}", e) }));
            return ExitCode::FAILURE;
        }
    };

    let pipeline = CompilationPipeline::new(config);

    match cli.command {
        Commands::Generate { graph } => {
            let graph = match ArchitectureGraph::load(&graph) {
                Ok(g) => g,
                Err(e) => {
                    print_json(&failure("success", e.to_string()));
                    return ExitCode::FAILURE;
                }
            };
            let draft = pipeline.draft(&graph);
            print_json(&draft.template);
            ExitCode::SUCCESS
        }

        Commands::Validate { template } => {
            let raw = match read_input(&template) {
                Ok(r) => r,
                Err(e) => {
                    print_json(&failure("valid", format!("Failed to read template: {}", e)));
                    return ExitCode::FAILURE;
                }
            };

            let result = pipeline.validate_text(&raw);
            print_report(&result, cli.format);
            if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }

        Commands::Compile { graph } => {
            let graph = match ArchitectureGraph::load(&graph) {
                Ok(g) => g,
                Err(e) => {
                    print_json(&failure("success", e.to_string()));
                    return ExitCode::FAILURE;
                }
            };

            match pipeline.compile(&graph) {
                Ok(compiled) => {
                    match cli.format {
                        Format::Json => print_json(&json!({
                            "success": true,
                            "compiled": compiled,
                        })),
                        Format::Text => println!(
                            "compiled {} ({}) template {}",
                            compiled.name, compiled.id, compiled.template_hash
                        ),
                    }
                    ExitCode::SUCCESS
                }
                Err(e @ PipelineError::ValidationFailed(_)) => {
                    report_failure(&e, cli.format);
                    ExitCode::from(2) // Compilation failure (validation)
                }
                Err(e) => {
                    report_failure(&e, cli.format);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Catalog => {
            let entries: Vec<_> = ResourceType::ALL
                .iter()
                .map(|t| {
                    let spec = t.spec();
                    json!({
                        "type": t.type_name(),
                        "required": spec.required,
                        "optional": spec.optional,
                    })
                })
                .collect();
            print_json(&entries);
            ExitCode::SUCCESS
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ValidatorConfig, String> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
            ValidatorConfig::from_json(&raw).map_err(|e| e.to_string())
        }
        None => Ok(ValidatorConfig::default()),
    }
}

fn read_input(source: &str) -> std::io::Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        fs::read_to_string(source)
    }
}

/// Error document for stdout; `status` is the flag the command normally reports.
fn failure(status: &str, message: impl Display) -> Value {
    json!({
        status: false,
        "error": message.to_string(),
    })
}

fn report_failure(error: &PipelineError, format: Format) {
    match format {
        Format::Json => print_json(&failure("success", error)),
        Format::Text => println!("failed: {}", error),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            let message = format!("Failed to serialize output: {}", e);
            eprintln!("{}", json!({ "error": message }));
        }
    }
}

fn print_report(result: &ValidationResult, format: Format) {
    match format {
        Format::Json => print_json(result),
        Format::Text => {
            for diagnostic in result.diagnostics() {
                println!("{}", diagnostic);
            }
            println!(
                "{} ({} errors, {} warnings)",
                if result.valid { "valid" } else { "invalid" },
                result.errors.len(),
                result.warnings.len()
            );
        }
    }
}
