//! # Validate Subcommand
//!
//! Validates one or more documents against a model and prints a report
//! per document, optionally with the salvaged data.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use strel_schema::salvage::item_via_blanking;
use strel_schema::{Api, Structure, ValidationResult, Validator};

/// Arguments for the `strel validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Model definition document (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub models: PathBuf,

    /// Id of the model to validate against.
    #[arg(long)]
    pub model: String,

    /// Structure of each document: item, array, collection or mirror.
    #[arg(long, default_value = "item")]
    pub structure: Structure,

    /// Print the salvaged data of each invalid document.
    #[arg(long)]
    pub salvage: bool,

    /// Salvage items by dropping optional and nulling nullable invalid
    /// fields instead of discarding them. Only valid with `--structure item`.
    #[arg(long, requires = "salvage")]
    pub blanking: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Documents to validate.
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every document is valid, 1 when any is not.
/// Unreadable documents, unknown models and `--blanking` on a structure
/// other than `item` are errors.
pub fn run_validate(args: &ValidateArgs, debug: bool) -> Result<u8> {
    if args.blanking && args.structure != Structure::Item {
        bail!(
            "--blanking salvages record fields and only applies to --structure item, not {}",
            args.structure
        );
    }
    let api = crate::load_api(&args.models, debug)?;
    let validator = api
        .validator(args.model.as_str(), args.structure)
        .with_context(|| format!("cannot validate against model '{}'", args.model))?;

    let mut reports = Vec::with_capacity(args.documents.len());
    let mut had_failures = false;
    for path in &args.documents {
        let (name, result) = validate_document(&api, &validator, args, path)?;
        had_failures |= !result.is_valid();
        tracing::debug!(
            document = %path.display(),
            valid = result.is_valid(),
            failures = result.failures().len(),
            "validated document"
        );
        match args.format {
            OutputFormat::Text => print_text(path, &name, &result, args.salvage),
            OutputFormat::Json => reports.push(json_report(path, &name, &result, args.salvage)),
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(u8::from(had_failures))
}

fn validate_document(
    api: &Api,
    validator: &Validator,
    args: &ValidateArgs,
    path: &Path,
) -> Result<(String, std::sync::Arc<ValidationResult>)> {
    let subject = crate::load_document(path)?;
    let name = crate::subject_name(path);
    let result = if args.blanking {
        validator.validate_with(&subject, &name, &item_via_blanking)
    } else {
        validator.validate(&subject, &name)
    }
    .with_context(|| format!("model configuration error while validating {}", path.display()))?;
    // Each document is validated once; keep the cache from pinning them.
    api.clear_results();
    Ok((name, result))
}

fn print_text(path: &Path, name: &str, result: &ValidationResult, salvage: bool) {
    if result.is_valid() {
        println!("PASS: {}", path.display());
        return;
    }
    let report = result.report(name);
    println!("FAIL: {} ({} failure(s))", path.display(), report.len());
    for entry in &report {
        println!("  {entry}");
    }
    if salvage {
        match result.salvage() {
            Some(value) => println!("  salvage: {value}"),
            None => println!("  salvage: nothing recoverable"),
        }
    }
}

fn json_report(
    path: &Path,
    name: &str,
    result: &ValidationResult,
    salvage: bool,
) -> serde_json::Value {
    let mut report = serde_json::json!({
        "document": path.display().to_string(),
        "valid": result.is_valid(),
        "failures": result.report(name),
    });
    if salvage {
        report["salvage"] = result
            .salvage()
            .map_or(serde_json::Value::Null, |value| value.to_json());
    }
    report
}
