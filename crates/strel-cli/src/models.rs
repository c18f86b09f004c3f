//! # Models Subcommand
//!
//! Lists the models of a definition document and checks that every model
//! they reference is defined.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

/// Arguments for the `strel models` subcommand.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Model definition document (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub models: PathBuf,
}

/// Execute the models subcommand.
///
/// Returns exit code: 0 when every reference resolves, 1 otherwise.
pub fn run_models(args: &ModelsArgs, debug: bool) -> Result<u8> {
    let api = crate::load_api(&args.models, debug)?;
    let registry = api.registered_models();
    for entry in registry.iter() {
        println!("{}: {}", entry.id(), entry.expect());
    }
    println!("Models: {}", registry.len());

    match api.verify_models() {
        Ok(()) => Ok(0),
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}
