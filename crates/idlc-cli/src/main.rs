//! `idlc`: compile one interface description into its V8 binding units.
//!
//! ```text
//! idlc --output-directory gen [--interfaces-info-file info.json]
//!      [--dependency Node.idl ...] [--write-file-only-if-changed] Widget.idl
//! ```

mod cli;
mod logging;
mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use idlc_compiler::{InterfacesInfo, TypeRegistry};

use crate::cli::Cli;
use crate::output::{output_paths, write_output, WriteOutcome};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_settings().merged_with_env());

    let _span = tracing::info_span!(target: "pipeline", "cli.run", input = %cli.input.display()).entered();

    let registry = load_registry(&cli.dependencies)?;
    let info = match &cli.interfaces_info_file {
        Some(path) => load_interfaces_info(path)?,
        None => InterfacesInfo::new(),
    };

    let filename = cli.input.display().to_string();
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {filename}"))?;

    let compiled = match idlc_compiler::compile(&source, &filename, &registry, &info) {
        Ok(compiled) => compiled,
        Err(errors) => {
            eprint!("{errors}");
            tracing::info!(target: "pipeline", stage = "cli.run.failed", errors = errors.total_errors);
            return Ok(ExitCode::FAILURE);
        }
    };
    if compiled.warnings.total_warnings > 0 {
        eprint!("{}", compiled.warnings);
    }

    fs::create_dir_all(&cli.output_directory).with_context(|| {
        format!("failed to create {}", cli.output_directory.display())
    })?;

    let (header_path, source_path) = output_paths(&cli.output_directory, &compiled.interface_name);
    for (path, contents) in [(&header_path, &compiled.header), (&source_path, &compiled.source)] {
        let outcome = write_output(path, contents, cli.write_file_only_if_changed)
            .with_context(|| format!("failed to write {}", path.display()))?;
        match outcome {
            WriteOutcome::Written => {
                tracing::debug!(target: "pipeline", stage = "cli.write", path = %path.display(), "written")
            }
            WriteOutcome::Unchanged => {
                tracing::debug!(target: "pipeline", stage = "cli.write", path = %path.display(), "unchanged")
            }
        }
    }

    tracing::info!(
        target: "pipeline",
        stage = "cli.run.complete",
        interface = %compiled.interface_name,
        "compiled interface"
    );
    Ok(ExitCode::SUCCESS)
}

fn load_registry(dependencies: &[PathBuf]) -> anyhow::Result<TypeRegistry> {
    let mut builder = TypeRegistry::builder();
    for path in dependencies {
        let filename = path.display().to_string();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read dependency {filename}"))?;
        builder = match idlc_compiler::register_dependency(builder, &text, &filename) {
            Ok(builder) => builder,
            Err(errors) => {
                eprint!("{errors}");
                bail!("dependency {filename} has {} error(s)", errors.total_errors);
            }
        };
    }
    Ok(builder.build())
}

fn load_interfaces_info(path: &Path) -> anyhow::Result<InterfacesInfo> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    InterfacesInfo::from_json(&text)
        .with_context(|| format!("malformed interfaces info in {}", path.display()))
}
