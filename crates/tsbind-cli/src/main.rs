use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use tsbind_codegen::typescript::TypeScriptEmitter;
use tsbind_codegen::{Generator, Severity};
use tsbind_core::Project;

#[derive(Parser)]
#[command(name = "tsbind")]
#[command(about = "Generate type-safe TypeScript bindings for compiled modules", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate binding files from collected declarations
    Generate {
        /// Declaration file (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the generated .gen.ts files
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate declarations and report diagnostics without writing files
    Check {
        /// Declaration file (JSON format)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Generate { input, output } => handle_generate(&input, &output),
        Commands::Check { input } => handle_check(&input),
    }
}

fn load_project(path: &Path) -> Result<Project> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read declaration file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse declaration file: {:?}", path))
}

fn handle_generate(input: &Path, output: &Path) -> Result<()> {
    let project = load_project(input)?;
    let generator = Generator::new(&project);
    let emitter = TypeScriptEmitter::new();

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {:?}", output))?;

    let mut failed = Vec::new();
    let mut warnings = 0usize;
    let mut skipped = 0usize;

    for module in generator.generate(&project) {
        match module.result {
            Ok(module_output) => {
                for diag in &module_output.diagnostics {
                    eprintln!("{}", diag);
                    match diag.severity {
                        Severity::Warning => warnings += 1,
                        Severity::Error => skipped += 1,
                    }
                }

                let rendered = emitter.render(&module_output)?;
                let path = output.join(format!("{}.gen.ts", module.name));
                fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("Generated {:?}", path);
            }
            Err(e) => {
                eprintln!("error: module '{}': {}", module.name, e);
                failed.push(module.name);
            }
        }
    }

    info!(
        "Done: {} module(s), {} skipped item(s), {} warning(s), {} failed",
        project.modules.len(),
        skipped,
        warnings,
        failed.len()
    );

    if !failed.is_empty() {
        anyhow::bail!("generation failed for module(s): {}", failed.join(", "));
    }
    Ok(())
}

fn handle_check(input: &Path) -> Result<()> {
    let project = load_project(input)?;
    let generator = Generator::new(&project);

    let mut problems = 0usize;
    for module in generator.generate(&project) {
        match module.result {
            Ok(module_output) => {
                for diag in &module_output.diagnostics {
                    eprintln!("{}", diag);
                    if diag.severity == Severity::Error {
                        problems += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("error: module '{}': {}", module.name, e);
                problems += 1;
            }
        }
    }

    if problems > 0 {
        anyhow::bail!("{} problem(s) found", problems);
    }
    info!("All {} module(s) check out", project.modules.len());
    Ok(())
}
