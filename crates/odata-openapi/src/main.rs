//! CLI for `odata-openapi`.
//!
//! # Subcommands
//!
//! ```text
//! # List the resource paths a model exposes
//! odata-openapi paths --model api/odata/model.yaml
//!
//! # Generate path items and tags (YAML by default)
//! odata-openapi generate \
//!   --model api/odata/model.yaml \
//!   --config api/odata/settings.yaml \
//!   --output target/paths.yaml
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=odata_openapi=debug` for discovery
//! details.

#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use odata_openapi::{ODataContext, PathProvider, Settings};
use tracing_subscriber::EnvFilter;

/// `OpenAPI` path generator for OData services.
#[derive(Parser)]
#[command(name = "odata-openapi", version, about)]
enum Cli {
    /// Print every resource path the model exposes, one per line.
    Paths(PathsArgs),

    /// Generate `OpenAPI` path items and the tag catalogue.
    Generate(GenerateArgs),
}

#[derive(Parser)]
struct PathsArgs {
    /// Path to the EDM model (YAML or JSON).
    #[arg(short, long)]
    model: PathBuf,

    /// Path to a settings YAML file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct GenerateArgs {
    /// Path to the EDM model (YAML or JSON).
    #[arg(short, long)]
    model: PathBuf,

    /// Path to a settings YAML file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit JSON instead of YAML.
    #[arg(long)]
    json: bool,

    /// Omit `operationId` from every operation.
    /// Overrides `enable_operation_id` from the config file.
    #[arg(long)]
    no_operation_id: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse() {
        Cli::Paths(args) => run_paths(&args),
        Cli::Generate(args) => run_generate(&args),
    }
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => {
            eprintln!("Loading settings: {}", path.display());
            Settings::load(path).with_context(|| format!("Failed to load settings: {}", path.display()))
        }
        None => Ok(Settings::default()),
    }
}

fn run_paths(args: &PathsArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_ref())?;
    let model = odata_openapi::load_model(&args.model)
        .with_context(|| format!("Failed to load model: {}", args.model.display()))?;

    let context = ODataContext::new(&model, &settings).context("Invalid model")?;
    let paths = PathProvider::new(&context)
        .paths()
        .context("Failed to discover paths")?;

    for path in &paths {
        let name = path.render(&settings).name;
        tracing::debug!(kind = %path.kind(), path = %name, "discovered path");
        println!("{name}");
    }
    eprintln!("Discovered {} paths", paths.len());
    Ok(())
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_ref())?;
    if args.no_operation_id {
        settings = settings.enable_operation_id(false);
    }
    let model = odata_openapi::load_model(&args.model)
        .with_context(|| format!("Failed to load model: {}", args.model.display()))?;

    let document = odata_openapi::generate(&model, &settings).context("Failed to generate paths")?;
    eprintln!(
        "Generated {} paths, {} tags",
        document.paths.len(),
        document.tags.len()
    );

    let rendered = if args.json {
        serde_json::to_string_pretty(&document).context("Failed to serialize JSON")?
    } else {
        serde_yaml_ng::to_string(&document).context("Failed to serialize YAML")?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
