//! jsonschema-transform CLI
//!
//! Reads JSON Schema files and writes a class diagram.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jsonschema_transform::render::{self, Format};
use jsonschema_transform::{Parser as SchemaParser, SchemaLoader, TransformConfig, TransformError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonschema-transform")]
#[command(about = "Transform JSON Schema documents into class diagrams")]
struct Cli {
    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    /// Config file layered over the default locations
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a D2 diagram from the JSON schemas
    D2(RenderArgs),

    /// Dump the class model as JSON
    Json(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Schema files or directories
    inputs: Vec<PathBuf>,

    /// Output file; `%s` is replaced by the format extension
    #[arg(short, long)]
    output: Option<String>,

    /// Base URI for `$id` resolution and class sources (path or http(s) URI)
    #[arg(short, long)]
    base_uri: Option<String>,

    /// Keep classes within this many hops of an input schema (-1 = all)
    #[arg(short, long, allow_negative_numbers = true)]
    depth: Option<i64>,

    /// Fail on unreadable or invalid input files
    #[arg(long)]
    strict: bool,

    /// Replace an existing output file
    #[arg(long)]
    overwrite: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli.verbose, cli.quiet))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `warn`, moved up by `-v` and down by `-q`
fn env_filter(verbose: u8, quiet: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match 2 + i16::from(verbose) - i16::from(quiet) {
            i16::MIN..=-1 | 0 => "off",
            1 => "error",
            2 => "warn",
            3 => "info",
            4 => "debug",
            _ => "trace",
        };
        EnvFilter::new(level)
    })
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match cli.config.as_deref() {
        Some(path) => TransformConfig::load_from(Some(path)),
        None => TransformConfig::load(),
    }
    .context("Failed to load configuration")?;

    let (default_format, args) = match cli.command {
        Commands::D2(args) => (Format::D2, args),
        Commands::Json(args) => (Format::Json, args),
    };

    if args.inputs.is_empty() {
        return Err(TransformError::NoInputs.into());
    }

    if let Some(output) = args.output {
        config.output.path = output;
    }
    let output = config.output_path(default_format.extension());
    let format = Format::from_path(&output)?;

    let depth = args.depth.unwrap_or(config.parser.depth);
    let strict = args.strict || config.parser.strict;
    let overwrite = args.overwrite || config.output.overwrite;
    let base_uri = match args.base_uri.or(config.parser.base_uri) {
        Some(base_uri) => Some(absolute_base_uri(&base_uri)?),
        None => None,
    };

    let mut loader = SchemaLoader::new().with_strict(strict);
    if let Some(base_uri) = &base_uri {
        loader = loader.with_base_uri(base_uri)?;
    }
    let loaded = loader.load_paths(args.inputs.as_slice()).context("Failed to load schemas")?;

    let mut builder = SchemaParser::builder().depth(depth);
    if let Some(base_uri) = base_uri {
        builder = builder.base_uri(base_uri);
    }
    let parser = builder.build(loaded);

    let classes = parser.classes().context("Failed to parse classes or relations")?;
    let relations = parser.relations().context("Failed to parse classes or relations")?;
    let rendered = render::render(format, classes, relations)?;

    if output.exists() && !overwrite {
        return Err(TransformError::OutputExists(output).into());
    }

    write_output(&output, &rendered)?;
    info!("{} diagram written to {}", format, output.display());

    Ok(())
}

/// http(s) URIs are kept; anything else is a path, made absolute and `file://` prefixed
fn absolute_base_uri(base_uri: &str) -> Result<String> {
    if base_uri.starts_with("http") {
        return Ok(base_uri.to_string());
    }

    let path = Path::new(base_uri);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to determine working directory")?
            .join(path)
    };

    Ok(format!("file://{}", absolute.display()))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
