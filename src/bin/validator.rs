//! OAK Validator CLI
//!
//! Validates OAK JSON files against the protocol schemas.
//!
//! ```text
//! oak-validate card oak/card.json
//! oak-validate knowledge oak/knowledge/2026-02-02/my-finding.json
//! oak-validate trust oak/trust/agent-x/a2a.json
//! ```

use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use oak_publisher::{embedded_schema, load_schema, read_document, DocumentKind, OakConfig, OakError};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oak-validate")]
#[command(about = "Validate OAK documents against the protocol schemas")]
struct Cli {
    /// Document type: card, knowledge, or trust
    #[arg(value_name = "TYPE")]
    kind: String,

    /// JSON file to validate
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Schema directory (defaults to `validate.schema_dir` from config)
    #[arg(short, long)]
    schemas: Option<PathBuf>,

    /// Validate against the schemas built into this binary
    #[arg(long, conflicts_with = "schemas")]
    builtin: bool,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: oak-validate <card|knowledge|trust> <file.json>");
            process::exit(1);
        }
    };

    match run(cli) {
        Ok(0) => {}
        Ok(_) => process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of violations found
fn run(cli: Cli) -> Result<usize, Box<dyn std::error::Error>> {
    let kind: DocumentKind = cli.kind.parse().map_err(|_| {
        format!("Unknown type: {}. Use: card, knowledge, trust", cli.kind)
    })?;

    if !cli.file.is_file() {
        return Err(OakError::NotFound { path: cli.file }.into());
    }

    let schema = if cli.builtin {
        embedded_schema(kind)?
    } else {
        let schema_dir = match cli.schemas {
            Some(dir) => dir,
            None => OakConfig::load_from(cli.config.as_deref())?.schema_dir(),
        };
        load_schema(&schema_dir, kind).map_err(|e| match e {
            OakError::SchemaNotFound { path } => schema_hint(&path),
            other => other.to_string(),
        })?
    };

    let document = read_document(&cli.file)?;
    let violations = oak_publisher::validate(&schema, &document, kind.name());

    if violations.is_empty() {
        println!("✅ {} is valid ({})", cli.file.display(), kind);
    } else {
        println!("❌ {} has {} validation error(s):", cli.file.display(), violations.len());
        for violation in &violations {
            println!("   {}", violation);
        }
    }

    Ok(violations.len())
}

fn schema_hint(path: &Path) -> String {
    format!(
        "Schema not found: {}\nMake sure the schemas/ directory exists, pass --schemas <dir>, or use --builtin.",
        path.display()
    )
}
