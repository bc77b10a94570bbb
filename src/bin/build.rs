//! OAK Static Site Builder
//!
//! Generates servable OAK endpoints from a local source tree.
//!
//! ```text
//! oak-build <oak-dir> [output-dir]
//! ```

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use oak_publisher::{OakConfig, OutputFormat, SiteBuilder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oak-build")]
#[command(about = "Build static OAK endpoints from an agent's source directory")]
struct Cli {
    /// Source directory containing card.json, knowledge/ and trust/
    #[arg(value_name = "OAK_DIR")]
    source: PathBuf,

    /// Output directory (default: <OAK_DIR>/site)
    #[arg(value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
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
            eprintln!("Usage: oak-build <oak-dir> [output-dir]");
            process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = OakConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    let output = cli
        .output
        .unwrap_or_else(|| config.build.output_for(&cli.source));
    let mut options = config.build.site_options();
    if cli.compact {
        options.output_format = OutputFormat::Compact;
    }

    println!("Building OAK site: {} → {}", cli.source.display(), output.display());

    let report = SiteBuilder::new(options)
        .build(&cli.source, &output)
        .with_context(|| format!("writing site to {}", output.display()))?;

    for skipped in &report.skipped {
        println!("⚠️  Skipping invalid JSON: {}", skipped.path.display());
    }
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }

    if let Some(agent) = &report.card {
        println!("✅ Card: {}", agent);
    }
    println!("✅ Knowledge listing: {} artifact(s)", report.artifacts);
    println!("✅ Trust listing: {} assertion(s)", report.assertions);
    println!("✅ Services: {} service(s)", report.services);

    println!();
    println!("🌳 OAK site built at: {}", report.output_dir.display());
    println!("   Serve with any static file server or deploy to GitHub Pages.");

    Ok(())
}
