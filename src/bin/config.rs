//! OAK Config CLI
//!
//! View and manage configuration for the OAK tools.

use clap::{Parser, Subcommand};
use oak_publisher::schema_set::schema_path;
use oak_publisher::{DocumentKind, OakConfig};

#[derive(Parser)]
#[command(name = "oak-config")]
#[command(about = "View and manage OAK tool configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "oak.toml")]
        output: String,
    },

    /// Validate configuration and check that the schema files exist
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = OakConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 OAK Configuration\n");
                println!("Validate:");
                println!("  Schema dir: {:?}", cfg.schema_dir());

                println!("\nBuild:");
                println!("  Output subdir: {}", cfg.build.output_subdir);
                println!("  Format: {:?}", cfg.build.output_format);
                println!("  Refresh card stats: {}", cfg.build.refresh_card_stats);
            }
        }

        Commands::Init { output } => {
            let cfg = OakConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match OakConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                let schema_dir = cfg.schema_dir();
                let missing: Vec<_> = DocumentKind::ALL
                    .into_iter()
                    .map(|kind| schema_path(&schema_dir, kind))
                    .filter(|path| !path.is_file())
                    .collect();

                if missing.is_empty() {
                    println!("✅ Configuration is valid");
                    println!("   Schemas: {:?}", schema_dir);
                    println!("   Output subdir: {}", cfg.build.output_subdir);
                } else {
                    println!("❌ Missing schema file(s):");
                    for path in &missing {
                        println!("   {}", path.display());
                    }
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
