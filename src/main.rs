//! parcel-crawler - Parcel record extraction and jurisdiction validation CLI
//!
//! Drives the extraction pipeline offline against saved panel HTML and
//! recorded snapshots.

use anyhow::Result;
use clap::{Parser, Subcommand};
use parcel_crawler::commands::{ExtractCommand, MapCommand, PlanCommand};
use parcel_crawler::config::{Config, OutputFormat};
use parcel_crawler::regrid::{Jurisdiction, QualityMode, SearchInput};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "parcel-crawler",
    version,
    about = "Parcel record extraction and jurisdiction validation",
    long_about = "Extracts parcel records from map viewer detail panels, maps them to a canonical schema and validates them against the requested jurisdiction."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Map viewer root URL
    #[arg(long, global = true, env = "REGRID_BASE_URL")]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ordered search strategies for a parcel
    Plan {
        /// Parcel identifier as listed by the county
        parcel: String,

        /// Situs address
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Map and validate a saved detail panel
    #[command(alias = "m")]
    Map {
        /// Saved panel HTML file
        panel: PathBuf,

        /// Two-letter state code
        #[arg(long)]
        state: String,

        /// County name
        #[arg(long)]
        county: String,
    },

    /// Run the full extraction against recorded panel snapshots
    #[command(alias = "r")]
    Replay {
        /// Directory of <query>.html snapshots
        #[arg(short, long)]
        snapshots: PathBuf,

        /// Parcel identifier(s)
        #[arg(required = true)]
        parcels: Vec<String>,

        /// Two-letter state code
        #[arg(long)]
        state: String,

        /// County name
        #[arg(long)]
        county: String,

        /// Situs address (single parcel only)
        #[arg(short, long)]
        address: Option<String>,

        /// Capture quality carried through to the record
        #[arg(long, default_value = "standard")]
        quality: QualityMode,
    },

    /// List known jurisdiction bounding boxes
    Jurisdictions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    match cli.command {
        Commands::Plan { parcel, address } => {
            // Jurisdiction does not affect strategy order
            let mut input = SearchInput::new(parcel, Jurisdiction::new("", ""));
            input.address = address;

            println!("{}", PlanCommand::new(config).execute(&input));
        }

        Commands::Map { panel, state, county } => {
            let jurisdiction = Jurisdiction::new(state, county);
            let output = MapCommand::new(config).execute(&panel, &jurisdiction)?;
            println!("{}", output);
        }

        Commands::Replay { snapshots, parcels, state, county, address, quality } => {
            let jurisdiction = Jurisdiction::new(state, county);
            let cmd = ExtractCommand::new(config);

            let output = if parcels.len() == 1 {
                let mut input = SearchInput::new(parcels[0].clone(), jurisdiction)
                    .with_quality_mode(quality);
                input.address = address;
                cmd.execute(&snapshots, &input).await?
            } else {
                if address.is_some() {
                    eprintln!("Ignoring --address for multiple parcels");
                }
                let inputs: Vec<SearchInput> = parcels
                    .into_iter()
                    .map(|p| SearchInput::new(p, jurisdiction.clone()).with_quality_mode(quality))
                    .collect();
                cmd.execute_batch(&snapshots, &inputs).await?
            };

            println!("{}", output);
        }

        Commands::Jurisdictions => {
            println!("Known jurisdiction bounding boxes:\n");
            println!(
                "{:<6} {:<14} {:>8} {:>8} {:>9} {:>9}",
                "State", "County", "Min lat", "Max lat", "Min lon", "Max lon"
            );
            println!("{:-<6} {:-<14} {:->8} {:->8} {:->9} {:->9}", "", "", "", "", "", "");

            for entry in config.bounds_table().entries() {
                println!(
                    "{:<6} {:<14} {:>8.2} {:>8.2} {:>9.2} {:>9.2}",
                    entry.state,
                    entry.county.as_deref().unwrap_or("(state)"),
                    entry.min_lat,
                    entry.max_lat,
                    entry.min_lon,
                    entry.max_lon
                );
            }
        }
    }

    Ok(())
}
