//! Coffee Roast Logger - command line tool
//!
//! Reads the roast store written by roast sessions and prints or exports
//! what it holds.

use std::fs::File;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastlog::services::export::{export_file_name, export_timeline_csv};
use roastlog::services::{RoastHistory, RoastSummary};
use roastlog::{open_storage, AppError, Config};
use shared::{format_bytes, format_duration};

#[derive(Parser, Debug)]
#[command(name = "roastlog", version, about = "Coffee roast log viewer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved roasts, newest first
    List,
    /// Show approximate storage usage
    Status,
    /// List green coffees and their stock
    Coffees,
    /// Print the summary of one roast
    Show { roast_id: String },
    /// Write a roast timeline as CSV
    Export {
        roast_id: String,
        /// Output file; defaults to a name derived from the roast
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roastlog=info,shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let cli = Cli::parse();

    tracing::debug!("Environment: {}", config.environment);

    let mut storage = open_storage(&config)?;

    match cli.command {
        Command::List => {
            let roasts = storage.roasts();
            if roasts.is_empty() {
                println!("No roasts yet.");
            }
            for roast in roasts {
                let duration = format_duration(roast.duration);
                println!(
                    "{}  {}  {:<24}  {:>8}  {} points",
                    roast.id,
                    roast.start_time.format("%Y-%m-%d %H:%M"),
                    roast.coffee_name,
                    if duration.is_empty() { "-" } else { duration.as_str() },
                    roast.data_points.len()
                );
            }
        }
        Command::Status => {
            let status = storage.storage_status();
            println!(
                "{} of {} used ({:.1}%)",
                format_bytes(status.used),
                format_bytes(status.estimated),
                status.percentage
            );
            if status.is_near_limit {
                println!("Storage is nearly full. Delete old roasts to free space.");
            }
        }
        Command::Coffees => {
            for coffee in storage.green_coffees() {
                let stock = coffee
                    .inventory
                    .map(|g| format!("{}g", g.normalize()))
                    .unwrap_or_else(|| "-".to_string());
                let flag = if coffee.is_low_stock() { "  LOW STOCK" } else { "" };
                println!("{}  {:<24}  {:>8}{}", coffee.id, coffee.name, stock, flag);
            }
        }
        Command::Show { roast_id } => {
            let roast = RoastHistory::new(&mut storage).get(&roast_id).map_err(report)?;
            for line in RoastSummary::of(&roast).lines() {
                println!("{}", line);
            }
        }
        Command::Export { roast_id, path } => {
            let roast = RoastHistory::new(&mut storage).get(&roast_id).map_err(report)?;
            let path = path.unwrap_or_else(|| PathBuf::from(export_file_name(&roast)));
            let file = File::create(&path)?;
            export_timeline_csv(&roast, &storage.settings(), file).map_err(report)?;
            println!("Exported {} data points to {}", roast.data_points.len(), path.display());
        }
    }

    Ok(())
}

fn report(err: AppError) -> anyhow::Error {
    let detail = err.report();
    anyhow::anyhow!(detail.message)
}
