use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "zonal",
    about = "Zonal — hierarchical zone configuration and subzone spans",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Settings file
    #[arg(short, long, global = true, default_value = "zonal.toml")]
    config: PathBuf,
    /// Catalog snapshot (JSON) that targets are resolved against
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Database unqualified names resolve in
    #[arg(short, long, global = true)]
    database: Option<String>,
    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a zonal.toml
    Init {
        /// Directory to write zonal.toml into
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// redb file the scaffold points at
        #[arg(long, default_value = "zones.redb")]
        store: String,
    },
    /// Show the effective config at a target and who supplied it.
    ///
    /// Targets: `RANGE default`, `DATABASE d`, `TABLE d.t`, `INDEX d.t@i`,
    /// `PARTITION p OF TABLE d.t`, `PARTITION p OF INDEX d.t@i`.
    Show {
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
    },
    /// List every explicit zone and subzone record
    ShowAll,
    /// Set fields (or replace the record) at a target
    Set {
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
        /// Config as TOML, e.g. 'num_replicas = 5'
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        toml: Option<String>,
        /// Read the TOML config from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Replace the whole record instead of overlaying fields
        #[arg(long)]
        replace: bool,
    },
    /// Make a target inherit everything
    UseDefault {
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
    },
    /// Remove the explicit record at a target
    Discard {
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
    },
    /// Print the subzone spans of a table
    Spans {
        #[arg(required = true, num_args = 1..)]
        target: Vec<String>,
    },
}

fn init_tracing(configured: Option<&str>) -> anyhow::Result<()> {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(configured.unwrap_or("zonal=info"))?
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path, store } = &cli.command {
        init_tracing(None)?;
        return commands::init::init(path, store);
    }

    let settings = commands::load_settings(&cli.config)?;
    init_tracing(settings.logging.filter.as_deref())?;
    let ctx = commands::Context::open(
        settings,
        cli.catalog.as_deref(),
        cli.database.clone(),
        &cli.format,
    )?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Show { target } => commands::zone::show(&ctx, &target.join(" ")),
        Commands::ShowAll => commands::zone::show_all(&ctx),
        Commands::Set {
            target,
            toml,
            file,
            replace,
        } => {
            let raw = match (toml, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => anyhow::bail!("either --toml or --file is required"),
            };
            commands::zone::set(&ctx, &target.join(" "), &raw, replace)
        }
        Commands::UseDefault { target } => commands::zone::use_default(&ctx, &target.join(" ")),
        Commands::Discard { target } => commands::zone::discard(&ctx, &target.join(" ")),
        Commands::Spans { target } => commands::zone::spans(&ctx, &target.join(" ")),
    }
}
