use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nmap_inventory_rs::config::Config;
use nmap_inventory_rs::error::ScanError;
use nmap_inventory_rs::executor::NmapScanner;
use nmap_inventory_rs::inventory::{build_inventory, empty_host_vars};
use nmap_inventory_rs::parser::eligible_hosts;

/// nmap-inventory-rs — Ansible dynamic inventory of SSH-reachable hosts discovered via nmap.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nmap-inventory-rs",
    version,
    about = "Ansible dynamic inventory of SSH-reachable hosts discovered via nmap.",
    long_about = None,
    group(ArgGroup::new("mode").args(["list", "host"]))
)]
struct Cli {
    /// Print the full inventory of discovered hosts as JSON (the default mode).
    #[arg(long)]
    list: bool,

    /// Print the variables for one host as JSON. Always an empty set: every
    /// variable is delivered through `_meta` on --list.
    #[arg(long, value_name = "NAME")]
    host: Option<String>,

    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (written to stderr).
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    debug!(list = cli.list, host = ?cli.host, config = ?cli.config, "parsed command line");

    if let Some(name) = cli.host.as_deref() {
        debug!(host = name, "per-host variable lookup, returning empty vars");
        println!("{}", empty_host_vars());
        return Ok(());
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    let scanner = NmapScanner::new(config.timeout());
    let xml = scanner.scan(&config.address).await?;
    let hosts = eligible_hosts(&xml)?;
    // Zero eligible hosts almost always means a misconfigured target rather
    // than a legitimately empty network, so surface it as an error.
    if hosts.is_empty() {
        return Err(ScanError::NoEligibleHosts(config.address).into());
    }

    let inventory = build_inventory(&hosts);
    println!("{}", serde_json::to_string_pretty(&inventory)?);
    Ok(())
}

/// Logs go to stderr so the inventory JSON on stdout stays machine-readable.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
