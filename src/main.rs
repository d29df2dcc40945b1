//! virttop - live resource view of libvirt domains.
//!
//! Usage:
//!   virttop                                  # local system hypervisor
//!   virttop -u qemu:///system -u qemu+ssh://lab/system
//!   virttop -a -d 2                          # running domains only, 2s refresh
//!   virttop --demo                           # in-memory hypervisors

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;

use virttop::app::{self, RunOptions};
use virttop::collectors::DEFAULT_NEIGHBOR_TABLE;
use virttop::config::{default_config_path, Config};
use virttop::hypervisor::Connector;
use virttop::hypervisor::mock::{MockConnector, DEMO_ENDPOINTS};
use virttop::logging;
use virttop::view::Palette;

const DEFAULT_URI: &str = "qemu:///system";

/// Live resource view of libvirt domains.
#[derive(Parser)]
#[command(name = "virttop", version, about = "Live resource view of libvirt domains")]
struct Args {
    /// Hypervisor connection URI. Repeat for several endpoints.
    #[arg(short = 'u', long = "uri", value_name = "URI", default_value = DEFAULT_URI)]
    uri: Vec<String>,

    /// Config file (default: $XDG_CONFIG_HOME/virttop/config.toml).
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only list running domains.
    #[arg(short = 'a', long)]
    active_only: bool,

    /// Log file (default: $TMPDIR/virttop.log).
    #[arg(short = 'l', long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Seconds between samples.
    #[arg(short = 'd', long, value_name = "SECS", default_value_t = 5.0)]
    delay: f64,

    /// Neighbor (ARP) table used to resolve IP addresses.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_NEIGHBOR_TABLE)]
    neighbors: PathBuf,

    /// Use in-memory demo hypervisors instead of libvirt.
    #[arg(long)]
    demo: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn connector(args: &Args) -> Result<Arc<dyn Connector>, String> {
    if args.demo {
        return Ok(Arc::new(MockConnector::demo()));
    }
    #[cfg(feature = "libvirt")]
    {
        Ok(Arc::new(virttop::hypervisor::libvirt::LibvirtConnector))
    }
    #[cfg(not(feature = "libvirt"))]
    {
        Err("built without libvirt support; rebuild with --features libvirt or pass --demo".to_string())
    }
}

fn main() {
    let mut args = Args::parse();
    if args.demo && args.uri == [DEFAULT_URI] {
        args.uri = DEMO_ENDPOINTS.iter().map(|e| e.to_string()).collect();
    }

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let log_path = args.log_file.clone().unwrap_or_else(logging::default_log_path);
    let _log_guard = match logging::init(&log_path, args.verbose) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: cannot open log file {}: {}", log_path.display(), e);
            std::process::exit(1);
        }
    };
    config.warn_unknown_keys();

    let connector = match connector(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let should_quit = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, Arc::clone(&should_quit)) {
            tracing::warn!(signal, error = %e, "cannot install signal handler");
        }
    }

    let options = RunOptions {
        connector,
        endpoints: args.uri,
        credentials: config.credentials(),
        neighbor_table: args.neighbors,
        active_only: args.active_only,
        delay: app::tick_interval(args.delay),
        palette: Palette::from(&config.color),
    };

    if let Err(e) = app::run(options, should_quit) {
        tracing::error!(error = %e, "dashboard failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_accepts_fractions() {
        let args = Args::try_parse_from(["virttop", "-d", "0.5"]).unwrap();
        assert_eq!(args.delay, 0.5);
        let args = Args::try_parse_from(["virttop"]).unwrap();
        assert_eq!(args.delay, 5.0);
        assert_eq!(args.uri, vec![DEFAULT_URI.to_string()]);
    }
}
