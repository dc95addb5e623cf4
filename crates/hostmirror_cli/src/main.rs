//! hostmirror CLI
//!
//! Runs either side of a hostmirror deployment.
//!
//! # Commands
//!
//! - `serve` - Watch a storage root and serve per-host version maps
//! - `client` - Keep a local directory mirrored from a server
//! - `scan` - Print a directory's version map

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mirror per-host file trees from a central server.
#[derive(Parser)]
#[command(name = "hostmirror")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the storage root over HTTP
    Serve {
        /// Storage root; one subdirectory per host
        #[arg(short, long, default_value = "../testserverpath")]
        root: PathBuf,

        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Quiet period before a burst of changes triggers a rebuild
        #[arg(long, default_value = "250")]
        debounce_ms: u64,
    },

    /// Mirror this host's files from a server
    Client {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:8000")]
        server: String,

        /// Local directory to keep in sync
        #[arg(short, long, default_value = "clientfiles")]
        dir: PathBuf,

        /// Host id to sync as (defaults to the machine hostname)
        #[arg(long)]
        hostname: Option<String>,

        /// Seconds between passes
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Print the version map of a directory
    Scan {
        /// Directory to scan
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Show version information
    Version,
}

/// Output format for `scan`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One `name<TAB>mtime` line per file
    Text,
    /// The map as a JSON object
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            root,
            bind,
            debounce_ms,
        } => {
            commands::serve::run(root, bind, debounce_ms)?;
        }
        Commands::Client {
            server,
            dir,
            hostname,
            interval,
            timeout,
            once,
        } => {
            let options = commands::client::ClientOptions {
                server,
                dir,
                hostname,
                interval,
                timeout,
                once,
            };
            commands::client::run(options)?;
        }
        Commands::Scan { dir, format } => {
            commands::scan::run(&dir, format == Format::Json)?;
        }
        Commands::Version => {
            println!("hostmirror v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
