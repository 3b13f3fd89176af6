use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod management_client;
mod utils;

use commands::fib::FibCommands;
use commands::rib::RibCommands;
use commands::status::{CsCommands, StrategyChoiceCommands};

/// µDCN Command Line Interface
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the level of verbosity
    #[clap(short, long, global = true)]
    verbose: bool,

    /// Path to the daemon's management socket
    #[clap(long, global = true, default_value = "/tmp/udcnd.sock")]
    socket: PathBuf,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the daemon's general status counters
    Status,

    /// Manage the forwarding table (FIB)
    Fib {
        #[clap(subcommand)]
        cmd: FibCommands,
    },

    /// Manage the content store
    Cs {
        #[clap(subcommand)]
        cmd: CsCommands,
    },

    /// Manage per-prefix strategy choice
    StrategyChoice {
        #[clap(subcommand)]
        cmd: StrategyChoiceCommands,
    },

    /// Manage the routing information base
    Rib {
        #[clap(subcommand)]
        cmd: RibCommands,
    },

    /// List connected faces
    Faces,

    /// Send an Interest and print the Data or Nack response
    Interest {
        /// Name to request (NDN URI format)
        name: String,

        /// Timeout in milliseconds
        #[clap(short, long, default_value = "4000")]
        timeout: u64,

        /// Router address to connect to (host:port)
        #[clap(short, long, default_value = "localhost:6367")]
        router: String,
    },

    /// Serve Data under a name over a standalone QUIC listener
    Publish {
        /// Name to publish under (NDN URI format)
        name: String,

        /// Content to publish (string)
        content: String,

        /// Freshness period in milliseconds
        #[clap(short, long, default_value = "60000")]
        ttl: u32,

        /// Address to listen on
        #[clap(short, long, default_value = "0.0.0.0:6367")]
        listen: String,

        /// Path to the TLS certificate
        #[clap(long, default_value = "cert.pem")]
        cert: PathBuf,

        /// Path to the TLS private key
        #[clap(long, default_value = "key.pem")]
        key: PathBuf,
    },

    /// Benchmark Interest/Data round trips against a running router
    Benchmark {
        /// Number of Interests to send
        #[clap(short, long, default_value = "1000")]
        count: usize,

        /// Name prefix to use for benchmark
        #[clap(short, long, default_value = "/benchmark")]
        prefix: String,

        /// Number of concurrent requests
        #[clap(short, long, default_value = "1")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" })).init();

    match cli.command {
        Commands::Status => commands::status::show_status(&cli.socket).await?,
        Commands::Faces => commands::status::show_faces(&cli.socket).await?,
        Commands::Fib { cmd } => commands::fib::handle_command(&cli.socket, cmd).await?,
        Commands::Cs { cmd } => commands::status::handle_cs_command(&cli.socket, cmd).await?,
        Commands::StrategyChoice { cmd } => commands::status::handle_strategy_choice_command(&cli.socket, cmd).await?,
        Commands::Rib { cmd } => commands::rib::handle_command(&cli.socket, cmd).await?,
        Commands::Interest { name, timeout, router } => commands::interest::send_interest(name, timeout, router).await?,
        Commands::Publish { name, content, ttl, listen, cert, key } => {
            commands::publish::publish_data(name, content, ttl, listen, cert, key).await?
        }
        Commands::Benchmark { count, prefix, concurrent } => commands::benchmark::run_benchmark(count, prefix, concurrent).await?,
    }

    Ok(())
}
