//! p2pchat CLI
//!
//! Thin wrapper around p2pchat-core for running either role.
//!
//! ## Usage
//!
//! ```bash
//! # Start the directory
//! p2pchat directory --bind 127.0.0.1:8080
//!
//! # Start a node and register it as "alice"
//! p2pchat node --username alice --http-addr 127.0.0.1:8081
//!
//! # Talk to the node's control plane
//! curl -X POST localhost:8081/send -d '{"to_username":"bob","content":"hi"}' \
//!      -H 'content-type: application/json'
//! curl 'localhost:8081/inbox?after='
//! curl localhost:8081/me
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use p2pchat_core::config::{DEFAULT_DIRECTORY_ADDR, DEFAULT_DIRECTORY_URL, DEFAULT_HTTP_ADDR, DEFAULT_USERNAME};
use p2pchat_core::logging::JsonlLayer;
use p2pchat_core::{
    directory, ChatNode, DirectoryConfig, EphemeralIdentity, FileIdentity, IdentityStore, NodeBootstrap, NodeConfig, Registry,
    DEFAULT_INBOX_CAPACITY,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::prelude::*;

/// p2pchat - username directory and peer-to-peer chat
#[derive(Parser)]
#[command(name = "p2pchat")]
#[command(version)]
#[command(about = "p2pchat - username directory and peer-to-peer chat")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write JSONL logs under this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the username directory
    Directory {
        /// Address to listen on
        #[arg(short, long, env = "ADDR", default_value = DEFAULT_DIRECTORY_ADDR)]
        bind: SocketAddr,
    },

    /// Run a chat node
    Node {
        /// Username to register under
        #[arg(short, long, env = "MYNAMEIS", default_value = DEFAULT_USERNAME)]
        username: String,

        /// Address of the local control plane
        #[arg(long, env = "HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
        http_addr: SocketAddr,

        /// Base URL of the directory
        #[arg(short, long, env = "DIRECTORY_URL", default_value = DEFAULT_DIRECTORY_URL)]
        directory_url: String,

        /// Comma-separated bootstrap peers (<addr>/p2p/<peer-id>)
        #[arg(short, long, env = "BOOTSTRAP_ADDRS", default_value = "")]
        bootstrap: String,

        /// Keep the peer id across restarts by storing the key here
        #[arg(long)]
        identity_file: Option<PathBuf>,

        /// Do not use relay servers
        #[arg(long)]
        no_relay: bool,

        /// Maximum number of messages kept in the inbox
        #[arg(long, default_value_t = DEFAULT_INBOX_CAPACITY)]
        inbox_capacity: usize,
    },
}

fn setup_logging(verbosity: u8, log_dir: Option<&PathBuf>, instance: &str) -> Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let jsonl = log_dir
        .map(|dir| JsonlLayer::new(dir, instance))
        .transpose()
        .with_context(|| format!("Failed to open log directory {:?}", log_dir))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(jsonl)
        .init();
    Ok(())
}

async fn run_directory(config: DirectoryConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind directory on {}", config.bind_addr))?;
    println!("Directory listening on http://{}", listener.local_addr()?);

    let registry = Arc::new(Registry::new());
    tokio::select! {
        result = directory::serve(listener, registry) => result?,
        _ = tokio::signal::ctrl_c() => println!("Shutting down"),
    }
    Ok(())
}

async fn run_node(config: NodeConfig, identity_file: Option<PathBuf>) -> Result<()> {
    let identity: Box<dyn IdentityStore> = match identity_file {
        Some(path) => Box::new(FileIdentity::new(path)),
        None => Box::new(EphemeralIdentity),
    };

    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Failed to bind control plane on {}", config.http_addr))?;

    let bootstrap = NodeBootstrap::start(config, identity.as_ref()).await?;
    let node = Arc::new(bootstrap.register().await.context("Could not register with directory")?);

    let info = node.info();
    println!("Node '{}' registered", info.username);
    println!("  Peer ID: {}", info.peer_id);
    for addr in &info.addrs {
        println!("  Addr:    {}", addr);
    }
    println!("  API:     http://{}", listener.local_addr()?);

    tokio::spawn(print_arrivals(node.clone()));

    tokio::select! {
        result = node.clone().serve(listener) => result?,
        _ = tokio::signal::ctrl_c() => println!("Shutting down"),
    }
    node.shutdown().await?;
    Ok(())
}

async fn print_arrivals(node: Arc<ChatNode>) {
    let mut arrivals = node.inbox().subscribe();
    loop {
        match arrivals.recv().await {
            Ok(message) => println!("[{}] {}: {}", message.timestamp.format("%H:%M:%S"), message.from_user, message.content),
            Err(RecvError::Lagged(skipped)) => println!("({} messages not shown)", skipped),
            Err(RecvError::Closed) => return,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Directory { bind } => {
            setup_logging(cli.verbose, cli.log_dir.as_ref(), "directory")?;
            run_directory(DirectoryConfig { bind_addr: bind }).await
        }

        Commands::Node {
            username,
            http_addr,
            directory_url,
            bootstrap,
            identity_file,
            no_relay,
            inbox_capacity,
        } => {
            setup_logging(cli.verbose, cli.log_dir.as_ref(), &username)?;
            let config = NodeConfig::new(username)
                .with_http_addr(http_addr)
                .with_directory_url(directory_url)
                .with_bootstrap(NodeConfig::parse_bootstrap(&bootstrap))
                .with_relay(!no_relay)
                .with_inbox_capacity(inbox_capacity);
            run_node(config, identity_file).await
        }
    }
}
