//! ragbridge-server - WebSocket bridge to a hosted assistant

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ragbridge_core::poll::{PollPolicy, Poller, TokioClock};
use ragbridge_core::{Config, Dispatcher, OpenAiClient, ReadinessGate, RequestPipeline, SetupCoordinator};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod ws;

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let mut config = Config::ensure_at(&config_path)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let client = Arc::new(OpenAiClient::from_config(&config)?);
    let gate = ReadinessGate::new();

    let run_poller = Poller::new(Arc::new(TokioClock), PollPolicy::from(&config.polling.run));
    let pipeline = RequestPipeline::new(client.clone(), run_poller, config.notices.error.clone());
    let dispatcher = Dispatcher::new(gate.clone(), Arc::new(pipeline), &config.notices);

    let bind_poller = Poller::new(Arc::new(TokioClock), PollPolicy::from(&config.polling.bind));
    let setup = SetupCoordinator::new(client.clone(), client, bind_poller, &config);
    tokio::spawn(async move {
        setup.run(&gate).await;
    });

    let app = app::router(app::AppState::new(dispatcher, config.server.ordering));
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        ordering = ?config.server.ordering,
        "WebSocket server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[derive(Debug, Parser)]
#[command(author, version, about = "WebSocket bridge to a hosted assistant")]
struct Cli {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}
