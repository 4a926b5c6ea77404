//! ragbridge CLI - corpus preparation, provisioning and ad-hoc questions

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ragbridge_core::models::AssistantId;
use ragbridge_core::poll::{PollPolicy, Poller, TokioClock};
use ragbridge_core::setup::DocumentOutcome;
use ragbridge_core::{
    Config, Dispatcher, OpenAiClient, ReadinessGate, RequestPipeline, SetupCoordinator,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod ask;

#[derive(Debug, Parser)]
#[command(
    name = "ragbridge",
    author,
    version,
    about = "Operator console for the ragbridge assistant bridge",
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an exported HTML page into the corpus document
    Prepare {
        /// HTML file to read
        input: PathBuf,

        /// Output path (defaults to the configured corpus document)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create an assistant and make sure the corpus holds the document
    Provision,

    /// Ask the assistant, once or interactively
    Ask {
        /// Question to ask; reads questions from stdin when omitted
        question: Option<String>,

        /// Use an existing assistant instead of provisioning a new one
        #[arg(long)]
        assistant: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::ensure_at(&config_path)?;

    match cli.command {
        Command::Prepare { input, output } => cmd_prepare(&config, &input, output),
        Command::Provision => cmd_provision(&config).await,
        Command::Ask {
            question,
            assistant,
        } => cmd_ask(&config, question, assistant).await,
        Command::Config { command } => match command.unwrap_or(ConfigCommand::Show) {
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigCommand::Path => {
                println!("{}", config_path.display());
                Ok(())
            }
        },
    }
}

fn cmd_prepare(config: &Config, input: &std::path::Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| config.corpus.document.clone());
    let lines = ragbridge_core::extract::prepare_document(input, &output)?;
    println!("Wrote {lines} lines to {}", output.display());
    Ok(())
}

fn setup_coordinator(config: &Config, client: &Arc<OpenAiClient>) -> SetupCoordinator {
    let bind_poller = Poller::new(Arc::new(TokioClock), PollPolicy::from(&config.polling.bind));
    SetupCoordinator::new(client.clone(), client.clone(), bind_poller, config)
}

async fn cmd_provision(config: &Config) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_config(config)?);
    let provisioned = setup_coordinator(config, &client).provision().await?;

    println!("Assistant: {}", provisioned.assistant);
    println!(
        "Corpus:    {}",
        provisioned
            .corpus
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string)
    );
    println!("Document:  {}", describe(&provisioned.document));
    Ok(())
}

async fn cmd_ask(config: &Config, question: Option<String>, assistant: Option<String>) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_config(config)?);
    let gate = ReadinessGate::new();

    match assistant {
        Some(id) => {
            gate.open(AssistantId::from(id));
        }
        None => {
            if setup_coordinator(config, &client).run(&gate).await.is_none() {
                anyhow::bail!("Setup failed; no assistant to ask");
            }
        }
    }

    let run_poller = Poller::new(Arc::new(TokioClock), PollPolicy::from(&config.polling.run));
    let pipeline = RequestPipeline::new(client, run_poller, config.notices.error.clone());
    let dispatcher = Dispatcher::new(gate, Arc::new(pipeline), &config.notices);

    if let Some(question) = question {
        println!("{}", dispatcher.dispatch(&question).await);
        return Ok(());
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let answered = ask::interactive(stdin, tokio::io::stdout(), &dispatcher).await?;
    info!(answered, "Session ended");
    Ok(())
}

fn describe(outcome: &DocumentOutcome) -> String {
    match outcome {
        DocumentOutcome::AlreadyPresent { files } => {
            format!("corpus already holds {files} file(s), nothing uploaded")
        }
        DocumentOutcome::Uploaded(file) => format!("uploaded and bound as {file}"),
        DocumentOutcome::MissingLocally(path) => format!("{} not found, corpus left empty", path.display()),
        DocumentOutcome::UploadFailed => "upload failed".to_string(),
        DocumentOutcome::BindFailed(file) => format!("uploaded as {file} but binding failed"),
        DocumentOutcome::ListingFailed => "could not list corpus files, upload skipped".to_string(),
        DocumentOutcome::CorpusUnavailable => "no corpus available".to_string(),
    }
}
