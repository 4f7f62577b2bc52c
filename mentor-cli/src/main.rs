//! mentor: terminal tutor
//!
//! Wires an OpenAI-compatible model endpoint into the tutoring engine and
//! runs an interactive session. Knowledge bases and review decks live
//! under the configured data directory.

mod config;
mod repl;
mod sm2;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use mentor_agent::{AgentService, LlmBackend, OpenAiBackend};
use mentor_engine::Orchestrator;

use config::CliConfig;
use repl::Repl;
use sm2::Sm2Scheduler;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "Conversational tutor that plans, teaches and reviews a topic")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mentor.yaml")]
    config: String,

    /// Data directory (knowledge bases and review decks)
    #[arg(short, long, env = "MENTOR_DATA_DIR")]
    data_dir: Option<String>,

    /// Learner ID (overrides config file)
    #[arg(short, long, env = "MENTOR_USER_ID")]
    user_id: Option<String>,

    /// API key for the model endpoint
    #[arg(long, env = "MENTOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "MENTOR_API_BASE")]
    api_base: Option<String>,

    /// Model name
    #[arg(long, env = "MENTOR_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive session (default)
    Chat,

    /// List stored topics
    Topics,

    /// Resume a stored topic, then continue interactively
    Learn {
        /// Topic name (approximate matches are accepted)
        topic: String,
    },

    /// Print the effective configuration as YAML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = Path::new(&cli.config);
    let mut config = CliConfig::load(config_path)?;

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.engine = config.engine.with_data_dir(PathBuf::from(data_dir));
    }
    if let Some(user_id) = cli.user_id {
        config.engine.user_id = user_id;
    }
    if let Some(api_key) = cli.api_key {
        config.backend.api_key = Some(api_key);
    }
    if let Some(api_base) = cli.api_base {
        config.backend.base_url = api_base;
    }
    if let Some(model) = cli.model {
        config.backend.model = model;
    }

    // Logs go to stderr so the session on stdout stays readable
    let level = &config.engine.general.log_level;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("mentor={}", level).parse()?)
                .add_directive(format!("mentor_engine={}", level).parse()?)
                .add_directive(format!("mentor_agent={}", level).parse()?),
        )
        .init();

    info!("Config file: {}", cli.config);
    if !config_path.exists() {
        info!("Config file not found, using defaults");
    }

    if let Some(Commands::Config) = cli.command {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    info!("Learner: {}", config.engine.user_id);
    info!("Knowledge dir: {}", config.engine.storage.knowledge_dir.display());
    info!("Review dir: {}", config.engine.storage.review_dir.display());
    info!("Model: {} at {}", config.backend.model, config.backend.base_url);

    let backend: Arc<dyn LlmBackend> = Arc::new(OpenAiBackend::new(
        config.backend.base_url.clone(),
        config.backend.model.clone(),
        config.backend.api_key.clone(),
    )?);
    let service = Arc::new(
        AgentService::new(vec![backend]).with_config(config.backend.service_config(&config.engine.user_id)),
    );

    let mut tutor = Orchestrator::new(config.engine, service.clone(), Box::new(Sm2Scheduler))?;

    match cli.command {
        Some(Commands::Topics) => {
            let topics = tutor.store().topics();
            if topics.is_empty() {
                println!("No topics stored yet.");
            }
            for topic in topics {
                println!("{}", topic);
            }
            Ok(())
        }
        Some(Commands::Learn { topic }) => {
            println!("{}\n", tutor.start_topic(&topic));
            Repl::new(tutor, service).run().await
        }
        Some(Commands::Chat) | Some(Commands::Config) | None => Repl::new(tutor, service).run().await,
    }
}
