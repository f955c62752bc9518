//! Example driver binary: loads configuration, wires a live LLM provider
//! and the scaffolding tool registry into the engine, and runs a single
//! plan/fetch-execute/join loop for a user-supplied query.

mod init;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use taskgraph_core::config::{load_config, EngineConfig, LlmConfig};
use taskgraph_core::llm::LlmClient;
use taskgraph_core::tools::ToolRegistry;
use taskgraph_llm::{ClaudeClient, OpenAiClient, RemoteLlmConfig, ScriptedProvider};
use taskgraph_tools::tools::{CreateDirectoryTool, CreateFileTool, GenerateFileContentTool};

#[derive(Parser)]
#[command(name = "taskgraph")]
#[command(about = "Plan, fetch-execute, and join compiler for multi-step tasks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration and exit.
    Init,
    /// Run a single query through the plan/fetch-execute/join loop.
    Run {
        /// The task to accomplish, in natural language.
        query: String,

        /// Directory scaffolding tools are confined to.
        #[arg(long, default_value = "./workspace")]
        workspace: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config().await.context("failed to load configuration")?;
    init::init_tracing(&config.logging);

    match cli.command {
        Commands::Init => {
            println!("{config:#?}");
            Ok(())
        }
        Commands::Run { query, workspace } => run(query, workspace, config).await,
    }
}

async fn run(query: String, workspace: PathBuf, config: EngineConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&workspace)
        .await
        .with_context(|| format!("failed to create workspace directory: {}", workspace.display()))?;

    let llm = build_llm_client(&config.llm)?;

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CreateDirectoryTool::new(workspace.clone())));
    registry.register(Arc::new(CreateFileTool::new(workspace)));
    registry.register(Arc::new(GenerateFileContentTool::new(Arc::clone(&llm))));

    let outcome = taskgraph_core::controller::run(query, llm, registry, config.execution).await?;
    println!("{}", outcome.final_response);
    Ok(())
}

fn build_llm_client(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    match config.provider.as_str() {
        "scripted" => Ok(Arc::new(ScriptedProvider::new(Vec::<String>::new()))),
        "openai" => {
            let env_var = init::credential_env_var("openai");
            let api_key = taskgraph_core::init::require_credential(&config.api_key, env_var)?;
            let base_url = config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            let remote = RemoteLlmConfig::new(api_key, base_url, config.model.clone());
            Ok(Arc::new(OpenAiClient::new(remote)))
        }
        "anthropic" => {
            let env_var = init::credential_env_var("anthropic");
            let api_key = taskgraph_core::init::require_credential(&config.api_key, env_var)?;
            let base_url = config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com/v1".to_string());
            let remote = RemoteLlmConfig::new(api_key, base_url, config.model.clone());
            Ok(Arc::new(ClaudeClient::new(remote)))
        }
        other => bail!("unknown llm provider: {other}"),
    }
}
