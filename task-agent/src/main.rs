//! Interactive CLI driver for the task agent.
//!
//! Runs one workflow to completion, reading clarification replies from stdin
//! whenever the run suspends.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use task_agent_sdk::{NullSink, StderrSink};

use task_agent::agent::{RunOutcome, TaskAgent, WorkflowState};
use task_agent::config::AgentConfig;
use task_agent::database::SqliteTaskStore;
use task_agent::reasoning::OpenAiReasoning;

#[derive(Parser, Debug)]
#[command(name = "task-agent", about = "Confirm and persist a task from a raw request")]
struct Args {
    /// The raw task request to process.
    input: String,

    /// Path to the task database (overrides TASK_AGENT_DB).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Model name (overrides TASK_AGENT_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Consecutive-failure budget per checkpoint (overrides TASK_AGENT_RETRY_LIMIT).
    #[arg(long)]
    retry_limit: Option<u32>,

    /// Emit machine-readable event lines on stderr.
    #[arg(long)]
    events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("task_agent=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = AgentConfig::from_env()?;
    if let Some(db) = args.db {
        config.database_path = db;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(limit) = args.retry_limit {
        config.retry_limit = limit;
    }

    let store = Arc::new(
        SqliteTaskStore::new(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?,
    );
    let reasoning = Arc::new(
        OpenAiReasoning::new(config.api_key)
            .with_model(config.model)
            .with_base_url(config.base_url),
    );
    let agent = if args.events {
        TaskAgent::new(reasoning, store).with_events(Arc::new(StderrSink))
    } else {
        TaskAgent::new(reasoning, store).with_events(Arc::new(NullSink))
    };

    let mut state = WorkflowState::with_retry_limit(args.input, config.retry_limit)?;
    let mut outcome = agent.run(&mut state).await?;

    let stdin = std::io::stdin();
    loop {
        match outcome {
            RunOutcome::NeedsInput { prompt } => {
                println!("{}\n", prompt);
                print!("> ");
                std::io::stdout().flush()?;
                let mut reply = String::new();
                stdin.lock().read_line(&mut reply)?;
                outcome = agent.resume(&mut state, reply.trim_end()).await?;
            }
            RunOutcome::Complete(task) => {
                println!("Task confirmed ({})", task.id);
                println!("  {}", task.task);
                for (index, subtask) in task.subtasks.iter().enumerate() {
                    println!("  {}. {}", index + 1, subtask);
                }
                return Ok(());
            }
        }
    }
}
