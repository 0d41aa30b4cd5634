use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use agent_client::{ExecuteRequest, ExecutionController, LinkMonitor, LinkMonitorConfig};
use agentdeck_core::ExecutionStatus;
use anyhow::Result;
use clap::{Parser, Subcommand};
use events::{Event, EventBus};
use fleet::{AgentDispatchRegistry, HttpDispatchTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

#[derive(Parser)]
#[command(name = "agentdeck")]
#[command(about = "Operate a fleet of remote agent services", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the agent service
    #[arg(long, global = true, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a task and stream its output to stdout
    Run {
        /// Task description to execute
        task: String,

        /// Optional agent id to address
        #[arg(long)]
        agent: Option<String>,
    },
    /// Dispatch a task to a specific agent node
    Dispatch {
        /// Agent id to dispatch to
        agent: String,

        /// Task description
        task: String,
    },
    /// Probe the endpoint and report link health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentdeck=info,agent_client=warn,fleet=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { task, agent } => run(&cli.endpoint, task, agent).await,
        Commands::Dispatch { agent, task } => dispatch(&cli.endpoint, &agent, &task).await,
        Commands::Health => health(&cli.endpoint).await,
    }
}

async fn run(endpoint: &str, task: String, agent: Option<String>) -> Result<()> {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let controller = Arc::new(ExecutionController::new(
        format!("{endpoint}/execute"),
        bus,
    ));

    // Print deltas as they arrive.
    let printer = tokio::spawn(async move {
        while let Ok(envelope) = rx.recv().await {
            match envelope.event {
                Event::SessionOutput { delta, .. } => {
                    print!("{delta}");
                    let _ = std::io::stdout().flush();
                }
                Event::SessionArtifact { artifact, .. } => {
                    eprintln!("[artifact] {} ({})", artifact.name, artifact.kind.as_str());
                }
                Event::SessionFinished { .. } => break,
                _ => {}
            }
        }
    });

    // Ctrl-C cancels the run instead of killing the process outright.
    {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel();
            }
        });
    }

    let mut request = ExecuteRequest::new(task);
    if let Some(agent) = agent {
        request = request.with_agent(agent);
    }

    let session = controller.execute(&request).await?;
    let _ = printer.await;

    println!();
    println!(
        "status: {} ({}s, {} artifact(s))",
        session.status.as_str(),
        session.elapsed_seconds(),
        session.artifacts.len()
    );

    if session.status == ExecutionStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn dispatch(endpoint: &str, agent: &str, task: &str) -> Result<()> {
    let registry = AgentDispatchRegistry::new(
        Arc::new(HttpDispatchTransport::new(format!("{endpoint}/dispatch"))),
        EventBus::new(),
    );
    registry.register(agentdeck_core::AgentNode::new(
        agent,
        agent,
        agentdeck_core::AgentTier::Worker,
    ));

    match registry.dispatch(agent, task).await {
        Ok(ack) => {
            match ack.task_ref {
                Some(task_ref) => println!("dispatched: {task_ref}"),
                None => println!("dispatched"),
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("dispatch failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn health(endpoint: &str) -> Result<()> {
    let monitor = LinkMonitor::new(
        LinkMonitorConfig::new(format!("{endpoint}/health"))
            .with_interval(Duration::from_millis(100)),
        EventBus::new(),
    );
    let mut watcher = monitor.subscribe();
    monitor.start();

    // First tick fires immediately; give the probe a moment to settle.
    let _ = tokio::time::timeout(Duration::from_secs(6), watcher.changed()).await;
    println!("{}", monitor.status().as_str());
    monitor.stop();
    Ok(())
}
