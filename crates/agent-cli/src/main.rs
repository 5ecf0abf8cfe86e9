//! react-agent CLI
//!
//! Composition root: builds the tool registry, the model gateway, and the
//! agent, then runs either a single query (first argument) or an interactive
//! session. Every appended message is printed as the turn progresses.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{
    Agent, AgentConfig, CancelToken, ChatModel, Conversation, GenerationOptions, Message, Role,
    Session, ToolRegistry, TurnOptions,
};
use agent_runtime::OpenAiGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let model = std::env::var("OPENAI_MODEL")
        .context("OPENAI_MODEL must be set (e.g. in .env) to the model identifier to use")?;

    // Initialize the model gateway
    let gateway = Arc::new(OpenAiGateway::from_env()?);
    match gateway.health_check().await {
        Ok(true) => tracing::info!("✓ model endpoint reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ model endpoint not reachable - turns will fail");
            tracing::warn!("  check OPENAI_API_BASE_URL and OPENAI_API_KEY");
        }
    }

    // Aggregate tools from every provider
    let registry = Arc::new(ToolRegistry::aggregate(&agent_toolkit::providers())?);
    tracing::info!("registered {} tools:", registry.len());
    for name in registry.names() {
        tracing::info!("  • {}", name);
    }

    let config = AgentConfig::new(GenerationOptions::new(model));
    let agent = Arc::new(Agent::new(gateway, registry, config));

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        interactive(agent).await
    } else {
        one_shot(agent, query).await
    }
}

/// Run a single query and stream its messages to stdout
async fn one_shot(agent: Arc<Agent>, query: String) -> anyhow::Result<()> {
    let mut stream = agent.run_stream(Conversation::new(), query);

    while let Some(event) = stream.next().await {
        match event {
            Ok(message) => print_message(&message),
            Err(err) => {
                tracing::error!(%err, "turn failed");
                eprintln!("✗ {}", err.user_message());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Read queries line by line, keeping history in one session
async fn interactive(agent: Arc<Agent>) -> anyhow::Result<()> {
    use std::io::Write;

    let mut session = Session::new();
    println!("react-agent session {} (empty line to exit)", session.id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim().to_string();
        if query.is_empty() {
            break;
        }

        let cancel = CancelToken::new();
        let (progress, mut rx) = mpsc::unbounded_channel();

        let printer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                print_message(&message);
            }
        });
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let opts = TurnOptions {
            cancel,
            progress: Some(progress),
        };
        let outcome = agent.run_turn(&mut session.conversation, query, opts).await;

        watcher.abort();
        let _ = printer.await;
        session.touch();

        if let Err(err) = outcome {
            eprintln!("✗ {}", err.user_message());
        }
    }

    println!(
        "session '{}' ended after {} messages",
        session.title(),
        session.message_count()
    );
    Ok(())
}

fn print_message(message: &Message) {
    match message.role {
        Role::User => println!("you ▸ {}", message.content),
        Role::Assistant if !message.tool_calls.is_empty() => {
            for call in &message.tool_calls {
                let arguments =
                    serde_json::to_string(&call.arguments).unwrap_or_else(|_| "{}".into());
                println!("agent ▸ calling {}({})", call.name, arguments);
            }
            if !message.content.is_empty() {
                println!("agent ▸ {}", message.content);
            }
        }
        Role::Assistant => println!("agent ▸ {}", message.content),
        Role::Tool => println!("tool ▸ {}", message.content),
        Role::System => {}
    }
}
