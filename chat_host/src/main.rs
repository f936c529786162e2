use anyhow::{anyhow, Context, Result};
use chat_host::ai_client::{create_provider, LlmProvider, ProviderChain};
use chat_host::config::HostConfig;
use chat_host::conversation_state::{format_chat_message, format_tool_response, ConversationContext};
use chat_host::web_interface::{create_router, WebAppState};
use chat_host::{ChatTurnResult, DispatchError, DispatchSettings, Dispatcher, PatternRegistry};
use console::style;
use log::{info, warn};
use mcp_tools::{create_tools, ToolRegistry};
use shared_protocol_objects::Role;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

struct Args {
    config: Option<PathBuf>,
    serve: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        config: None,
        serve: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config needs a file path"))?;
                parsed.config = Some(PathBuf::from(path));
            }
            "serve" => parsed.serve = true,
            other => {
                return Err(anyhow!(
                    "Unknown argument {}\nUsage: chat_host [--config <file>] [serve]",
                    other
                ))
            }
        }
    }
    Ok(parsed)
}

fn build_llm(config: &HostConfig) -> Arc<dyn LlmProvider> {
    let mut providers = Vec::new();
    for settings in config.provider_order() {
        match create_provider(settings, config.request_timeout()) {
            Ok(provider) => providers.push(provider),
            Err(e) => warn!("Skipping LLM provider {}: {:#}", settings.name, e),
        }
    }
    let chain = ProviderChain::new(providers);
    if chain.is_empty() {
        warn!("No LLM provider available; unmatched messages will fail");
    }
    Arc::new(chain)
}

async fn build_dispatcher(config: &HostConfig) -> Result<Dispatcher> {
    let tools = create_tools(&config.tool_settings())
        .await
        .context("Failed to initialize tools")?;
    let tools = Arc::new(ToolRegistry::with_tools(tools));
    let registry = Arc::new(PatternRegistry::builtin()?);
    let settings = DispatchSettings {
        confidence_threshold: config.confidence_threshold,
        provider_hint: Some(config.default_provider.clone()),
        generation: config.generation(),
    };
    let dispatcher = Dispatcher::from_parts(registry, tools, build_llm(config), settings)?;
    Ok(dispatcher)
}

fn print_commands(dispatcher: &Dispatcher) {
    println!("{}", style("Supported commands:").cyan().bold());
    for command in dispatcher.commands() {
        println!(
            "  {} {}",
            style(format!("{}/{}", command.server, command.tool)).yellow(),
            command.description
        );
        for example in command.examples.iter().take(2) {
            println!("      e.g. {}", style(example).dim());
        }
    }
    println!("  {} clear history   {} exit", style("/clear").yellow(), style("/quit").yellow());
}

async fn run_cli(dispatcher: &Dispatcher) -> Result<()> {
    println!("{}", style("Chat host. Type /commands for help, /quit to leave.").cyan().bold());
    let mut context = ConversationContext::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/commands" | "/help" => {
                print_commands(dispatcher);
                continue;
            }
            "/clear" => {
                context.clear();
                println!("{}", style("History cleared.").green());
                continue;
            }
            _ => {}
        }

        match dispatcher.dispatch(input, &context).await {
            Ok(turn) => {
                match &turn {
                    ChatTurnResult::Tool { tool, rendered, .. } => {
                        println!("{}", format_tool_response(tool, rendered))
                    }
                    ChatTurnResult::Llm { text, .. } => {
                        println!("{}", format_chat_message(Role::Assistant, text))
                    }
                }
                context.record_turn(input, turn.text());
            }
            Err(DispatchError::CollaboratorUnavailable { provider, message }) => {
                warn!("{} failed: {}", provider, message);
                println!(
                    "{}",
                    style("Sorry, I could not get a response right now.").red().bold()
                );
                for hint in dispatcher.suggest(input) {
                    println!("  {}", hint);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let config = HostConfig::load(args.config.as_deref())?;
    info!("Starting chat_host");
    let dispatcher = Arc::new(build_dispatcher(&config).await?);

    if args.serve {
        let app = create_router(WebAppState::new(dispatcher));
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
        println!("Web interface running at http://{}", config.bind_addr);
        axum::serve(listener, app).await?;
    } else {
        run_cli(&dispatcher).await?;
    }
    Ok(())
}
