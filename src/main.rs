//! Reel binary entry point.

use std::io::Write;

use clap::Parser;
use reel::cli::{ChatArgs, Cli, Commands, ServeArgs};
use reel::config::ReelConfig;
use reel::runtime::{Runtime, RuntimeParts};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match ReelConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Serve(args) => handle_serve(config, args).await,
            Commands::Chat(args) => handle_chat(config, args).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(mut config: ReelConfig, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = args.bind {
        config.mcp.bind = bind;
    }
    let bind = config.mcp.bind.clone();
    let runtime = Runtime::init(config, RuntimeParts::local());

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "MCP gateway listening");
    let stop = runtime.shutdown_token();
    let served = axum::serve(listener, runtime.mcp_router())
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = stop.cancelled() => {}
            }
        })
        .await;

    runtime.shutdown().await;
    served?;
    Ok(())
}

async fn handle_chat(config: ReelConfig, args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::init(config, RuntimeParts::local());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprint!("> ");
    let _ = std::io::stderr().flush();
    let outcome: Result<(), Box<dyn std::error::Error>> = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e.into()),
        };
        let text = line.trim();
        if !text.is_empty() {
            match runtime
                .process_message(&args.session, &args.user, text, args.channel.as_deref(), Some("cli"), None)
                .await
            {
                Ok(reply) => println!("{reply}"),
                Err(e) => break Err(e.into()),
            }
        }
        eprint!("> ");
        let _ = std::io::stderr().flush();
    };

    runtime.shutdown().await;
    outcome
}
