//! Swarm Deploy Hook
//!
//! Usage:
//! - Normal mode: `swarm-deploy-hook`
//! - With custom port: `swarm-deploy-hook --port 8080`
//!
//! Everything else is configured through the environment (see `config`).

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use swarm_deploy_hook::config::env::constants::VERSION;
use swarm_deploy_hook::{telemetry, AppState, Settings};

/// 命令行参数
#[derive(Debug, Default)]
struct RuntimeConfig {
    port_override: Option<u16>,
}

fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--version" | "-V" => {
                println!("swarm-deploy-hook {}", VERSION);
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Swarm Deploy Hook - redeploy Docker Swarm services on registry push");
    println!();
    println!("USAGE:");
    println!("    swarm-deploy-hook [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -V, --version    Print version information");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    TOKEN / TOKEN_FILE          Bearer token expected from the registry (required)");
    println!("    USERNAME / USERNAME_FILE    Registry username (required)");
    println!("    PASSWORD / PASSWORD_FILE    Registry password (required)");
    println!("    REGISTRY                    Registry host for docker login");
    println!("    ENVIRONMENT                 Config section and tag prefix (default: production)");
    println!("    CONFIG_FILE                 Deployment target file (default: config.json)");
    println!("    WEBHOOK_FORMAT              registry | docker-hub (default: registry)");
    println!("    DOCKER                      Docker binary (default: /usr/bin/docker)");
    println!("    SLACK_WEBHOOK_URL           Incoming webhook for deployment notifications");
    println!("    DEPLOY_COMMAND_TIMEOUT_SECS Per-command timeout (default: none)");
    println!("    PORT                        Listening port (default: 3000)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let runtime = parse_args();

    telemetry::init_tracing("swarm-deploy-hook")?;

    let mut settings = Settings::load().context("Refusing to start")?;
    if let Some(port) = runtime.port_override {
        settings.env.port = port;
    }

    let state = Arc::new(
        AppState::from_settings(settings).context("Failed to initialize notifications")?,
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    swarm_deploy_hook::serve(state, shutdown).await
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
