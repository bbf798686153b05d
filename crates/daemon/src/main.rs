// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ahd: the autoheal daemon

use ah_adapters::{CliGit, ConfiguredRepair, DockerAdapter};
use ah_core::{CredentialResolver, SystemClock};
use ah_daemon::{env, router, Config};
use ah_engine::Orchestrator;
use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "ah_daemon=info,ah_engine=info,ah_adapters=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    std::fs::create_dir_all(&config.state_dir)
        .with_context(|| format!("failed to create {}", config.state_dir.display()))?;
    let _guard = init_tracing(&config)?;

    let credentials = CredentialResolver::new(config.github_token.clone());
    tracing::info!(
        version = env::VERSION,
        state_dir = %config.state_dir.display(),
        workspace_dir = %config.workspace_dir.display(),
        has_fallback_token = credentials.has_fallback(),
        repair = config.repair_command.is_some(),
        "starting daemon"
    );

    let container = DockerAdapter::new()
        .bin(config.docker_bin.as_str())
        .build_timeout(config.build_timeout);
    let git = CliGit::new().timeout(config.git_timeout);
    let repair =
        ConfiguredRepair::from_command(config.repair_command.clone(), config.repair_timeout);
    let orchestrator = Orchestrator::new(
        container,
        git,
        repair,
        config.orchestrator()?,
        credentials,
        SystemClock,
    );

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "listening");

    axum::serve(listener, router(orchestrator.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutting down");
    orchestrator.shutdown().await;
    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    let dir = config.log_path.parent().unwrap_or(&config.state_dir);
    let file_name = config
        .log_path
        .file_name()
        .context("log path has no file name")?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(guard)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
