//! kook-listen - KOOK gateway listener
//!
//! Connects a bot to the gateway and prints the selected event categories
//! until interrupted.

use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use kook_cli::cli::{Cli, Commands, Format, ListenArgs};
use kook_cli::listen::{Exit, print_until_stopped};
use kook_cli::output;
use kook_gateway::{EventCategory, GatewayConfig, GatewayError, GatewayEvent, GatewayManager};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("kook_gateway=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen(args) => listen(&args, cli.format).await?,
        Commands::InitConfig { output } => init_config(&output)?,
        Commands::Categories => {
            let mut stdout = io::stdout().lock();
            for category in EventCategory::ALL {
                writeln!(stdout, "{category}")?;
            }
        }
    }

    Ok(())
}

async fn listen(args: &ListenArgs, format: Format) -> anyhow::Result<()> {
    let config = args.gateway_config()?;
    info!(
        api_base = %config.api_base,
        compress = config.compress,
        auto_reconnect = config.auto_reconnect,
        "starting gateway listener"
    );

    let manager = GatewayManager::new(&config);
    let (lines_tx, mut lines) = mpsc::unbounded_channel::<String>();
    for category in args.categories() {
        let tx = lines_tx.clone();
        manager.dispatcher().on(category, move |payload: &GatewayEvent| {
            let _ = tx.send(output::render(format, category, payload));
        });
    }
    drop(lines_tx);
    let mut errors = manager.dispatcher().subscribe(EventCategory::Error);

    tokio::select! {
        result = manager.connect() => match result {
            Ok(()) => info!("connected to gateway"),
            Err(GatewayError::Connection(reason)) if config.auto_reconnect => {
                warn!(%reason, "initial connection failed, retrying in background");
            }
            Err(e) => return Err(e.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            manager.disconnect().await;
            return Ok(());
        }
    }

    let mut stdout = io::stdout();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    let exit = print_until_stopped(&mut lines, &mut errors, shutdown, &mut stdout).await?;
    manager.disconnect().await;

    match exit {
        Exit::Interrupted => {
            info!("interrupted, disconnected");
            Ok(())
        }
        Exit::Fatal(err) => Err(err.into()),
    }
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    let sample = GatewayConfig::new("<bot token>");
    let json = serde_json::to_string_pretty(&sample)?;
    std::fs::write(path, format!("{json}\n"))?;
    info!(path = %path.display(), "wrote sample config");
    Ok(())
}
