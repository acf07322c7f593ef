use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config::load_settings, ClientEvent, GameClient, SystemClock, ViewController, ViewEvent,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
    time::Instant as TokioInstant,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{dispatch_pull, parse_command, Command, HELP};

#[derive(Parser, Debug)]
#[command(about = "Play tug of war from the terminal")]
struct Args {
    /// WebSocket endpoint of the game server, e.g. ws://localhost:3000/ws
    #[arg(long)]
    server_url: Option<String>,
    /// Number of pull notices kept on screen
    #[arg(long)]
    log_capacity: Option<usize>,
    /// TOML config file (defaults to ./client.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // The screen owns stdout, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.server_url {
        settings.server_url = url;
    }
    if let Some(capacity) = args.log_capacity {
        settings.log_capacity = capacity;
    }

    let (client, mut events) = GameClient::connect(&settings.server_url)
        .await
        .with_context(|| format!("could not join game at {}", settings.server_url))?;
    info!(url = client.url(), "joined game");

    let mut controller = ViewController::new(SystemClock, settings.log_capacity);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notice: Option<String> = None;
    let mut connected = true;

    draw(&controller, notice.as_deref(), connected)?;

    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            event = events.recv(), if connected => match event {
                Ok(ClientEvent::Update(update)) => {
                    let applied = controller.apply_update(update);
                    for event in applied.events {
                        if let ViewEvent::RoundWon { notice: text, .. } = event {
                            notice = Some(text);
                        }
                    }
                    draw(&controller, notice.as_deref(), connected)?;
                }
                Ok(ClientEvent::Error(message)) => warn!(%message, "server error"),
                Ok(ClientEvent::Disconnected) | Err(RecvError::Closed) => {
                    connected = false;
                    draw(&controller, notice.as_deref(), connected)?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "fell behind the server; skipping stale states");
                }
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Some(Command::Pull(side)) => {
                        notice = None;
                        if connected {
                            dispatch_pull(&client, side).await;
                        }
                    }
                    Some(Command::Help) => println!("{HELP}"),
                    Some(Command::Quit) => break,
                    Some(Command::Unknown(input)) => println!("unknown command: {input} ({HELP})"),
                    None => {}
                }
            },
            _ = sleep_until(deadline) => {
                if controller.tick() {
                    draw(&controller, notice.as_deref(), connected)?;
                }
            }
        }
    }

    client.close().await;
    Ok(())
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(TokioInstant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn draw(
    controller: &ViewController<SystemClock>,
    notice: Option<&str>,
    connected: bool,
) -> Result<()> {
    let screen = render::render_screen(
        controller.frame(),
        &controller.pulse(),
        controller.log(),
        notice,
        connected,
    );
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(screen.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
