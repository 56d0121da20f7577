//! Parley host entry point.
//!
//! Reads lines from stdin and routes them to the engine: directives drive the
//! chatbox directly; everything else has its command blocks executed and its
//! remaining prose queued for the chatbox.

mod input;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use input::{route, spawn_line_reader, InputAction};
use parley_core::{ExecutionOutcome, ParleyEngine, UdpTransport};
use settings::{load_settings, save_settings, settings_path};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info".parse().unwrap()),
        )
        .init();

    let path = settings_path();
    let app_settings = load_settings(&path);
    if !path.exists() {
        if let Err(e) = save_settings(&path, &app_settings) {
            warn!(path = %path.display(), "could not write default settings: {e}");
        }
    }
    info!(
        path = %path.display(),
        host = %app_settings.osc_host,
        port = app_settings.osc_port,
        "settings loaded"
    );

    let transport =
        Arc::new(UdpTransport::bind(app_settings.typing_target()).context("bind UDP transport")?);
    let engine = Arc::new(ParleyEngine::new(app_settings.engine_config(), transport));
    engine.start().context("start engine")?;

    let mut events_rx = engine.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!(target: "parley::events", "{json}"),
                    Err(e) => warn!("serialize outbound event: {e}"),
                },
                Err(RecvError::Lagged(n)) => {
                    warn!("outbound event receiver lagged by {n} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("spawn stdin reader")?;
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => handle_line(&engine, &line),
                None => {
                    info!("stdin closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    let snapshot = engine.diagnostics_snapshot();
    engine.stop().context("stop engine")?;
    info!(
        messages = snapshot.messages_sent,
        notifications = snapshot.notifications_sent,
        failures = snapshot.send_failures,
        "parley exiting"
    );
    Ok(())
}

fn handle_line(engine: &Arc<ParleyEngine>, line: &str) {
    let action = match route(line) {
        Ok(Some(action)) => action,
        Ok(None) => return,
        Err(e) => {
            warn!("{e}");
            return;
        }
    };

    let outbound = engine.outbound();
    let result = match action {
        InputAction::Notify { category, text } => outbound.set_notification(&text, category),
        InputAction::Clear => outbound.clear(),
        InputAction::Typing(typing) => outbound.set_typing(typing),
        InputAction::Say(text) => {
            match engine.execute(&text) {
                Ok(Some(handle)) => {
                    tokio::task::spawn_blocking(move || match handle.join() {
                        Ok(report) if report.outcome == ExecutionOutcome::Completed => {
                            debug!(batch = report.batch_id, sent = report.sent, "batch finished");
                        }
                        Ok(report) => {
                            warn!(batch = report.batch_id, outcome = ?report.outcome, "batch incomplete");
                        }
                        Err(_) => warn!("command batch thread panicked"),
                    });
                }
                Ok(None) => {}
                Err(e) => warn!("execute failed: {e}"),
            }

            let prose = engine.parser().strip_commands(&text);
            if prose.is_empty() {
                Ok(())
            } else {
                outbound.enqueue(&prose)
            }
        }
    };

    if let Err(e) = result {
        warn!("outbound request rejected: {e}");
    }
}
