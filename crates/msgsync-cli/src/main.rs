//! # msgsync demo
//!
//! Minimal chat-style demo: subscribes to a subject, publishes each stdin
//! line to it, and prints messages as the server delivers them.

use anyhow::{Context, Result};
use msgsync_client::{ClientCallbacks, ClientConfig, Subject, SyncClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    let subject_name = args.get(1).cloned().unwrap_or_else(|| "lobby".to_string());

    let config = ClientConfig::from_env().context("Failed to load configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        subject = %subject_name,
        "Starting msgsync demo"
    );

    let callbacks = ClientCallbacks::on_message(|message| {
        println!("[{}] #{} {}", message.subject.name, message.id, message.payload);
    });

    let client = SyncClient::new(config, callbacks).context("Failed to create client")?;
    let subject = Subject::new(subject_name);
    client.subscribe(&subject, Some(10), None);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read stdin")? {
                    Some(line) if !line.trim().is_empty() => {
                        client.send_message(&subject, line);
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    tracing::info!("Shutting down");
    client.shutdown().await;

    Ok(())
}

fn print_help() {
    println!(
        r#"msgsync demo

USAGE:
    msgsync [SUBJECT]

Subscribes to SUBJECT (default "lobby"), publishes each stdin line to it,
and prints messages as they arrive.

ENVIRONMENT:
    MSGSYNC_BASE_URL       Service base URL (HTTPS, required)
    MSGSYNC_CLIENT_ID      Stable client identity (required)
    MSGSYNC_TIMEOUT_SECS   Exchange timeout in seconds (default 10)
"#
    );
}
