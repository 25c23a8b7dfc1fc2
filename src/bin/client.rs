//! ChatRelay Terminal Client
//!
//! Sends each stdin line to the server and prints everything the server
//! relays back. `/history` requests the message log, `/connect` retries a
//! lost connection and `/quit` exits.

use chatrelay::client::ChatClient;
use chatrelay::config::ClientConfig;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

const RETRY_NOTICE: &str =
    "Could not reach the server. Try again later with /connect.";

#[derive(Parser)]
#[command(name = "chatrelay-client")]
#[command(about = "Terminal client for a ChatRelay server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    address: String,

    /// Bytes per socket read
    #[arg(long, default_value_t = 1024)]
    buffer_size: usize,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "chatrelay=debug" } else { "chatrelay=warn" })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut client = ChatClient::new(ClientConfig {
        address: args.address,
        buffer_size: args.buffer_size,
        timeout_seconds: args.timeout,
    })?;

    connect(&mut client).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "/quit" => break,
                    "/connect" => connect(&mut client).await,
                    "/history" => {
                        if client.request_history().await.is_err() {
                            eprintln!("{}", RETRY_NOTICE);
                        }
                    }
                    _ => {
                        if client.send(&line).await.is_err() {
                            eprintln!("{}", RETRY_NOTICE);
                        }
                    }
                }
            }
            received = client.receive(), if client.is_connected() => {
                match received {
                    Ok(payload) if payload.trim().is_empty() => {}
                    Ok(payload) => println!("{}", payload),
                    Err(_) => eprintln!("Lost connection to the server. Try again later with /connect."),
                }
            }
        }
    }

    client.close().await?;
    Ok(())
}

async fn connect(client: &mut ChatClient) {
    match client.reconnect().await {
        Ok(()) => eprintln!("Connected to {}", client.address()),
        Err(_) => eprintln!("{}", RETRY_NOTICE),
    }
}
