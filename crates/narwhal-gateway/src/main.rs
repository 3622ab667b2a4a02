use narwhal_gateway::{GatewayConfig, GatewayService};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("narwhal_gateway=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "gateway failed");
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> narwhal_gateway::Result<()> {
    let config = GatewayConfig::load(std::env::args().skip(1), |key| std::env::var(key).ok())?;
    let handle = GatewayService::start(config).await?;

    // Callers wait for this line before connecting.
    println!("Gateway Server Started");
    println!("listening on {}", handle.local_addr());

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut line = String::new();
    tokio::select! {
        read = stdin.read_line(&mut line) => {
            if let Err(err) = read {
                tracing::warn!(error = %err, "stdin closed with error");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                tracing::warn!(error = %err, "ctrl-c handler failed");
            }
        }
    }

    handle.stop().await;
    Ok(())
}
