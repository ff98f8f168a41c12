//! amelia: interactive chat front-end.
//!
//! Reads one message per line from stdin and prints each reply with its
//! source. `/stats`, `/clear` and `/quit` are handled locally.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use amelia::Config;

/// Amelia chat assistant
#[derive(Parser)]
#[command(name = "amelia")]
#[command(version = amelia::version::PKG_VERSION)]
#[command(about = "Amelia chat assistant")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "AMELIA_CONFIG")]
    config: Option<PathBuf>,

    /// Do not consult the response cache.
    #[arg(long)]
    no_cache: bool,

    /// Print stats on exit.
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("amelia=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    if config.remote.endpoint.is_none() {
        return Err("no chat endpoint configured; set `endpoint` under [remote]".into());
    }

    let mut builder = config.builder()?;
    if args.no_cache {
        builder = builder.use_cache(false);
    }
    let amelia = builder.build()?;
    amelia.init();
    info!(version = %amelia::version::version_string(), "amelia ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/stats" => println!("{}", amelia.stats()),
            "/clear" => {
                amelia.clear_cache();
                println!("cache cleared");
            }
            "" => continue,
            message => {
                let reply = amelia.process_message(message).await;
                println!("[{}] {}", reply.source, reply.text);
            }
        }
    }

    if args.stats {
        println!("{}", amelia.stats());
    }
    Ok(())
}
