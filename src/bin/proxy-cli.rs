use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Inspect a running async-http-proxy", long_about = None)]
struct Cli {
    /// Base URL of the proxy; must be a loopback address for /stats to answer.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw /stats document
    Stats,
    /// Print uptime and relayed bytes in human form
    Summary,
}

#[derive(Deserialize)]
struct Stats {
    uptime: f64,
    bytes: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Never route the stats request through an HTTP_PROXY from the environment.
    let client = reqwest::Client::builder().no_proxy().build()?;

    let res = client
        .get(format!("{}/stats", cli.url.trim_end_matches('/')))
        .send()
        .await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    match cli.command {
        Commands::Stats => {
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Summary => {
            let stats: Stats = res.json().await?;
            println!("uptime: {}", format_uptime(stats.uptime));
            println!("bytes:  {} ({})", stats.bytes, format_bytes(stats.bytes));
        }
    }

    Ok(())
}

fn format_uptime(secs: f64) -> String {
    let total = secs as u64;
    format!("{}h {:02}m {:02}s", total / 3600, (total % 3600) / 60, total % 60)
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
