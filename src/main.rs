use std::sync::Arc;

use clap::Parser;
use tracing::info;

use qcfetch::backend::MemoryBackend;
use qcfetch::{FetchConfig, Fetcher};

#[derive(Parser)]
#[command(name = "qcfetch")]
#[command(about = "Fetch JSON-encoded objects from a configured database backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, help = "Config file path")]
    config: Option<String>,

    #[arg(long, help = "Output as JSON")]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Retrieve one object as of a timestamp and print its JSON
    Get {
        path: String,
        timestamp: i64,
    },
    Status,
    GenerateConfig {
        #[arg(long, default_value = "qcfetch.toml", help = "Config file path")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("qcfetch=info")
        .init();

    let cli = Cli::parse();
    let config = FetchConfig::load_or_create(cli.config.as_deref())?;

    match cli.command {
        Commands::Get { path, timestamp } => {
            let fetcher = Fetcher::new(&config);

            if let Some(seed) = &config.seed_file {
                info!("Loading seed file: {}", seed.display());
                let backend = MemoryBackend::from_seed_file(seed)?;
                fetcher.register_backend("memory", Arc::new(backend));
            }

            fetcher.init(config.backend.clone())?;

            match fetcher.fetch(&path, timestamp).await {
                Ok(json) => {
                    if cli.json {
                        println!("{}", json);
                    } else {
                        println!("📦 Object: {} @ {}", path, timestamp);
                        println!("{}", json);
                    }
                }
                Err(e) => {
                    if cli.json {
                        println!("{}", serde_json::json!({"error": e.to_string()}));
                    } else {
                        println!("❌ Fetch failed: {}", e);
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Status => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                    "backend": config.backend.backend,
                    "host": config.backend.host,
                    "database": config.backend.database,
                    "username": config.backend.username,
                    "max_inflight": config.max_inflight,
                    "seed_file": config.seed_file,
                }))?);
            } else {
                println!("📊 qcfetch Configuration");
                println!("========================");
                println!("   Backend: {}", config.backend.backend);
                println!("   Host: {}", config.backend.host);
                println!("   Database: {}", config.backend.database);
                println!("   Username: {}", config.backend.username);
                println!("   Max in-flight tasks: {}", config.max_inflight);
                if let Some(seed) = &config.seed_file {
                    println!("   Seed file: {}", seed.display());
                }
            }
        }
        Commands::GenerateConfig { output } => {
            let config = FetchConfig::default();
            match config.save(&output) {
                Ok(_) => {
                    if cli.json {
                        println!("{}", serde_json::json!({
                            "success": true,
                            "config_file": output,
                        }));
                    } else {
                        println!("⚙️  Generate Configuration");
                        println!("========================");
                        println!("✅ Default configuration saved to: {}", output);
                        println!("   Edit the file to point at your backend");
                    }
                }
                Err(e) => {
                    if cli.json {
                        println!("{}", serde_json::json!({"error": e.to_string()}));
                    } else {
                        println!("❌ Failed to create config file: {}", e);
                    }
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
