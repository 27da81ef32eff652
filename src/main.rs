mod api;
mod config;
mod core;
mod db;
mod enrichment;
mod hydration;
mod ingest;
mod memory;
mod patterns;
mod providers;
mod state;
mod traits;
mod types;
pub mod utils;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("hearthd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("hearthd {}", env!("CARGO_PKG_VERSION"));
                println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
                println!("Usage: hearthd [OPTIONS]\n");
                println!("Options:");
                println!("  -h, --help       Print help");
                println!("  -V, --version    Print version");
                println!("\nConfiguration is read from config.toml in the working directory;");
                println!("missing keys fall back to defaults and the environment (.env is loaded).");
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: '{}'. Try --help.", other);
                std::process::exit(1);
            }
        }
    }

    let config_path = PathBuf::from("config.toml");
    let config = config::AppConfig::load(&config_path)?;

    // Run async
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::core::run(config))
}
