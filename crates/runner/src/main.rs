use log::info;
use tickwatch_runner::{Bootstrap, RunnerConfig, load_config};

fn print_help() {
    eprintln!(
        r#"tickwatch - price variation and presence alerting

USAGE:
    tickwatch [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    TICKWATCH_CONFIG    Config file path when --config is not given
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # Run with defaults: simulated feed, log sink
    tickwatch

    # Run with config file
    tickwatch --config tickwatch.json
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path.or_else(|| std::env::var("TICKWATCH_CONFIG").ok()) {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            load_config(&path)?
        }
        None => {
            info!("Using default configuration");
            RunnerConfig::default()
        }
    };

    info!(
        "Queue capacity: {}, presence timeout: {} ms",
        config.engine.queue_capacity, config.engine.presence_timeout_ms
    );

    let system = Bootstrap::with_config(config)?.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    system.shutdown().await;
    Ok(())
}
