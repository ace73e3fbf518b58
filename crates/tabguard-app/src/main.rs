mod browser;
mod command;
mod config;
mod runtime;
mod store;

use config::AppConfig;
use runtime::AppRuntime;
use store::JsonFileStore;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(message) = run().await {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tabguard_core=info,tabguard_app=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), String> {
    let config = AppConfig::from_env()
        .map_err(|error| format!("tabguard: invalid configuration\n  {error}"))?;
    let store = JsonFileStore::open(&config.store_path).await.map_err(|error| {
        format!(
            "tabguard: cannot open settings at {}\n  {error}",
            config.store_path.display()
        )
    })?;

    let mut runtime = AppRuntime::bootstrap(store, config.engine_options(), true).await;
    let limits = runtime.startup_config();
    println!(
        "tabguard ready store={} max_total={} max_window={} badge={}",
        config.store_path.display(),
        limits.max_total,
        limits.max_window,
        runtime.browser().badge()
    );

    runtime
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .map_err(|error| format!("tabguard: input loop failed\n  {error}"))?;
    Ok(())
}
