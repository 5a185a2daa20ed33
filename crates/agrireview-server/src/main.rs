//! AgriReview: review server for negatively rated chatbot conversations.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use agrireview_core::AppConfig;
use agrireview_ingest::Ingester;
use agrireview_server::{build_router, AppState};
use agrireview_store::SqliteStore;

fn resolve_data_dir() -> PathBuf {
    std::env::var("AGRIREVIEW_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn open_store(config: &AppConfig) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&config.data_paths.database)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))
}

fn print_help() {
    println!("AgriReview: review flagged chatbot conversations");
    println!();
    println!("Usage: agrireview [command]");
    println!();
    println!("Commands:");
    println!("  (none) | serve           Start the server");
    println!("  import <file>            Load a CSV/XLSX/JSON export, replacing stored conversations");
    println!("  insights                 Print the current insights snapshot as JSON");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = resolve_data_dir();
    let config = AppConfig::from_env(&data_dir)?;

    match args.get(1).map(String::as_str) {
        None | Some("serve") => {}
        Some("import") => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: agrireview import <file>");
                std::process::exit(1);
            };
            let store = open_store(&config)?;
            let count = Ingester::new(&store).ingest_file(&PathBuf::from(path))?;
            println!("Imported {} flagged conversations from {}", count, path);
            return Ok(());
        }
        Some("insights") => {
            let store = open_store(&config)?;
            let snapshot = agrireview_insights::compute_insights(&store)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            return Ok(());
        }
        Some("--help" | "-h" | "help") => {
            print_help();
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'agrireview help' for usage.", other);
            std::process::exit(1);
        }
    }

    info!("Data directory: {}", data_dir.display());

    let store = open_store(&config)?;
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, store));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("AgriReview server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
