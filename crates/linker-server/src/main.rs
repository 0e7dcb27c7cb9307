//! Linker: credential relay daemon and chat client for the n8n assistant.

use std::path::PathBuf;
use std::sync::Arc;

use linker_core::LinkerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod routes;
mod sink;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("LINKER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let port = state.config.relay_port;
    let app = routes::build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Linker relay listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    if matches!(command, "--help" | "-h" | "help") {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config = LinkerConfig::from_env(&data_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Data directory: {}", data_dir.display());

    let state = Arc::new(AppState::new(config));
    let rest = args.get(2..).unwrap_or_default();

    let result = match command {
        "serve" => serve(state.clone()).await,
        "chat" => cli::chat(&state, rest).await,
        "history" => cli::history(&state, rest),
        "fetch" => cli::fetch(&state, rest).await,
        "credentials" => cli::credentials(&state, rest).await,
        "domain" => cli::domain(&state, rest),
        "config" => cli::config(&state, rest),
        "feedback" => cli::feedback(&state, rest).await,
        other => {
            eprintln!("Unknown command: {}. Use 'linker help' for usage.", other);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
