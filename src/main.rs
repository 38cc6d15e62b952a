use anyhow::Result;
use std::{fs, io::ErrorKind};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use upload_echo::{
    config,
    routes::{self, routes::AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting upload-echo with config: {:?}", cfg);

    // --- Ensure upload directory exists ---
    if let Some(dir) = &cfg.upload_dir {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created upload directory at {}", dir.display());
        }
    }
    if !cfg.doc_root.is_dir() {
        tracing::warn!(
            "Document root {} is missing; static requests will 404",
            cfg.doc_root.display()
        );
    }

    // --- Build router ---
    let app = routes::routes::routes(AppState::from_config(&cfg));

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
