use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let cfg = oto_config::Config::load()?;
    cfg.ensure_database()?;

    let flags = oto_env::EnvFlags::from_process_env();
    let db = oto_db::SqliteBinding::open(&cfg.database_path)?;
    let bucket = oto_store::DirBucket::new(&cfg.data_dir);
    let env = oto_env::Env::new(Arc::new(db.clone()), Arc::new(bucket), flags.clone());
    let app = oto_host::app(env, Arc::new(oto_host::lookup::LookupHandler));

    let listener = TcpListener::bind(("0.0.0.0", cfg.port)).await?;
    info!("audio host listening on {}", listener.local_addr()?);
    info!("data directory: {}", cfg.data_dir.display());
    info!("database: {}", cfg.database_path.display());
    info!("authentication: {}", enabled(flags.authentication_enabled));
    info!("speech synthesis: {}", enabled(flags.tts_enabled));
    info!(
        "lookup endpoint: http://localhost:{}/audio/list?term={{term}}&reading={{reading}}{}",
        cfg.port,
        if flags.authentication_enabled { "&apiKey=YOUR_API_KEY" } else { "" }
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight exchanges have drained; release the database before exit.
    db.close();
    info!("shut down cleanly");
    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
