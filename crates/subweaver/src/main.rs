use tracing_subscriber::EnvFilter;

use subweaver::{AppState, ServerError, router};
use subweaver_config::Config;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("subweaver: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

async fn run() -> Result<(), ServerError> {
    let config = Config::load(None)?;
    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    tracing::info!(listen = %config.listen, sources = state.endpoints.len(), "serving");

    axum::serve(listener, router::init(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    // Errors here mean the signal handler could not be installed; falling
    // back to running until killed is the sane behavior.
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
