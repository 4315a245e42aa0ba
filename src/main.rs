use std::process::ExitCode;

use matchhub::config::{AuthFile, ServerConfig};
use matchhub::routes;
use matchhub::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();

    // A bad credential file is fatal: never serve without a working gate.
    let state = match AuthFile::load(&config.auth_path).and_then(|file| AppState::from_config(&file, config.cookie_secure))
    {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, path = %config.auth_path.display(), "credential configuration rejected");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        path = %config.auth_path.display(),
        users = ?state.credentials.usernames(),
        cookie = state.sessions.cookie_name(),
        secure_cookie = config.cookie_secure,
        "credentials loaded"
    );

    let app = routes::app(state);
    let listener = match tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(port = config.port, "matchhub listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
