use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use otpgate_auth::config::AuthConfig;
use otpgate_auth::infra::jwt::JwtTokenIssuer;
use otpgate_auth::infra::sms::{TwilioOptions, TwilioOtpSender};
use otpgate_auth::router::build_router;
use otpgate_auth::state::AppState;
use otpgate_core::config::Config;
use otpgate_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing("otpgate_auth");

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client");
    let otp_sender = TwilioOtpSender::new(
        http,
        TwilioOptions {
            account_sid: config.twilio_account_sid,
            auth_token: config.twilio_auth_token,
            from_number: config.twilio_number,
        },
    );

    let state = AppState {
        db,
        token_issuer: JwtTokenIssuer::new(config.auth_secret.clone(), config.auth_expiry_period),
        auth_secret: config.auth_secret,
        otp_sender,
    };

    let router = build_router(state, Duration::from_secs(config.request_timeout_secs));
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
    info!("auth service stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
