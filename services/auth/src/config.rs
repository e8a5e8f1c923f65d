use serde::Deserialize;

use otpgate_core::config::Config;

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for signing access tokens. Env var: `AUTH_SECRET`.
    pub auth_secret: String,
    /// Access token lifetime in seconds (default 1 day). Env var: `AUTH_EXPIRY_PERIOD`.
    #[serde(default = "default_auth_expiry_period")]
    pub auth_expiry_period: u64,
    /// TCP port to listen on (default 7700). Env var: `AUTH_PORT`.
    #[serde(default = "default_auth_port")]
    pub auth_port: u16,
    /// Upper bound on handling a single request. Env var: `REQUEST_TIMEOUT_SECS`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    /// Sender number for OTP SMS. Env var: `TWILIO_NUMBER`.
    pub twilio_number: String,
}

impl Config for AuthConfig {}

fn default_auth_expiry_period() -> u64 {
    86_400
}

fn default_auth_port() -> u16 {
    7700
}

fn default_request_timeout_secs() -> u64 {
    30
}
