//! Credentials and endpoints for the Google Calendar backend.
//!
//! The booking site acts as the calendar owner through a long-lived OAuth
//! refresh token; the server reads these values from `turno.toml` or from
//! `TURNO__GOOGLE__*` environment variables.

use std::fmt;

use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

#[derive(Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl GoogleConfig {
    pub fn new(client_id: &str, client_secret: &str, refresh_token: &str) -> Self {
        GoogleConfig {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
            api_base: default_api_base(),
            token_url: default_token_url(),
        }
    }
}

// Secrets stay out of logs
impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("token_url", &self.token_url)
            .finish()
    }
}
