//! Keeps a valid Google access token around, refreshing it from the
//! configured refresh token when it is missing or about to expire.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::GoogleConfig;

/// Refresh this long before Google's stated expiry
const EXPIRY_SKEW_SECS: i64 = 60;

struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl SessionData {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct Session {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    initial_refresh_token: String,
    data: Mutex<Option<SessionData>>,
}

impl Session {
    pub fn new(http: reqwest::Client, config: &GoogleConfig) -> Self {
        Session {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            initial_refresh_token: config.refresh_token.clone(),
            data: Mutex::new(None),
        }
    }

    /// A bearer token valid for at least the next minute.
    pub async fn access_token(&self) -> Result<String> {
        let mut data = self.data.lock().await;

        if let Some(current) = data.as_ref() {
            if !current.is_expired(Utc::now()) {
                return Ok(current.access_token.clone());
            }
        }

        let refresh_token = data
            .as_ref()
            .map(|d| d.refresh_token.clone())
            .unwrap_or_else(|| self.initial_refresh_token.clone());

        let fresh = self.refresh(refresh_token).await?;
        let token = fresh.access_token.clone();
        *data = Some(fresh);

        Ok(token)
    }

    async fn refresh(&self, refresh_token: String) -> Result<SessionData> {
        debug!(token_url = %self.token_url, "refreshing Google access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to refresh Google access token ({}): {}", status, error_text);
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;

        Ok(SessionData {
            access_token: refreshed.access_token,
            // Google typically doesn't return a new refresh_token on refresh
            refresh_token: refreshed
                .refresh_token
                .filter(|t| !t.is_empty())
                .unwrap_or(refresh_token),
            expires_at: Utc::now() + Duration::seconds(refreshed.expires_in),
        })
    }
}
