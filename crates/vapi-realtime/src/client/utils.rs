use crate::client::config::Config;
use crate::types::{CreateCallRequest, CreateCallResponse};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;

pub fn call_url(base_url: &str) -> String {
    format!("{}/call", base_url.trim_end_matches('/'))
}

/// Creates the call over REST and returns where to dial its websocket.
pub async fn create_call(
    http: &reqwest::Client,
    config: &Config,
    request: &CreateCallRequest,
) -> Result<CreateCallResponse> {
    http.post(call_url(config.base_url()))
        .bearer_auth(config.api_key().expose_secret())
        .json(request)
        .send()
        .await
        .context("Failed to create call")?
        .error_for_status()
        .context("Call creation was rejected")?
        .json::<CreateCallResponse>()
        .await
        .context("Failed to decode call creation response")
}
