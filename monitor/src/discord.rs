//! Channel and category updates through the Discord REST API.

use crate::sink::{ApplyError, PresentationSurface};
use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// Edits guild channels (categories are channels too) with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordRest {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordRest {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }
}

/// JSON body of a channel edit, or `None` if there is nothing to change.
pub fn channel_patch(name: &str, description: &str) -> Option<Value> {
    let mut body = Map::new();
    if !name.is_empty() {
        body.insert("name".to_string(), Value::String(name.to_string()));
    }
    if !description.is_empty() {
        body.insert("topic".to_string(), Value::String(description.to_string()));
    }

    if body.is_empty() {
        None
    } else {
        Some(Value::Object(body))
    }
}

#[async_trait]
impl PresentationSurface for DiscordRest {
    async fn apply(&self, surface_id: &str, name: &str, description: &str) -> Result<(), ApplyError> {
        let Some(body) = channel_patch(name, description) else {
            return Ok(());
        };

        let url = format!("{}/channels/{}", self.base_url, surface_id);
        debug!("surface={} PATCH {}", surface_id, url);

        let response = self
            .client
            .patch(url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApplyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(ApplyError::Rejected(format!("{} {}", status, text.trim())))
    }
}
