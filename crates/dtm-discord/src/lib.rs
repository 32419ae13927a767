//! Discord adapter (REST, bot token).
//!
//! Implements the `dtm-core` SourcePort over `GET /channels/{id}/messages`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use dtm_core::{
    domain::{Attachment, Embed, EmbedField, SourceMessage},
    errors::Error,
    ports::SourcePort,
    utils::truncate_text,
    Result,
};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v9";

#[derive(Clone, Debug)]
pub struct DiscordClient {
    token: String,
    api_base: String,
    http: reqwest::Client,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::External(format!("discord client build error: {e}")))?;
        Ok(Self {
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{channel_id}/messages", self.api_base)
    }
}

#[async_trait]
impl SourcePort for DiscordClient {
    async fn fetch_recent(&self, channel_id: &str, limit: u8) -> Result<Vec<SourceMessage>> {
        let url = self.messages_url(channel_id);
        debug!(%url, limit, "fetching discord messages");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| Error::External(format!("discord request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "discord fetch failed: {status} {}",
                truncate_text(&body, 200)
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("discord read error: {e}")))?;

        parse_messages(&body)
    }
}

// ============== Wire Format ==============

#[derive(Debug, Deserialize)]
struct WireMessage {
    id: String,
    timestamp: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    embeds: Vec<WireEmbed>,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

#[derive(Debug, Deserialize)]
struct WireEmbed {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: Vec<WireEmbedField>,
}

#[derive(Debug, Deserialize)]
struct WireEmbedField {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAttachment {
    url: String,
    #[serde(default)]
    content_type: Option<String>,
}

impl From<WireMessage> for SourceMessage {
    fn from(m: WireMessage) -> Self {
        Self {
            id: m.id,
            timestamp: m.timestamp,
            content: m.content,
            embeds: m
                .embeds
                .into_iter()
                .map(|e| Embed {
                    title: e.title,
                    description: e.description,
                    fields: e
                        .fields
                        .into_iter()
                        .map(|f| EmbedField {
                            name: f.name,
                            value: f.value,
                        })
                        .collect(),
                })
                .collect(),
            attachments: m
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    url: a.url,
                    content_type: a.content_type,
                })
                .collect(),
        }
    }
}

/// Decode a `GET /channels/{id}/messages` response body.
pub fn parse_messages(body: &str) -> Result<Vec<SourceMessage>> {
    let wire: Vec<WireMessage> = serde_json::from_str(body)
        .map_err(|e| Error::External(format!("discord json error: {e}")))?;
    Ok(wire.into_iter().map(SourceMessage::from).collect())
}
