use async_trait::async_trait;

use crate::{
    domain::{Destination, SourceMessage},
    Result,
};

/// Hexagonal port for the channel we mirror *from* (Discord today).
#[async_trait]
pub trait SourcePort: Send + Sync {
    /// Fetch up to `limit` of the most recent messages in `channel_id`.
    ///
    /// Order is not guaranteed; the pipeline sorts by timestamp.
    async fn fetch_recent(&self, channel_id: &str, limit: u8) -> Result<Vec<SourceMessage>>;
}

/// Hexagonal port for the chat we mirror *to* (Telegram today).
///
/// Text and captions are destination HTML. Every call is atomic from the caller's
/// point of view: `Ok` means the whole payload went out.
#[async_trait]
pub trait DestinationPort: Send + Sync {
    async fn send_text(&self, dest: Destination, html: &str) -> Result<()>;

    async fn send_photo(&self, dest: Destination, url: &str, caption: Option<&str>) -> Result<()>;

    /// Grouped album; `caption` belongs to the first photo only.
    async fn send_album(&self, dest: Destination, urls: &[String], caption: Option<&str>)
        -> Result<()>;
}
