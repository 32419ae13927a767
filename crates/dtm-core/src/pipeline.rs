//! Per-channel mirroring loop: fetch → window → normalize → forward → record.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    domain::{ChannelMapping, Destination, SourceMessage},
    formatting::build_body,
    forwarder::forward,
    history::HistoryStore,
    ports::{DestinationPort, SourcePort},
    utils::iso_timestamp_utc,
    window::{is_recent, parse_timestamp},
    Result,
};

/// Totals for one [`Mirror::run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub channels: usize,
    pub forwarded: usize,
    pub failed_channels: Vec<String>,
}

/// Drives one mirror run over every configured mapping, sequentially.
pub struct Mirror {
    cfg: Arc<Config>,
    source: Arc<dyn SourcePort>,
    destination: Arc<dyn DestinationPort>,
    history: HistoryStore,
}

impl Mirror {
    pub fn new(
        cfg: Arc<Config>,
        source: Arc<dyn SourcePort>,
        destination: Arc<dyn DestinationPort>,
        history: HistoryStore,
    ) -> Self {
        Self {
            cfg,
            source,
            destination,
            history,
        }
    }

    /// Process every mapping in configured order. Per-channel failures are logged
    /// and never stop the run.
    pub async fn run(&self) -> RunSummary {
        info!(
            channels = self.cfg.channel_mappings.len(),
            "starting Discord to Telegram mirror"
        );

        let mut summary = RunSummary::default();
        for ChannelMapping {
            source_channel_id,
            destination,
        } in &self.cfg.channel_mappings
        {
            summary.channels += 1;
            match self.process_channel(source_channel_id, *destination).await {
                Ok(n) => summary.forwarded += n,
                Err(e) => {
                    error!(channel = %source_channel_id, error = %e, "channel aborted");
                    summary.failed_channels.push(source_channel_id.clone());
                }
            }
        }

        info!(
            channels = summary.channels,
            forwarded = summary.forwarded,
            failed = summary.failed_channels.len(),
            "mirror run finished"
        );
        summary
    }

    /// Mirror new messages of one source channel. Returns how many were forwarded.
    ///
    /// Errors mean the channel was abandoned (fetch failure or history write failure);
    /// anything recorded before that point stays recorded.
    pub async fn process_channel(&self, channel_id: &str, dest: Destination) -> Result<usize> {
        info!(channel = %channel_id, "processing channel");

        let mut messages = self
            .source
            .fetch_recent(channel_id, self.cfg.fetch_limit)
            .await?;

        if messages.is_empty() {
            warn!(channel = %channel_id, "no messages found");
            return Ok(0);
        }

        // Oldest first. Unparseable timestamps sort to the front; the window check drops them.
        messages.sort_by_key(|m| parse_timestamp(&m.timestamp));

        let mut processed = 0usize;
        for message in &messages {
            if self.process_message(message, dest).await? {
                processed += 1;
            }
        }

        info!(channel = %channel_id, processed, "processed new messages");
        Ok(processed)
    }

    /// One read-modify-write cycle on the history file. Returns whether the message went out.
    async fn process_message(&self, message: &SourceMessage, dest: Destination) -> Result<bool> {
        let mut history = self.history.load()?;

        if history.contains(&message.id)
            || !is_recent(&message.timestamp, self.cfg.message_window, Utc::now())
        {
            return Ok(false);
        }

        let body = build_body(message, &self.cfg.filter_words);
        let image_urls = message.image_urls();

        let out = forward(
            self.destination.as_ref(),
            &history,
            dest,
            Some(body.as_str()),
            &image_urls,
        )
        .await;

        if out.sent {
            let now = iso_timestamp_utc();
            history.record(message.id.clone(), now.clone());
            for url in out.images {
                history.record(url, now.clone());
            }
        }

        self.history.save(&history)?;

        if !self.cfg.request_delay.is_zero() {
            sleep(self.cfg.request_delay).await;
        }

        Ok(out.sent)
    }
}
