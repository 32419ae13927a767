use std::sync::Arc;

use dtm_discord::DiscordClient;
use dtm_telegram::TelegramDestination;
use tracing::{error, info};

use dtm_core::{config::Config, history::HistoryStore, pipeline::Mirror};

#[tokio::main]
async fn main() -> Result<(), dtm_core::Error> {
    dtm_core::logging::init("dtm")?;

    let cfg = match Config::load().and_then(|cfg| cfg.require_credentials().map(|()| cfg)) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!(error = %e, "fatal: cannot start mirror");
            return Err(e);
        }
    };

    info!(
        mappings = cfg.channel_mappings.len(),
        filter_words = cfg.filter_words.len(),
        window_secs = cfg.message_window.as_secs(),
        history = %cfg.history_file.display(),
        "configuration loaded"
    );

    let source = Arc::new(DiscordClient::new(cfg.discord_bot_token.clone())?);
    let destination = Arc::new(TelegramDestination::from_token(
        cfg.telegram_bot_token.clone(),
    ));
    let history = HistoryStore::new(cfg.history_file.clone());

    let summary = Mirror::new(cfg, source, destination, history).run().await;
    if !summary.failed_channels.is_empty() {
        error!(channels = ?summary.failed_channels, "some channels were skipped");
    }

    Ok(())
}
