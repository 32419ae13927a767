//! Picks the send shape for one message and issues exactly one destination call.

use tracing::{debug, error, info};

use crate::{
    domain::Destination,
    history::History,
    ports::DestinationPort,
};

/// Send strategy, first match wins:
/// 2+ images → album, 1 image → photo, text only → text, otherwise nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendPlan {
    Album {
        urls: Vec<String>,
        caption: Option<String>,
    },
    Photo {
        url: String,
        caption: Option<String>,
    },
    Text(String),
    Nothing,
}

impl SendPlan {
    /// Image urls this plan transmits.
    pub fn image_urls(&self) -> Vec<String> {
        match self {
            SendPlan::Album { urls, .. } => urls.clone(),
            SendPlan::Photo { url, .. } => vec![url.clone()],
            SendPlan::Text(_) | SendPlan::Nothing => Vec::new(),
        }
    }
}

/// Outcome of a forward attempt.
///
/// `sent == false` means nothing may be recorded as sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Forwarded {
    pub sent: bool,
    pub images: Vec<String>,
}

/// Build the plan. Urls already in `history` are dropped first.
pub fn plan(history: &History, text: Option<&str>, image_urls: &[String]) -> SendPlan {
    let caption = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let mut eligible = image_urls
        .iter()
        .filter(|u| !history.contains(u))
        .cloned()
        .collect::<Vec<_>>();

    match eligible.len() {
        0 => match caption {
            Some(text) => SendPlan::Text(text),
            None => SendPlan::Nothing,
        },
        1 => SendPlan::Photo {
            url: eligible.remove(0),
            caption,
        },
        _ => SendPlan::Album {
            urls: eligible,
            caption,
        },
    }
}

/// Send `text` and `image_urls` to `dest` using the plan's single call.
///
/// On success every url handed to the chosen call is reported. Any transport error
/// yields `sent == false` with no urls; nothing is retried here.
pub async fn forward(
    port: &dyn DestinationPort,
    history: &History,
    dest: Destination,
    text: Option<&str>,
    image_urls: &[String],
) -> Forwarded {
    let plan = plan(history, text, image_urls);

    let result = match &plan {
        SendPlan::Album { urls, caption } => port.send_album(dest, urls, caption.as_deref()).await,
        SendPlan::Photo { url, caption } => port.send_photo(dest, url, caption.as_deref()).await,
        SendPlan::Text(text) => port.send_text(dest, text).await,
        SendPlan::Nothing => {
            debug!(chat_id = dest.chat_id.0, "nothing to send");
            return Forwarded::default();
        }
    };

    match result {
        Ok(()) => {
            let images = plan.image_urls();
            match &plan {
                SendPlan::Album { urls, .. } => {
                    info!(chat_id = dest.chat_id.0, count = urls.len(), "sent media group")
                }
                SendPlan::Photo { .. } => info!(chat_id = dest.chat_id.0, "sent single photo"),
                _ => info!(chat_id = dest.chat_id.0, "sent text-only message"),
            }
            Forwarded { sent: true, images }
        }
        Err(e) => {
            error!(chat_id = dest.chat_id.0, error = %e, "failed to send to destination");
            Forwarded::default()
        }
    }
}
