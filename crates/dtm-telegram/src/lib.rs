//! Telegram adapter (teloxide).
//!
//! This crate implements the `dtm-core` DestinationPort over the Telegram Bot API.

use async_trait::async_trait;
use reqwest::Url;
use teloxide::{
    prelude::*,
    types::{InputFile, InputMedia, InputMediaPhoto, ParseMode},
};
use tracing::debug;

use dtm_core::{
    domain::{Destination, ThreadId},
    errors::Error,
    ports::DestinationPort,
    Result,
};

/// `sendMediaGroup` accepts 2..=10 items.
pub const MAX_ALBUM_LEN: usize = 10;

#[derive(Clone)]
pub struct TelegramDestination {
    bot: Bot,
}

impl TelegramDestination {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(dest: Destination) -> teloxide::types::ChatId {
        teloxide::types::ChatId(dest.chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn photo(url: &str) -> Result<InputFile> {
        let url = Url::parse(url)
            .map_err(|e| Error::External(format!("invalid image url {url}: {e}")))?;
        Ok(InputFile::url(url))
    }

    async fn send_group(
        &self,
        dest: Destination,
        urls: &[String],
        caption: Option<&str>,
    ) -> Result<()> {
        let mut media = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let mut item = InputMediaPhoto::new(Self::photo(url)?);
            if i == 0 {
                if let Some(c) = caption {
                    item = item.caption(c.to_string()).parse_mode(ParseMode::Html);
                }
            }
            media.push(InputMedia::Photo(item));
        }

        let mut req = self.bot.send_media_group(Self::tg_chat(dest), media);
        if let Some(ThreadId(t)) = dest.thread_id {
            req = req.message_thread_id(t);
        }
        req.await.map_err(Self::map_err)?;
        Ok(())
    }
}

/// Split an album into `sendMediaGroup`-sized batches.
///
/// A trailing single photo cannot form a group and is returned as a batch of one;
/// the caller sends it with `sendPhoto`.
pub fn album_batches(urls: &[String]) -> Vec<&[String]> {
    urls.chunks(MAX_ALBUM_LEN).collect()
}

#[async_trait]
impl DestinationPort for TelegramDestination {
    async fn send_text(&self, dest: Destination, html: &str) -> Result<()> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(dest), html.to_string())
            .parse_mode(ParseMode::Html);
        if let Some(ThreadId(t)) = dest.thread_id {
            req = req.message_thread_id(t);
        }
        req.await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_photo(&self, dest: Destination, url: &str, caption: Option<&str>) -> Result<()> {
        let mut req = self.bot.send_photo(Self::tg_chat(dest), Self::photo(url)?);
        if let Some(c) = caption {
            req = req.caption(c.to_string()).parse_mode(ParseMode::Html);
        }
        if let Some(ThreadId(t)) = dest.thread_id {
            req = req.message_thread_id(t);
        }
        req.await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn send_album(
        &self,
        dest: Destination,
        urls: &[String],
        caption: Option<&str>,
    ) -> Result<()> {
        let batches = album_batches(urls);
        debug!(
            chat_id = dest.chat_id.0,
            photos = urls.len(),
            batches = batches.len(),
            "sending album"
        );

        // Not atomic: if a later batch fails the whole call errors, nothing is
        // recorded, and the next run resends the batches that already went out.
        for (i, batch) in batches.into_iter().enumerate() {
            let caption = if i == 0 { caption } else { None };
            match batch {
                [] => {}
                [single] => self.send_photo(dest, single, caption).await?,
                many => self.send_group(dest, many, caption).await?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://cdn/{i}.png")).collect()
    }

    #[test]
    fn small_albums_are_one_batch() {
        let u = urls(3);
        let b = album_batches(&u);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].len(), 3);
    }

    #[test]
    fn large_albums_split_at_ten() {
        let u = urls(21);
        let sizes = album_batches(&u)
            .iter()
            .map(|b| b.len())
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![10, 10, 1]);
    }

    #[test]
    fn rejects_invalid_image_urls() {
        assert!(TelegramDestination::photo("not a url").is_err());
        assert!(TelegramDestination::photo("https://cdn.discordapp.com/a.png").is_ok());
    }
}
