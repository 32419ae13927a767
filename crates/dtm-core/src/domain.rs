/// Telegram chat id (numeric, negative for supergroups).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram forum topic id (`message_thread_id`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(pub i32);

/// Where a mirrored channel ends up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    pub chat_id: ChatId,
    pub thread_id: Option<ThreadId>,
}

/// One configured source channel → destination pairing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelMapping {
    pub source_channel_id: String,
    pub destination: Destination,
}

/// A message pulled from the source channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMessage {
    pub id: String,
    /// ISO-8601 creation time as reported by the source.
    pub timestamp: String,
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub attachments: Vec<Attachment>,
}

impl SourceMessage {
    /// Urls of image attachments, in original order.
    pub fn image_urls(&self) -> Vec<String> {
        self.attachments
            .iter()
            .filter(|a| a.is_image())
            .map(|a| a.url.clone())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbedField {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attachment {
    pub url: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(url: &str, content_type: Option<&str>) -> Attachment {
        Attachment {
            url: url.to_string(),
            content_type: content_type.map(|s| s.to_string()),
        }
    }

    #[test]
    fn image_urls_keep_order_and_skip_non_images() {
        let msg = SourceMessage {
            id: "1".to_string(),
            attachments: vec![
                attachment("https://cdn/a.png", Some("image/png")),
                attachment("https://cdn/b.pdf", Some("application/pdf")),
                attachment("https://cdn/c.txt", None),
                attachment("https://cdn/d.jpg", Some("IMAGE/JPEG")),
            ],
            ..Default::default()
        };
        assert_eq!(
            msg.image_urls(),
            vec!["https://cdn/a.png".to_string(), "https://cdn/d.jpg".to_string()]
        );
    }
}
