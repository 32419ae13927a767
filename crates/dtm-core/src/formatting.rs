//! Formatting utilities (Discord markup → Telegram HTML, banned-phrase filtering).

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::domain::{Embed, SourceMessage};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wrap already-plain text in Telegram's emphasis markup.
pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", escape_html(text))
}

/// Remove every banned phrase (case-insensitive, literal match), then trim.
///
/// Removal repeats until no phrase matches, so splicing cannot reassemble a
/// banned phrase out of its surroundings (`"spspamam"` → `""` for `"spam"`).
pub fn filter_words(text: &str, banned: &[String]) -> String {
    if text.is_empty() {
        return String::new();
    }

    let patterns = banned
        .iter()
        .filter(|p| !p.is_empty())
        .filter_map(|p| {
            match RegexBuilder::new(&regex::escape(p))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(phrase = %p, error = %e, "skipping unusable filter phrase");
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    let mut out = text.to_string();
    loop {
        let mut changed = false;
        for re in &patterns {
            if re.is_match(&out) {
                out = re.replace_all(&out, "").into_owned();
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    out.trim().to_string()
}

fn custom_emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<a?:\w+:\d+>").expect("valid regex"))
}

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@!?\d+>|<@&\d+>|<#\d+>").expect("valid regex"))
}

fn inline_format_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[*_~`|]").expect("valid regex"))
}

/// Strip Discord-only markup (custom emoji, mentions, inline formatting) and
/// apply [`filter_words`]. Output is plain text, not yet escaped.
pub fn clean_markup(text: &str, banned: &[String]) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = custom_emoji_re().replace_all(text, "");
    let text = mention_re().replace_all(&text, "");
    let text = inline_format_re().replace_all(&text, "");
    filter_words(&text, banned)
}

/// Render an embed into a Telegram HTML block.
///
/// Title is bold, description follows, then one `name\nvalue` block per field.
/// Fields missing either side after cleaning are dropped.
pub fn render_embed(embed: &Embed, banned: &[String]) -> String {
    let mut parts = Vec::new();

    let title = filter_words(embed.title.as_deref().unwrap_or(""), banned);
    if !title.is_empty() {
        parts.push(bold(&title));
    }

    let description = clean_markup(embed.description.as_deref().unwrap_or(""), banned);
    if !description.is_empty() {
        parts.push(escape_html(&description));
    }

    for field in &embed.fields {
        let name = filter_words(field.name.as_deref().unwrap_or(""), banned);
        let value = clean_markup(field.value.as_deref().unwrap_or(""), banned);
        if name.is_empty() || value.is_empty() {
            continue;
        }
        parts.push(format!("{}\n{}", bold(&name), escape_html(&value)));
    }

    parts.join("\n\n")
}

/// Full outgoing body for a message: cleaned text, then each non-empty embed block.
pub fn build_body(message: &SourceMessage, banned: &[String]) -> String {
    let mut parts = Vec::new();

    let content = clean_markup(message.content.as_deref().unwrap_or(""), banned);
    if !content.is_empty() {
        parts.push(escape_html(&content));
    }

    for embed in &message.embeds {
        let block = render_embed(embed, banned);
        if !block.is_empty() {
            parts.push(block);
        }
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmbedField;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|s| s.to_string()).collect()
    }

    fn field(name: &str, value: &str) -> EmbedField {
        EmbedField {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn filter_words_is_case_insensitive_and_trims() {
        let banned = words(&["Buy Now", "spam"]);
        let out = filter_words("  SPAM deals: buy now! Spam  ", &banned);
        assert_eq!(out, "deals: !");
    }

    #[test]
    fn filter_words_escapes_regex_metacharacters() {
        let banned = words(&["(a+)", "."]);
        assert_eq!(filter_words("x(A+)y.z", &banned), "xyz");
        assert_eq!(filter_words("aaa", &banned), "aaa");
    }

    #[test]
    fn filter_words_leaves_no_occurrence_after_splicing() {
        let banned = words(&["spam"]);
        let out = filter_words("spSPAMam and SpSpamAM", &banned);
        assert!(!out.to_lowercase().contains("spam"));
        assert_eq!(out, "and");
    }

    #[test]
    fn filter_words_handles_empty_input_and_phrases() {
        assert_eq!(filter_words("", &words(&["x"])), "");
        assert_eq!(filter_words(" keep ", &words(&[""])), "keep");
    }

    #[test]
    fn clean_markup_strips_discord_tokens() {
        let text = "<:pepe:123> hi <@42> <@!43> <@&44> in <#45> **bold** __u__ ~~s~~ `c` ||spoiler|| <a:dance:9>";
        assert_eq!(clean_markup(text, &[]), "hi    in  bold u s c spoiler");
    }

    #[test]
    fn clean_markup_applies_filter_after_stripping() {
        let banned = words(&["secret"]);
        assert_eq!(clean_markup("**SeCrEt** news", &banned), "news");
    }

    #[test]
    fn embed_with_only_title_renders_title_block() {
        let embed = Embed {
            title: Some("A".to_string()),
            description: Some(String::new()),
            fields: vec![field("N", "")],
        };
        assert_eq!(render_embed(&embed, &[]), "<b>A</b>");
    }

    #[test]
    fn embed_renders_description_and_complete_fields() {
        let embed = Embed {
            title: Some("Patch <notes>".to_string()),
            description: Some("**Big** update".to_string()),
            fields: vec![field("Version", "1.2"), field("", "orphan"), field("Empty", "*")],
        };
        assert_eq!(
            render_embed(&embed, &[]),
            "<b>Patch &lt;notes&gt;</b>\n\nBig update\n\n<b>Version</b>\n1.2"
        );
    }

    #[test]
    fn embed_with_nothing_renders_empty() {
        assert_eq!(render_embed(&Embed::default(), &[]), "");
    }

    #[test]
    fn body_joins_text_and_embeds() {
        let msg = SourceMessage {
            id: "1".to_string(),
            content: Some("hello <@1> & bye".to_string()),
            embeds: vec![
                Embed::default(),
                Embed {
                    title: Some("T".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(build_body(&msg, &[]), "hello  &amp; bye\n\n<b>T</b>");
    }

    #[test]
    fn body_without_text_is_just_embeds() {
        let msg = SourceMessage {
            id: "1".to_string(),
            content: None,
            embeds: vec![Embed {
                description: Some("d".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(build_body(&msg, &[]), "d");
    }
}
