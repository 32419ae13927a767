use chrono::Utc;

// ============== Timestamp Helpers ==============

/// RFC3339 timestamp in UTC (for history records and logs).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

// ============== Text Helpers ==============

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_text_adds_ellipsis() {
        let s = "a".repeat(210);
        let t = truncate_text(&s, 200);
        assert!(t.ends_with("..."));
        assert_eq!(t.chars().count(), 203);
    }

    #[test]
    fn truncate_text_leaves_short_strings() {
        assert_eq!(truncate_text("héllo", 5), "héllo");
    }

    #[test]
    fn iso_timestamp_parses_back() {
        let ts = iso_timestamp_utc();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
