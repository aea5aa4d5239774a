use crate::models::chat::MessagePage;
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::path::Path;

pub const PAGE_SIZE: usize = 10;

/// An entry of the static conversation log. Ids and nested history are passed through untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogMessage {
    #[serde(default)]
    pub id: JsonValue,
    #[serde(default)]
    pub history: JsonValue,
    pub role: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConversationFile {
    #[serde(default)]
    conversations: Vec<LogMessage>,
}

#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    entries: Vec<LogMessage>,
}

impl ConversationLog {
    pub fn new(entries: Vec<LogMessage>) -> Self {
        Self { entries }
    }

    /// A missing or malformed file gives an empty log.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Conversation log '{}' unavailable: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<ConversationFile>(&raw) {
            Ok(file) => {
                info!("Loaded {} conversation entries from {}", file.conversations.len(), path.display());
                Self::new(file.conversations)
            }
            Err(e) => {
                warn!("Conversation log '{}' is not valid JSON: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-based pages of `PAGE_SIZE` entries.
    pub fn page(&self, page: u32) -> MessagePage<LogMessage> {
        let page = page.max(1) as usize;
        let start = (page - 1).saturating_mul(PAGE_SIZE);
        let end = start.saturating_add(PAGE_SIZE);
        let messages = self.entries
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        MessagePage { messages, has_more: end < self.entries.len() }
    }
}

/// Parses the `page` query parameter; absent or non-numeric means page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn log_of(n: usize) -> ConversationLog {
        ConversationLog::new(
            (0..n)
                .map(|i| LogMessage {
                    id: JsonValue::from(i),
                    history: JsonValue::Null,
                    role: if i % 2 == 0 { "user".into() } else { "model".into() },
                    text: format!("entry {}", i),
                })
                .collect()
        )
    }

    #[test]
    fn pages_are_one_based_with_has_more() {
        let log = log_of(25);
        let first = log.page(1);
        assert_eq!(first.messages.len(), 10);
        assert_eq!(first.messages[0].text, "entry 0");
        assert!(first.has_more);

        let third = log.page(3);
        assert_eq!(third.messages.len(), 5);
        assert!(!third.has_more);

        let beyond = log.page(9);
        assert!(beyond.messages.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn exact_multiple_has_no_more_on_last_page() {
        assert!(!log_of(20).page(2).has_more);
    }

    #[test]
    fn page_parameter_defaults_to_one() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("4")), 4);
    }

    #[test]
    fn loads_file_or_falls_back_to_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"conversations":[{{"id":1,"role":"user","text":"hey"}}]}}"#).unwrap();
        assert_eq!(ConversationLog::load(file.path()).len(), 1);

        assert!(ConversationLog::load("/definitely/not/here.json").is_empty());
    }
}
