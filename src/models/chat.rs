use chrono::{ Local, TimeZone, Utc };
use rand::Rng;
use serde::{ Serialize, Deserialize };

/// Text carried by a model message that stands in for a pending reply.
pub const THINKING_PLACEHOLDER: &str = "...";

const ROOM_NAME_MAX_LEN: usize = 30;
const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub timestamp: i64,
}

impl Message {
    pub fn user(text: &str, images: Option<Vec<String>>) -> Self {
        let now = now_millis();
        Self {
            id: prefixed_id("msg", now),
            role: Role::User,
            text: text.trim().to_string(),
            images,
            timestamp: now,
        }
    }

    pub fn thinking() -> Self {
        let now = now_millis();
        Self {
            id: format!("thinking_{}", now),
            role: Role::Model,
            text: THINKING_PLACEHOLDER.to_string(),
            images: None,
            timestamp: now,
        }
    }

    pub fn reply(text: &str, images: Option<Vec<String>>) -> Self {
        let now = now_millis();
        Self {
            id: prefixed_id("ai", now),
            role: Role::Model,
            text: text.to_string(),
            images,
            timestamp: now,
        }
    }

    pub fn is_thinking_placeholder(&self) -> bool {
        self.role == Role::Model && self.text == THINKING_PLACEHOLDER
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    pub name: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ChatRoom {
    pub fn new(name: &str) -> Self {
        let now = now_millis();
        Self {
            id: prefixed_id("room", now),
            name: name.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One page of a message listing, shared by the conversation log and room history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage<T> {
    pub messages: Vec<T>,
    pub has_more: bool,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// `{prefix}_{millis}_{9 random base36 chars}`
pub fn prefixed_id(prefix: &str, millis: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, millis, suffix)
}

/// Derives a room title from the first message of a conversation.
pub fn generate_room_name(first_message: &str) -> String {
    let cleaned = first_message.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= ROOM_NAME_MAX_LEN {
        return cleaned;
    }
    let head: String = cleaned.chars().take(ROOM_NAME_MAX_LEN - 3).collect();
    format!("{}...", head)
}

pub fn format_message_time(timestamp: i64, now: i64) -> String {
    let diff_in_hours = ((now - timestamp) as f64) / (1000.0 * 60.0 * 60.0);
    let local = match Local.timestamp_millis_opt(timestamp).single() {
        Some(t) => t,
        None => return String::new(),
    };

    if diff_in_hours < 1.0 {
        "Just now".to_string()
    } else if diff_in_hours < 24.0 {
        local.format("%H:%M").to_string()
    } else {
        local.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_name_collapses_whitespace_and_truncates() {
        assert_eq!(generate_room_name("  hello   there  "), "hello there");
        let long = "a".repeat(40);
        let name = generate_room_name(&long);
        assert_eq!(name.chars().count(), 30);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn message_time_buckets() {
        let now = now_millis();
        assert_eq!(format_message_time(now - 5 * 60 * 1000, now), "Just now");
        assert_eq!(format_message_time(now - 3 * 3600 * 1000, now).len(), 5);
        assert_eq!(format_message_time(now - 48 * 3600 * 1000, now).len(), 10);
    }

    #[test]
    fn ids_carry_prefix_and_suffix() {
        let id = prefixed_id("room", 42);
        assert!(id.starts_with("room_42_"));
        assert_eq!(id.len(), "room_42_".len() + 9);
    }

    #[test]
    fn placeholder_detection() {
        assert!(Message::thinking().is_thinking_placeholder());
        assert!(!Message::user("...", None).is_thinking_placeholder());
        assert!(!Message::reply("done", None).is_thinking_placeholder());
    }

    #[test]
    fn message_serializes_in_camel_case_without_empty_images() {
        let json = serde_json::to_value(Message::user(" hi ", None)).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "hi");
        assert!(json.get("images").is_none());
    }
}
