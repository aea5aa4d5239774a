use serde::{ Serialize, Deserialize };
use super::chat::ChatRoom;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Everything the store owns. Field names match the persisted blob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub is_logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rooms: Vec<ChatRoom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_room_id: Option<String>,
    #[serde(default)]
    pub is_thinking: bool,
}

impl AppState {
    pub fn session(&self) -> Session {
        Session {
            is_logged_in: self.is_logged_in,
            phone: self.phone.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedBlob<T> {
    pub state: T,
    #[serde(default)]
    pub version: u32,
}
