use crate::models::chat::{ now_millis, ChatRoom, Message, MessagePage, Role };
use crate::models::session::{ AppState, PersistedBlob, Session };
use crate::storage::StateStorage;
use log::{ debug, info, warn };
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const HISTORY_PAGE_SIZE: usize = 10;
const HISTORY_LAST_PAGE: u32 = 5;

/// Session, chat rooms and the thinking flag. Every mutation writes the whole
/// state back to storage under one key; the last write wins.
pub struct AppStore {
    state: Mutex<AppState>,
    storage: Arc<dyn StateStorage>,
    key: String,
    history_delay: Duration,
}

impl AppStore {
    /// Rehydrates from storage. A missing or unreadable blob yields the default state.
    pub async fn load(storage: Arc<dyn StateStorage>, key: &str, history_delay: Duration) -> Self {
        let state = match storage.get_item(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedBlob<AppState>>(&raw) {
                Ok(blob) => {
                    info!("Restored {} chat room(s) from '{}'", blob.state.rooms.len(), key);
                    blob.state
                }
                Err(e) => {
                    warn!("Ignoring unparseable persisted state '{}': {}", key, e);
                    AppState::default()
                }
            },
            Ok(None) => AppState::default(),
            Err(e) => {
                warn!("Failed to read persisted state '{}': {}", key, e);
                AppState::default()
            }
        };

        Self {
            state: Mutex::new(state),
            storage,
            key: key.to_string(),
            history_delay,
        }
    }

    /// Applies `f` to the state, persists the result and returns what `f` returned.
    async fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.lock().await;
        let result = f(&mut state);
        self.persist(&state).await;
        result
    }

    async fn persist(&self, state: &AppState) {
        let blob = PersistedBlob { state, version: 0 };
        let json = match serde_json::to_string(&blob) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize app state: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(&self.key, &json).await {
            warn!("Failed to persist app state '{}': {}", self.key, e);
        }
    }

    pub async fn login(&self, phone: &str, name: &str) {
        info!("Logging in {} ({})", name, phone);
        self.update(|s| {
            s.is_logged_in = true;
            s.phone = Some(phone.to_string());
            s.name = Some(name.to_string());
        }).await
    }

    pub async fn logout(&self) {
        info!("Logging out and clearing chat state");
        self.update(|s| *s = AppState::default()).await
    }

    pub async fn session(&self) -> Session {
        self.state.lock().await.session()
    }

    /// Creates a room at the head of the list and makes it active.
    pub async fn create_room(&self, name: &str) -> String {
        self.update(|s| {
            let name = if name.trim().is_empty() {
                format!("Chat {}", s.rooms.len() + 1)
            } else {
                name.to_string()
            };
            let mut room = ChatRoom::new(&name);
            while s.rooms.iter().any(|r| r.id == room.id) {
                room = ChatRoom::new(&name);
            }
            let id = room.id.clone();
            info!("Created room '{}' ({})", room.name, id);
            s.rooms.insert(0, room);
            s.active_room_id = Some(id.clone());
            id
        }).await
    }

    /// Returns whether a room was removed.
    pub async fn delete_room(&self, id: &str) -> bool {
        self.update(|s| {
            let before = s.rooms.len();
            s.rooms.retain(|r| r.id != id);
            if s.active_room_id.as_deref() == Some(id) {
                s.active_room_id = s.rooms.first().map(|r| r.id.clone());
            }
            let removed = s.rooms.len() != before;
            if removed {
                info!("Deleted room {}", id);
            }
            removed
        }).await
    }

    pub async fn set_active_room(&self, id: &str) {
        self.update(|s| {
            s.active_room_id = Some(id.to_string());
            s.is_thinking = false;
        }).await
    }

    /// Appends the user message and a thinking placeholder to the active room.
    /// Returns the room id, or `None` when no existing room is active.
    pub async fn send_message(&self, text: &str, images: Option<Vec<String>>) -> Option<String> {
        self.update(|s| {
            let active = s.active_room_id.clone()?;
            let room = s.rooms.iter_mut().find(|r| r.id == active)?;
            room.messages.push(Message::user(text, images));
            room.messages.push(Message::thinking());
            room.updated_at = now_millis();
            s.is_thinking = true;
            debug!("Queued message for room {}", active);
            Some(active)
        }).await
    }

    /// Delivers a reply to the active room.
    pub async fn receive_ai_message(&self, text: &str, images: Option<Vec<String>>) {
        self.update(|s| {
            if let Some(active) = s.active_room_id.clone() {
                apply_reply(s, &active, text, images);
            }
        }).await
    }

    /// Delivers a reply to the room it was requested from, whatever is active now.
    pub async fn receive_ai_message_in(&self, room_id: &str, text: &str, images: Option<Vec<String>>) {
        self.update(|s| apply_reply(s, room_id, text, images)).await
    }

    pub async fn update_thinking_state(&self, is_thinking: bool) {
        self.update(|s| s.is_thinking = is_thinking).await
    }

    pub async fn reset_chat(&self) {
        self.update(|s| {
            s.rooms.clear();
            s.active_room_id = None;
            s.is_thinking = false;
        }).await
    }

    pub async fn rooms(&self) -> Vec<ChatRoom> {
        self.state.lock().await.rooms.clone()
    }

    pub async fn room(&self, id: &str) -> Option<ChatRoom> {
        self.state.lock().await.rooms.iter().find(|r| r.id == id).cloned()
    }

    pub async fn active_room_id(&self) -> Option<String> {
        self.state.lock().await.active_room_id.clone()
    }

    pub async fn is_thinking(&self) -> bool {
        self.state.lock().await.is_thinking
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.lock().await.clone()
    }

    /// Generated older messages for infinite scroll. The last page is 5.
    pub async fn load_more_messages(&self, room_id: &str, page: u32) -> MessagePage<Message> {
        tokio::time::sleep(self.history_delay).await;
        debug!("Loading history page {} for room {}", page, room_id);

        let now = now_millis();
        let messages = (0..HISTORY_PAGE_SIZE)
            .map(|i| {
                let from_user = i % 2 == 0;
                Message {
                    id: format!("historical_{}_{}", page, i),
                    role: if from_user { Role::User } else { Role::Model },
                    text: format!(
                        "Historical message {}-{}: {}",
                        page,
                        i + 1,
                        if from_user { "User message" } else { "AI response" }
                    ),
                    images: (i % 3 == 0).then(|| vec![format!("dummy-image-{}.jpg", i)]),
                    timestamp: now - ((page as i64) * 10 + (i as i64)) * 60_000,
                }
            })
            .collect();

        MessagePage { messages, has_more: page < HISTORY_LAST_PAGE }
    }
}

/// Replaces a trailing placeholder with the reply, or appends it.
fn apply_reply(state: &mut AppState, room_id: &str, text: &str, images: Option<Vec<String>>) {
    if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
        let reply = Message::reply(text, images);
        match room.messages.last_mut() {
            Some(last) if last.is_thinking_placeholder() => *last = reply,
            _ => room.messages.push(reply),
        }
        room.updated_at = now_millis();
    }
    state.is_thinking = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::THINKING_PLACEHOLDER;
    use crate::storage::MemoryStateStorage;

    const KEY: &str = "easy-chat-store";

    async fn new_store() -> (AppStore, Arc<dyn StateStorage>) {
        let storage: Arc<dyn StateStorage> = Arc::new(MemoryStateStorage::default());
        let store = AppStore::load(storage.clone(), KEY, Duration::ZERO).await;
        (store, storage)
    }

    #[tokio::test]
    async fn created_rooms_are_unique_and_prepended() {
        let (store, _) = new_store().await;
        let first = store.create_room("First").await;
        let second = store.create_room("Second").await;

        assert_ne!(first, second);
        let rooms = store.rooms().await;
        assert_eq!(rooms[0].id, second);
        assert_eq!(rooms[1].id, first);
        assert_eq!(store.active_room_id().await.as_deref(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn blank_room_name_gets_numbered_default() {
        let (store, _) = new_store().await;
        store.create_room("a").await;
        let id = store.create_room("   ").await;
        assert_eq!(store.room(&id).await.unwrap().name, "Chat 2");
    }

    #[tokio::test]
    async fn send_without_active_room_is_noop() {
        let (store, _) = new_store().await;
        assert_eq!(store.send_message("hi", None).await, None);
        assert!(!store.is_thinking().await);
        assert!(store.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn room_name_is_kept_as_given() {
        let (store, _) = new_store().await;
        let id = store.create_room("  Padded name ").await;
        assert_eq!(store.room(&id).await.unwrap().name, "  Padded name ");
    }

    #[tokio::test]
    async fn send_to_vanished_active_room_is_noop() {
        let (store, _) = new_store().await;
        store.set_active_room("room_0_gone").await;
        assert_eq!(store.send_message("hi", None).await, None);
        assert!(!store.is_thinking().await);
    }

    #[tokio::test]
    async fn reply_replaces_placeholder_instead_of_duplicating() {
        let (store, _) = new_store().await;
        let id = store.create_room("Room").await;

        assert_eq!(store.send_message("hi", None).await.as_deref(), Some(id.as_str()));
        let room = store.room(&id).await.unwrap();
        assert_eq!(room.messages.len(), 2);
        assert_eq!(room.messages[0].role, Role::User);
        assert_eq!(room.messages[0].text, "hi");
        assert_eq!(room.messages[1].text, THINKING_PLACEHOLDER);
        assert!(store.is_thinking().await);

        store.receive_ai_message("Hello! How can I help you today?", None).await;
        let room = store.room(&id).await.unwrap();
        assert_eq!(room.messages.len(), 2);
        assert_eq!(room.messages[1].role, Role::Model);
        assert_eq!(room.messages[1].text, "Hello! How can I help you today?");
        assert!(!store.is_thinking().await);
    }

    #[tokio::test]
    async fn reply_without_placeholder_is_appended() {
        let (store, _) = new_store().await;
        let id = store.create_room("Room").await;
        store.receive_ai_message("unsolicited", None).await;
        assert_eq!(store.room(&id).await.unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn targeted_reply_lands_in_its_own_room() {
        let (store, _) = new_store().await;
        let first = store.create_room("First").await;
        store.send_message("question", None).await;
        let second = store.create_room("Second").await;

        store.receive_ai_message_in(&first, "answer", None).await;
        assert_eq!(store.room(&first).await.unwrap().messages[1].text, "answer");
        assert!(store.room(&second).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn deleting_active_room_moves_to_next_or_none() {
        let (store, _) = new_store().await;
        let older = store.create_room("Older").await;
        let newer = store.create_room("Newer").await;

        assert!(store.delete_room(&newer).await);
        assert_eq!(store.active_room_id().await.as_deref(), Some(older.as_str()));

        assert!(store.delete_room(&older).await);
        assert_eq!(store.active_room_id().await, None);
        assert!(!store.delete_room(&older).await);
    }

    #[tokio::test]
    async fn deleting_inactive_room_keeps_active() {
        let (store, _) = new_store().await;
        let older = store.create_room("Older").await;
        let newer = store.create_room("Newer").await;
        store.delete_room(&older).await;
        assert_eq!(store.active_room_id().await.as_deref(), Some(newer.as_str()));
    }

    #[tokio::test]
    async fn activating_room_clears_thinking() {
        let (store, _) = new_store().await;
        let id = store.create_room("Room").await;
        store.update_thinking_state(true).await;
        store.set_active_room(&id).await;
        assert!(!store.is_thinking().await);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let (store, _) = new_store().await;
        store.login("+911234567890", "Ada").await;
        store.create_room("Room").await;
        store.logout().await;
        assert_eq!(store.snapshot().await, AppState::default());
    }

    #[tokio::test]
    async fn state_survives_reload_through_storage() {
        let (store, storage) = new_store().await;
        store.login("+15550001111", "Ada").await;
        let id = store.create_room("Persisted").await;

        let reloaded = AppStore::load(storage, KEY, Duration::ZERO).await;
        let session = reloaded.session().await;
        assert!(session.is_logged_in);
        assert_eq!(session.name.as_deref(), Some("Ada"));
        assert_eq!(reloaded.room(&id).await.unwrap().name, "Persisted");
    }

    #[tokio::test]
    async fn unparseable_blob_loads_as_default() {
        let storage: Arc<dyn StateStorage> = Arc::new(MemoryStateStorage::default());
        storage.set_item(KEY, "{not json").await.unwrap();
        let store = AppStore::load(storage, KEY, Duration::ZERO).await;
        assert_eq!(store.snapshot().await, AppState::default());
    }

    #[tokio::test]
    async fn history_pages_stop_after_five() {
        let (store, _) = new_store().await;
        let page = store.load_more_messages("room", 2).await;
        assert_eq!(page.messages.len(), 10);
        assert!(page.has_more);
        assert_eq!(page.messages[0].id, "historical_2_0");
        assert_eq!(page.messages[1].role, Role::Model);
        assert!(page.messages[3].images.is_some());
        assert!(page.messages[1].images.is_none());
        assert!(!store.load_more_messages("room", 5).await.has_more);
    }
}
