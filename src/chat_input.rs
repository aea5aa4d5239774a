use crate::responder::Responder;
use crate::store::AppStore;
use log::{ debug, error };
use std::sync::{ Arc, Mutex, MutexGuard };
use std::time::Duration;

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    NoActiveRoom,
    Busy,
    EmptyMessage,
}

impl SubmitOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubmitOutcome::Accepted => "Message sent",
            SubmitOutcome::NoActiveRoom => "Create or select a chatroom first",
            SubmitOutcome::Busy => "Still thinking about the previous message",
            SubmitOutcome::EmptyMessage => "Message is required",
        }
    }
}

#[derive(Default)]
struct InputState {
    generation: u64,
    thinking: bool,
}

/// The single entry point for chat turns. A newer debounced submission
/// supersedes a pending one, and nothing is accepted while a reply is pending.
pub struct ChatInput {
    store: Arc<AppStore>,
    responder: Arc<dyn Responder>,
    debounce: Duration,
    state: Arc<Mutex<InputState>>,
}

fn lock(state: &Mutex<InputState>) -> MutexGuard<'_, InputState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ChatInput {
    pub fn new(store: Arc<AppStore>, responder: Arc<dyn Responder>, debounce: Duration) -> Self {
        Self {
            store,
            responder,
            debounce,
            state: Arc::new(Mutex::new(InputState::default())),
        }
    }

    pub async fn has_active_room(&self) -> bool {
        match self.store.active_room_id().await {
            Some(id) => self.store.room(&id).await.is_some(),
            None => false,
        }
    }

    pub fn is_thinking(&self) -> bool {
        lock(&self.state).thinking
    }

    pub async fn submit(&self, text: &str, images: Option<Vec<String>>) -> SubmitOutcome {
        let text = text.trim().to_string();
        if !self.has_active_room().await {
            return SubmitOutcome::NoActiveRoom;
        }

        let generation = {
            let mut state = lock(&self.state);
            if state.thinking {
                return SubmitOutcome::Busy;
            }
            if text.is_empty() {
                return SubmitOutcome::EmptyMessage;
            }
            state.generation += 1;
            state.generation
        };

        let store = self.store.clone();
        let responder = self.responder.clone();
        let state = self.state.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut s = lock(&state);
                if s.generation != generation || s.thinking {
                    debug!("Submission {} superseded", generation);
                    return;
                }
                s.thinking = true;
            }

            exchange(&store, responder.as_ref(), &text, images).await;
            lock(&state).thinking = false;
        });

        SubmitOutcome::Accepted
    }

    /// Runs one turn without debouncing and returns `(reply, room_id)`.
    /// Shares the busy flag with [`ChatInput::submit`].
    pub async fn run_turn(
        &self,
        text: &str,
        images: Option<Vec<String>>
    ) -> Result<(String, String), SubmitOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitOutcome::EmptyMessage);
        }
        {
            let mut state = lock(&self.state);
            if state.thinking {
                return Err(SubmitOutcome::Busy);
            }
            state.generation += 1;
            state.thinking = true;
        }

        let result = exchange(&self.store, self.responder.as_ref(), text, images).await;
        lock(&self.state).thinking = false;
        result.ok_or(SubmitOutcome::NoActiveRoom)
    }
}

/// Placeholder, reply, replacement. `None` when there is no room to send to.
async fn exchange(
    store: &AppStore,
    responder: &dyn Responder,
    text: &str,
    images: Option<Vec<String>>
) -> Option<(String, String)> {
    let room_id = store.send_message(text, images).await?;
    let reply = match responder.respond(text).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Error generating reply for room {}: {}", room_id, e);
            FALLBACK_REPLY.to_string()
        }
    };
    store.receive_ai_message_in(&room_id, &reply, None).await;
    Some((reply, room_id))
}
