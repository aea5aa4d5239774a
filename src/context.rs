use crate::auth::OtpSimulator;
use crate::chat_input::ChatInput;
use crate::cli::Args;
use crate::conversations::ConversationLog;
use crate::country::CountryClient;
use crate::responder::{ new_responder, Responder, ResponderType, ThinkingDelay };
use crate::storage::initialize_state_storage;
use crate::store::AppStore;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Phone and display name waiting for OTP verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub phone: String,
    pub name: String,
}

/// Everything request handlers and WebSocket sessions share.
pub struct AppContext {
    pub store: Arc<AppStore>,
    pub responder: Arc<dyn Responder>,
    pub chat_input: ChatInput,
    pub otp: OtpSimulator,
    pub countries: CountryClient,
    pub conversations: ConversationLog,
    pub pending_login: Mutex<Option<PendingLogin>>,
    pub args: Args,
}

impl AppContext {
    pub async fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let storage = initialize_state_storage(args)?;
        let store = Arc::new(
            AppStore::load(storage, &args.storage_key, Duration::from_millis(args.history_delay_ms)).await
        );

        let responder_type: ResponderType = args.responder_type.parse()?;
        let delay = ThinkingDelay::new(
            Duration::from_millis(args.responder_min_delay_ms),
            Duration::from_millis(args.responder_max_delay_ms)
        );
        let responder = new_responder(responder_type, delay);

        url::Url::parse(&args.countries_url)
            .map_err(|e| format!("Invalid COUNTRIES_URL '{}': {}", args.countries_url, e))?;

        Ok(Self {
            chat_input: ChatInput::new(
                store.clone(),
                responder.clone(),
                Duration::from_millis(args.input_debounce_ms)
            ),
            store,
            responder,
            otp: OtpSimulator::new(
                args.otp_code.clone(),
                Duration::from_millis(args.otp_send_delay_ms),
                Duration::from_millis(args.otp_verify_delay_ms)
            ),
            countries: CountryClient::new(args.countries_url.clone()),
            conversations: ConversationLog::load(&args.conversations_path),
            pending_login: Mutex::new(None),
            args: args.clone(),
        })
    }
}
