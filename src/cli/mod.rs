use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Storage Args ---
    /// Persisted state backend (file, memory, redis)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Directory holding the persisted state blob when STORAGE_TYPE=file
    #[arg(long, env = "STORAGE_PATH", default_value = "data")]
    pub storage_path: String,

    /// Key of the persisted state blob. Also used as the session cookie name.
    #[arg(long, env = "STORAGE_KEY", default_value = "easy-chat-store")]
    pub storage_key: String,

    /// Redis endpoint used when STORAGE_TYPE=redis (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORAGE_REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub storage_redis_url: String,

    // --- Data Source Args ---
    /// Path to the static conversation log served by /api/messages.
    #[arg(long, env = "CONVERSATIONS_PATH", default_value = "data/conversations.json")]
    pub conversations_path: String,

    /// Public country-data endpoint used for dial code lookup.
    #[arg(
        long,
        env = "COUNTRIES_URL",
        default_value = "https://restcountries.com/v3.1/all?fields=name,cca2,idd"
    )]
    pub countries_url: String,

    // --- OTP Simulator Args ---
    /// Delay before a simulated OTP send resolves, in milliseconds.
    #[arg(long, env = "OTP_SEND_DELAY_MS", default_value = "1500")]
    pub otp_send_delay_ms: u64,

    /// Delay before a simulated OTP verification resolves, in milliseconds.
    #[arg(long, env = "OTP_VERIFY_DELAY_MS", default_value = "1000")]
    pub otp_verify_delay_ms: u64,

    /// The only code the simulator accepts.
    #[arg(long, env = "OTP_CODE", default_value = "123456")]
    pub otp_code: String,

    /// Display name given to users who log in with a phone number only.
    #[arg(long, env = "DEFAULT_DISPLAY_NAME", default_value = "Guest")]
    pub default_display_name: String,

    /// Lifetime of the session cookie, in days.
    #[arg(long, env = "COOKIE_MAX_AGE_DAYS", default_value = "7")]
    pub cookie_max_age_days: i64,

    // --- Responder Args ---
    /// Simulated responder style (canned, echo)
    #[arg(long, env = "RESPONDER_TYPE", default_value = "canned")]
    pub responder_type: String,

    /// Lower bound of the simulated thinking time, in milliseconds.
    #[arg(long, env = "RESPONDER_MIN_DELAY_MS", default_value = "500")]
    pub responder_min_delay_ms: u64,

    /// Upper bound of the simulated thinking time, in milliseconds.
    #[arg(long, env = "RESPONDER_MAX_DELAY_MS", default_value = "2000")]
    pub responder_max_delay_ms: u64,

    /// Delay before a page of generated room history is returned, in milliseconds.
    #[arg(long, env = "HISTORY_DELAY_MS", default_value = "1000")]
    pub history_delay_ms: u64,

    /// Window in which a newer chat submission replaces a pending one, in milliseconds.
    #[arg(long, env = "INPUT_DEBOUNCE_MS", default_value = "300")]
    pub input_debounce_ms: u64,

    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Port for the HTTP API and page routes.
    #[arg(long, env = "HTTP_PORT", default_value = "3000")]
    pub http_port: u16,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    /// Arguments with every simulated delay set to zero and an in-memory store.
    pub fn for_tests() -> Self {
        let mut args = Args::parse_from(["easy-chat"]);
        args.storage_type = "memory".into();
        args.otp_send_delay_ms = 0;
        args.otp_verify_delay_ms = 0;
        args.responder_min_delay_ms = 0;
        args.responder_max_delay_ms = 0;
        args.history_delay_ms = 0;
        args.input_debounce_ms = 0;
        args
    }
}
