use crate::auth::validation::PromptInput;
use crate::chat_input::SubmitOutcome;
use crate::context::AppContext;
use crate::models::chat::{ generate_room_name, now_millis };
use crate::models::websocket::{ ClientMessage, ServerMessage };
use crate::server::tls::load_tls_config;

use std::collections::HashMap;
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_hdr_async, WebSocketStream };
use tokio_tungstenite::tungstenite::handshake::server::{ Request, Response, ErrorResponse };
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_rustls::TlsAcceptor;

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use url::form_urlencoded;

use log::{ debug, info, warn, error };
use futures::{ Sink, SinkExt, StreamExt };
use uuid::Uuid;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
const CONNECTIONS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(CONNECTIONS_PER_SECOND));
}

pub async fn start_ws_server(
    addr: &str,
    ctx: Arc<AppContext>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    let args = ctx.args.clone();
    let api_key = args.server_api_key.clone().filter(|k| !k.trim().is_empty());

    if api_key.is_some() {
        info!("WebSocket server configured with API Key authentication.");
    } else {
        warn!("WebSocket server configured WITHOUT API Key authentication. Connections are open.");
    }

    let tls_acceptor = if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let config = load_tls_config(cert_path, key_path)?;
                Some(TlsAcceptor::from(config))
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                return Err("TLS enabled without cert/key".into());
            }
        }
    } else {
        None
    };

    let protocol = if tls_acceptor.is_some() { "wss" } else { "ws" };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let ctx_clone = Arc::clone(&ctx);
        let required_api_key = api_key.clone();
        let tls_acceptor_clone = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor_clone {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, ctx_clone, required_api_key).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                    }
                }
            } else {
                process_connection(peer, stream, ctx_clone, required_api_key).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

/// Key from the `X-API-Key` header, else the `api_key` query parameter.
fn provided_api_key(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    from_header.or_else(|| {
        let qs = req.uri().query().unwrap_or("");
        let params: HashMap<String, String> =
            form_urlencoded::parse(qs.as_bytes()).into_owned().collect();
        params.get("api_key").cloned()
    })
}

fn unauthorized() -> ErrorResponse {
    let mut res = ErrorResponse::new(Some("Unauthorized".into()));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    ctx: Arc<AppContext>,
    required_api_key: Option<String>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    let auth_callback = |req: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let Some(required) = &required_api_key else {
            return Ok(response);
        };
        if provided_api_key(req).as_deref() != Some(required.as_str()) {
            warn!("{}: bad or missing API key", peer);
            return Err(unauthorized());
        }
        info!("{} authenticated", peer);
        Ok(response)
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            handle_connection(peer, ws, ctx).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

async fn send_json<T>(tx: &mut T, msg: &ServerMessage) -> bool
    where T: Sink<Message> + Unpin
{
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            false
        }
    }
}

/// One chat turn through the shared input. Returns the reply and its room.
/// Opens a room named after the message when no existing room is active.
async fn run_chat_turn(
    ctx: &AppContext,
    content: &str,
    images: Option<Vec<String>>
) -> Result<(String, String), SubmitOutcome> {
    if ctx.chat_input.is_thinking() {
        return Err(SubmitOutcome::Busy);
    }
    if !ctx.chat_input.has_active_room().await {
        let room_id = ctx.store.create_room(&generate_room_name(content)).await;
        debug!("Opened room {} for first message", room_id);
    }
    ctx.chat_input.run_turn(content, images).await
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    ctx: Arc<AppContext>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    let (mut tx, mut rx) = websocket.split();
    let connection_id = Uuid::new_v4().to_string();
    info!("New WebSocket connection {} from {}", connection_id, peer);

    while let Some(msg) = rx.next().await {
        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_MESSAGE_SIZE {
            warn!(
                "Message from {} exceeds size limit ({} > {})",
                peer,
                message.len(),
                MAX_MESSAGE_SIZE
            );
            let error_msg = ServerMessage::Error { message: "Message too large".to_string() };
            if !send_json(&mut tx, &error_msg).await {
                error!("Failed to send size limit error to {}", peer);
            }
            break;
        }

        match message {
            Message::Text(text) => {
                let (content, images) = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Chat { content, images }) => (content, images),
                    Err(e) => {
                        error!("Failed to parse message from {}: {}", peer, e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Failed to parse message: {}", e),
                        };
                        if !send_json(&mut tx, &error_msg).await {
                            break;
                        }
                        continue;
                    }
                };

                let input = PromptInput {
                    message: content.trim().to_string(),
                    images: images.clone().unwrap_or_default(),
                };
                if let Err(e) = input.validate() {
                    if !send_json(&mut tx, &ServerMessage::Error { message: e.to_string() }).await {
                        break;
                    }
                    continue;
                }

                if ctx.chat_input.is_thinking() {
                    let busy = ServerMessage::Error { message: SubmitOutcome::Busy.message().to_string() };
                    if !send_json(&mut tx, &busy).await {
                        break;
                    }
                    continue;
                }

                if !send_json(&mut tx, &ServerMessage::Processing).await {
                    error!("Error sending processing status to {}", peer);
                    break;
                }

                let reply = match run_chat_turn(&ctx, &content, images).await {
                    Ok((content, room_id)) =>
                        ServerMessage::Response { content, timestamp: now_millis(), room_id },
                    Err(outcome) => ServerMessage::Error { message: outcome.message().to_string() },
                };
                if !send_json(&mut tx, &reply).await {
                    error!("Error sending reply to {}", peer);
                    break;
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection {} closed for {}", connection_id, peer);
}
