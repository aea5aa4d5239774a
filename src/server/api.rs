use crate::auth::guard::{ clear_session_cookie, session_cookie };
use crate::auth::validation::{ OtpForm, PhoneForm, PromptInput, SignupForm };
use crate::chat_input::SubmitOutcome;
use crate::context::{ AppContext, PendingLogin };
use crate::conversations::{ parse_page, LogMessage };
use crate::error::{ ApiError, ApiResponse };
use crate::models::chat::{ ChatRoom, Message, MessagePage };
use crate::models::country::FormattedCountry;
use crate::models::session::Session;
use crate::server::pages;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    extract::{ Path, Query, State },
    response::IntoResponse,
    http::{ header::SET_COOKIE, StatusCode },
    Json,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

type SharedContext = Arc<AppContext>;

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsResponse {
    pub rooms: Vec<ChatRoom>,
    pub active_room_id: Option<String>,
    pub is_thinking: bool,
}

pub fn router(ctx: SharedContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/messages", get(messages_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/verify", post(verify_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/session", get(session_handler))
        .route("/api/rooms", get(list_rooms_handler).post(create_room_handler))
        .route("/api/rooms/{id}", get(get_room_handler).delete(delete_room_handler))
        .route("/api/rooms/{id}/activate", post(activate_room_handler))
        .route("/api/rooms/{id}/history", get(room_history_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/reset", post(reset_chat_handler));

    api.merge(pages::router(ctx.args.storage_key.clone()))
        .layer(cors)
        .with_state(ctx)
}

pub async fn start_http_server(
    http_port: u16,
    ctx: SharedContext,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let args = ctx.args.clone();
    let app = router(ctx);

    match (args.enable_tls, &args.tls_cert_path, &args.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            tokio::spawn(async move {
                let result = axum_server::bind_rustls(addr, tls_config)
                    .serve(app.into_make_service())
                    .await;

                if let Err(e) = result {
                    error!("HTTPS server error: {}", e);
                }
            });

            info!("HTTPS server started with TLS enabled");
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;

            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            });

            info!("HTTP server started");
        }
    }

    Ok(())
}

async fn messages_handler(
    State(ctx): State<SharedContext>,
    Query(q): Query<PageQuery>,
) -> Json<MessagePage<LogMessage>> {
    Json(ctx.conversations.page(parse_page(q.page.as_deref())))
}

async fn countries_handler(
    State(ctx): State<SharedContext>,
) -> Result<Json<Vec<FormattedCountry>>, ApiError> {
    Ok(Json(ctx.countries.get_countries().await?))
}

async fn request_otp(ctx: &AppContext, pending: PendingLogin) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !ctx.otp.send_otp(&pending.phone).await {
        return Err(ApiError::BadRequest("Failed to send OTP. Please try again.".into()));
    }
    *ctx.pending_login.lock().await = Some(pending);
    Ok(Json(ApiResponse::message("OTP sent successfully!")))
}

async fn login_handler(
    State(ctx): State<SharedContext>,
    Json(form): Json<PhoneForm>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    form.validate()?;
    let pending = PendingLogin {
        phone: form.full_phone(),
        name: ctx.args.default_display_name.clone(),
    };
    request_otp(&ctx, pending).await
}

async fn signup_handler(
    State(ctx): State<SharedContext>,
    Json(form): Json<SignupForm>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    form.validate()?;
    let pending = PendingLogin {
        phone: form.full_phone(),
        name: form.name.trim().to_string(),
    };
    request_otp(&ctx, pending).await
}

async fn verify_handler(
    State(ctx): State<SharedContext>,
    Json(form): Json<OtpForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let pending = ctx.pending_login
        .lock().await
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Request an OTP before verifying".into()))?;

    if !ctx.otp.verify_otp(&form.otp).await {
        return Err(ApiError::Unauthorized("Invalid OTP".into()));
    }

    {
        let mut current = ctx.pending_login.lock().await;
        if current.as_ref() == Some(&pending) {
            current.take();
        }
    }
    ctx.store.login(&pending.phone, &pending.name).await;
    let session = ctx.store.session().await;
    let cookie = session_cookie(&ctx.args.storage_key, &session, ctx.args.cookie_max_age_days);

    Ok(([(SET_COOKIE, cookie)], Json(ApiResponse::ok("Login successful!", session))))
}

async fn logout_handler(State(ctx): State<SharedContext>) -> impl IntoResponse {
    ctx.store.logout().await;
    ctx.pending_login.lock().await.take();
    (
        [(SET_COOKIE, clear_session_cookie(&ctx.args.storage_key))],
        Json(ApiResponse::message("Logged out")),
    )
}

async fn session_handler(State(ctx): State<SharedContext>) -> Json<Session> {
    Json(ctx.store.session().await)
}

async fn list_rooms_handler(State(ctx): State<SharedContext>) -> Json<RoomsResponse> {
    let state = ctx.store.snapshot().await;
    Json(RoomsResponse {
        rooms: state.rooms,
        active_room_id: state.active_room_id,
        is_thinking: state.is_thinking,
    })
}

async fn create_room_handler(
    State(ctx): State<SharedContext>,
    body: Option<Json<CreateRoomRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let id = ctx.store.create_room(req.name.as_deref().unwrap_or("")).await;
    let room = ctx.store
        .room(&id).await
        .ok_or_else(|| ApiError::NotFound("Chatroom not found".into()))?;
    let message = format!("Chatroom \"{}\" created", room.name);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, room))))
}

async fn get_room_handler(
    State(ctx): State<SharedContext>,
    Path(id): Path<String>,
) -> Result<Json<ChatRoom>, ApiError> {
    ctx.store
        .room(&id).await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Chatroom not found".into()))
}

async fn delete_room_handler(
    State(ctx): State<SharedContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Option<String>>>, ApiError> {
    if !ctx.store.delete_room(&id).await {
        return Err(ApiError::NotFound("Chatroom not found".into()));
    }
    let active = ctx.store.active_room_id().await;
    Ok(Json(ApiResponse::ok("Chatroom deleted", active)))
}

async fn activate_room_handler(
    State(ctx): State<SharedContext>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if ctx.store.room(&id).await.is_none() {
        return Err(ApiError::NotFound("Chatroom not found".into()));
    }
    ctx.store.set_active_room(&id).await;
    Ok(Json(ApiResponse::message("Chatroom activated")))
}

async fn room_history_handler(
    State(ctx): State<SharedContext>,
    Path(id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<MessagePage<Message>>, ApiError> {
    if ctx.store.room(&id).await.is_none() {
        return Err(ApiError::NotFound("Chatroom not found".into()));
    }
    let page = parse_page(q.page.as_deref());
    Ok(Json(ctx.store.load_more_messages(&id, page).await))
}

async fn chat_handler(
    State(ctx): State<SharedContext>,
    Json(input): Json<PromptInput>,
) -> Result<impl IntoResponse, ApiError> {
    input.validate()?;
    let images = Some(input.images).filter(|i| !i.is_empty());

    match ctx.chat_input.submit(&input.message, images).await {
        SubmitOutcome::Accepted =>
            Ok((StatusCode::ACCEPTED, Json(ApiResponse::message(SubmitOutcome::Accepted.message())))),
        rejected @ (SubmitOutcome::NoActiveRoom | SubmitOutcome::Busy) =>
            Err(ApiError::Conflict(rejected.message().into())),
        SubmitOutcome::EmptyMessage =>
            Err(ApiError::BadRequest(SubmitOutcome::EmptyMessage.message().into())),
    }
}

async fn reset_chat_handler(State(ctx): State<SharedContext>) -> Json<ApiResponse<()>> {
    ctx.store.reset_chat().await;
    Json(ApiResponse::message("Chat history cleared"))
}
