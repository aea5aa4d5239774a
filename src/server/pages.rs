use crate::auth::guard::route_guard;
use crate::context::AppContext;
use crate::error::ApiError;
use crate::models::chat::{ format_message_time, now_millis, ChatRoom, Message };
use crate::models::session::Session;
use axum::{ extract::{ Path, State }, middleware, routing::get, Json, Router };
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct PageView {
    pub page: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub message_count: usize,
    pub updated_at: i64,
    pub last_message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub session: Session,
    pub rooms: Vec<RoomSummary>,
    pub active_room_id: Option<String>,
    pub is_thinking: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub display_time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub messages: Vec<MessageView>,
    pub is_thinking: bool,
}

impl From<&ChatRoom> for RoomSummary {
    fn from(room: &ChatRoom) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            message_count: room.messages.len(),
            updated_at: room.updated_at,
            last_message: room.messages.last().map(|m| m.text.clone()),
        }
    }
}

/// Guarded page routes. Each returns the JSON view model the front end draws.
pub fn router(cookie_name: String) -> Router<Arc<AppContext>> {
    Router::new()
        .route("/", get(|| async { Json(PageView { page: "landing" }) }))
        .route("/login", get(|| async { Json(PageView { page: "login" }) }))
        .route("/signup", get(|| async { Json(PageView { page: "signup" }) }))
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/{room_id}", get(room_page_handler))
        .route_layer(middleware::from_fn_with_state(cookie_name, route_guard))
}

async fn dashboard_handler(State(ctx): State<Arc<AppContext>>) -> Json<DashboardView> {
    let state = ctx.store.snapshot().await;
    Json(DashboardView {
        session: state.session(),
        rooms: state.rooms.iter().map(RoomSummary::from).collect(),
        active_room_id: state.active_room_id,
        is_thinking: state.is_thinking,
    })
}

/// Opening a room page makes it the active room.
async fn room_page_handler(
    State(ctx): State<Arc<AppContext>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomView>, ApiError> {
    let room = ctx.store
        .room(&room_id).await
        .ok_or_else(|| ApiError::NotFound("Chatroom not found".into()))?;
    ctx.store.set_active_room(&room_id).await;

    let now = now_millis();
    Ok(Json(RoomView {
        id: room.id,
        name: room.name,
        messages: room.messages
            .into_iter()
            .map(|m| MessageView { display_time: format_message_time(m.timestamp, now), message: m })
            .collect(),
        is_thinking: ctx.store.is_thinking().await,
    }))
}
