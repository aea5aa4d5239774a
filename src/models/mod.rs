pub mod chat;
pub mod country;
pub mod session;
pub mod websocket;
