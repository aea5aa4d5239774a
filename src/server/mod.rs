pub mod api;
pub mod pages;
pub mod tls;
pub mod websocket;

use crate::context::AppContext;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    ctx: Arc<AppContext>,
}

impl Server {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Starts the HTTP API in the background, then serves WebSocket clients until failure.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(self.ctx.args.http_port, self.ctx.clone()).await?;
        websocket::start_ws_server(&self.ctx.args.server_addr, self.ctx.clone()).await
    }
}
