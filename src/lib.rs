pub mod auth;
pub mod chat_input;
pub mod cli;
pub mod context;
pub mod conversations;
pub mod country;
pub mod error;
pub mod models;
pub mod responder;
pub mod server;
pub mod storage;
pub mod store;

use cli::Args;
use context::AppContext;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("HTTP Port: {}", args.http_port);
    info!("WebSocket Address: {}", args.server_addr);
    info!("Storage Type: {}", args.storage_type);
    info!("Storage Key: {}", args.storage_key);
    info!("Conversations Path: {}", args.conversations_path);
    info!("Countries URL: {}", args.countries_url);
    info!("Responder Type: {}", args.responder_type);
    info!(
        "Responder Delay: {}-{} ms",
        args.responder_min_delay_ms,
        args.responder_max_delay_ms
    );
    info!("Input Debounce: {} ms", args.input_debounce_ms);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let ctx = Arc::new(AppContext::from_args(&args).await?);
    let server = Server::new(ctx);
    server.run().await?;

    Ok(())
}
