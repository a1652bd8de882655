pub mod cli;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use history::initialize_history_store;
use llm::{ chat::new_client, LlmConfig };
use log::{ info, warn };
use server::api::{ AppState, ChatSettings };
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = LlmConfig::from_args(&args);

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Gemini Configured: {}", llm_config.is_configured());
    info!("Gemini Base URL: {}", args.gemini_base_url);
    info!("Gemini Timeout (s): {}", args.gemini_timeout_secs);
    info!("Gemini Send Turn Roles: {}", args.gemini_send_turn_roles);
    info!("Default User Id: {}", args.default_user_id);
    info!("User Id Header: {}", args.user_id_header);
    info!("History Max Turns: {}", args.history_max_turns);
    info!("History Commit On Success: {}", args.history_commit_on_success);
    info!("CORS Origins: {}", args.cors_origins);
    info!("CORS Allow Credentials: {}", args.cors_allow_credentials);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let chat_client = new_client(&llm_config)?;
    match &chat_client {
        Some(client) => info!("Gemini client ready: base_url={}", client.get_base_url()),
        None => warn!("GEMINI_API_KEY is not set. /chat will answer 500 until it is configured."),
    }

    let history = initialize_history_store(&args);
    let settings = ChatSettings::from_args(&args)?;
    let state = AppState::new(history, chat_client, settings);

    let server = Server::new(args.server_addr.clone(), state, args.clone());
    server.run().await?;

    Ok(())
}
