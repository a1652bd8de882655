use clap::Parser;

use crate::llm::DEFAULT_GEMINI_BASE_URL;

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Chat backend for the browser extension, backed by Google Gemini", long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8000")]
    pub server_addr: String,

    // --- Gemini Args ---
    /// API key for the Gemini generative-language API. Without it /chat answers 500.
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Base URL of the Gemini API, up to and excluding "/models".
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Timeout in seconds for a single Gemini call. 0 waits indefinitely.
    #[arg(long, env = "GEMINI_TIMEOUT_SECS", default_value = "0")]
    pub gemini_timeout_secs: u64,

    /// Send each turn with its own role (user/model) instead of sending the whole history as "user".
    #[arg(
        long,
        env = "GEMINI_SEND_TURN_ROLES",
        default_value = "false",
        value_parser = parse_bool,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub gemini_send_turn_roles: bool,

    // --- History Args ---
    /// Conversation key used when the request carries no user id header.
    #[arg(long, env = "DEFAULT_USER_ID", default_value = "default_user")]
    pub default_user_id: String,

    /// Request header holding the caller's user/session id.
    #[arg(long, env = "USER_ID_HEADER", default_value = "x-user-id")]
    pub user_id_header: String,

    /// Maximum turns kept per user; oldest are dropped first. 0 keeps everything.
    #[arg(long, env = "HISTORY_MAX_TURNS", default_value = "0")]
    pub history_max_turns: usize,

    /// Store the user turn only once Gemini has answered, so failed calls leave no trace.
    #[arg(
        long,
        env = "HISTORY_COMMIT_ON_SUCCESS",
        default_value = "false",
        value_parser = parse_bool,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub history_commit_on_success: bool,

    // --- CORS Args ---
    /// Comma separated list of allowed origins. "*" allows any origin.
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allow credentials on cross-origin requests.
    #[arg(
        long,
        env = "CORS_ALLOW_CREDENTIALS",
        default_value = "true",
        value_parser = parse_bool,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub cors_allow_credentials: bool,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(
        long,
        env = "ENABLE_TLS",
        default_value = "false",
        value_parser = parse_bool,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub enable_tls: bool,
}

impl Args {
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_local_extension() {
        let args = Args::try_parse_from(["chatbot-backend"]).unwrap();
        assert_eq!(args.server_addr, "127.0.0.1:8000");
        assert_eq!(args.default_user_id, "default_user");
        assert_eq!(args.history_max_turns, 0);
        assert!(!args.history_commit_on_success);
        assert!(!args.gemini_send_turn_roles);
        assert!(args.cors_allow_credentials);
        assert_eq!(args.cors_origin_list(), vec!["*"]);
    }

    #[test]
    fn flags_accept_bare_and_valued_forms() {
        let args = Args::try_parse_from([
            "chatbot-backend",
            "--gemini-send-turn-roles",
            "--history-commit-on-success",
            "yes",
            "--cors-allow-credentials",
            "false",
        ]).unwrap();
        assert!(args.gemini_send_turn_roles);
        assert!(args.history_commit_on_success);
        assert!(!args.cors_allow_credentials);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let args = Args::try_parse_from([
            "chatbot-backend",
            "--cors-origins",
            "chrome-extension://abc, http://localhost:3000,,",
        ]).unwrap();
        assert_eq!(args.cors_origin_list(), vec!["chrome-extension://abc", "http://localhost:3000"]);
    }

    #[test]
    fn parse_bool_rejects_garbage() {
        assert!(parse_bool("maybe").is_err());
        assert_eq!(parse_bool(" ON "), Ok(true));
    }
}
