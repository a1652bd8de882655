pub mod api;
pub mod error;

use crate::cli::Args;
use api::{ build_cors_layer, build_router, AppState };
use axum_server::tls_rustls::RustlsConfig;
use log::{ error, info, warn };
use std::error::Error;
use std::net::SocketAddr;

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

/// Certificate and key paths when TLS is enabled, `None` when it is off.
fn tls_paths(args: &Args) -> Result<Option<(&str, &str)>, Box<dyn Error + Send + Sync>> {
    if !args.enable_tls {
        return Ok(None);
    }
    match (&args.tls_cert_path, &args.tls_key_path) {
        (Some(cert), Some(key)) => Ok(Some((cert.as_str(), key.as_str()))),
        (Some(_), None) | (None, Some(_)) => {
            error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
            Err("Missing TLS certificate or key path".into())
        }
        (None, None) => {
            error!("--enable-tls was set but no certificate/key paths provided.");
            Err("TLS enabled without cert/key".into())
        }
    }
}

async fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<RustlsConfig, Box<dyn Error + Send + Sync>> {
    // axum-server's rustls needs a process-wide provider; a second install is a no-op error.
    let _ = rustls::crypto::ring::default_provider().install_default();
    info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
    let config = RustlsConfig::from_pem_file(cert_path, key_path).await.map_err(|e|
        format!("Failed to load TLS certificate/key: {}", e)
    )?;
    Ok(config)
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>().map_err(|e|
            format!("Invalid server address '{}': {}", self.addr, e)
        )?;
        let tls = tls_paths(&self.args)?;

        let origins = self.args.cors_origin_list();
        if origins.iter().any(|o| o == "*") {
            warn!("CORS allows every origin. Set CORS_ORIGINS to restrict it.");
        }
        let cors = build_cors_layer(&origins, self.args.cors_allow_credentials);
        let app = build_router(self.state.clone(), cors);

        if let Some((cert_path, key_path)) = tls {
            let tls_config = load_tls_config(cert_path, key_path).await?;
            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener
                ::bind(addr).await
                .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;
            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use api::ChatSettings;
    use clap::Parser;
    use std::sync::Arc;
    use std::time::Duration;

    const CERT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tls/localhost.crt");
    const KEY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tls/localhost.key");

    fn server(addr: &str, flags: &[&str]) -> Server {
        let args = Args::parse_from(std::iter::once("chatbot-backend").chain(flags.iter().copied()));
        let state = AppState::new(
            Arc::new(MemoryHistoryStore::unbounded()),
            None,
            ChatSettings::default()
        );
        Server::new(addr.to_string(), state, args)
    }

    fn free_addr() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    }

    #[test]
    fn tls_paths_off_unless_enabled() {
        let args = Args::parse_from(["chatbot-backend", "--tls-cert-path", CERT]);
        assert!(tls_paths(&args).unwrap().is_none());

        let args = Args::parse_from([
            "chatbot-backend",
            "--enable-tls",
            "--tls-cert-path",
            CERT,
            "--tls-key-path",
            KEY,
        ]);
        assert_eq!(tls_paths(&args).unwrap(), Some((CERT, KEY)));
    }

    #[tokio::test]
    async fn tls_without_key_path_fails_before_binding() {
        let err = server(&free_addr(), &["--enable-tls", "--tls-cert-path", CERT])
            .run().await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing TLS certificate or key path");
    }

    #[tokio::test]
    async fn tls_without_any_path_fails() {
        let err = server(&free_addr(), &["--enable-tls"]).run().await.unwrap_err();
        assert_eq!(err.to_string(), "TLS enabled without cert/key");
    }

    #[tokio::test]
    async fn tls_with_unreadable_files_fails() {
        let err = server(
            &free_addr(),
            &["--enable-tls", "--tls-cert-path", "/nonexistent/cert.pem", "--tls-key-path", "/nonexistent/key.pem"]
        )
            .run().await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to load TLS certificate/key"), "{}", err);
    }

    #[tokio::test]
    async fn invalid_address_fails() {
        let err = server("not-an-addr", &[]).run().await.unwrap_err();
        assert!(err.to_string().contains("Invalid server address"));
    }

    #[tokio::test]
    async fn tls_serves_health_over_https() {
        let addr = free_addr();
        let srv = server(&addr, &["--enable-tls", "--tls-cert-path", CERT, "--tls-key-path", KEY]);
        let handle = tokio::spawn(async move { srv.run().await.map_err(|e| e.to_string()) });

        let client = reqwest::Client::builder().danger_accept_invalid_certs(true).build().unwrap();
        let url = format!("https://{}/health", addr);
        let mut last_err = None;
        for _ in 0..50 {
            match client.get(&url).send().await {
                Ok(resp) => {
                    assert_eq!(resp.status(), reqwest::StatusCode::OK);
                    let body: serde_json::Value = resp.json().await.unwrap();
                    assert_eq!(body["status"], "healthy");
                    assert_eq!(body["gemini_configured"], false);
                    handle.abort();
                    return;
                }
                Err(e) => {
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
        handle.abort();
        panic!("https server never answered: {:?}", last_err);
    }
}
