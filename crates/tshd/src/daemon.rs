//! Daemon lifecycle: secret validation, key derivation, metrics, auth router

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use tsh_core::{TokenSecret, TshConfig};
use tsh_crypto::{KdfParams, TokenCipher};
use tsh_session::{auth_routes, AuthConfig, HttpIdentityProvider, SessionMetrics, SessionSettings};

pub async fn run(config: TshConfig) -> Result<()> {
    // ── Token secret and key ─────────────────────────────────────────────
    let secret = TokenSecret::from_env(&config.session.secret_env)
        .with_context(|| format!("loading token secret from ${}", config.session.secret_env))?;

    let params = KdfParams::from(&config.session);
    let cipher = tokio::task::spawn_blocking(move || TokenCipher::with_params(&secret, &params))
        .await
        .context("key derivation task")??;
    info!(
        mem_cost_kib = config.session.argon2_mem_cost_kib,
        time_cost = config.session.argon2_time_cost,
        "token key derived"
    );

    // ── Identity provider ────────────────────────────────────────────────
    let provider = HttpIdentityProvider::from_config(&config.identity)
        .context("building identity provider client")?;
    info!(base_url = %provider.base_url(), "identity provider configured");

    // ── Metrics ──────────────────────────────────────────────────────────
    let session_metrics = SessionMetrics::default();
    if let Some(addr) = config.server.metrics_addr.clone() {
        let mut registry = crate::metrics::Registry::default();
        session_metrics.register(&mut registry);
        let registry = Arc::new(registry);
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, registry).await {
                error!("metrics server failed: {e}");
            }
        });
    }

    // ── Auth router ──────────────────────────────────────────────────────
    let settings = SessionSettings::from(&config.session);
    if !settings.secure_cookies {
        tracing::warn!("secure_cookies disabled: auth cookies will be sent over plain HTTP");
    }
    let app = auth_routes(AuthConfig::new(cipher, settings), provider, session_metrics);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("auth bind {}", config.server.listen))?;
    info!(addr = %config.server.listen, "auth: listening on /api/auth");

    notify_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("auth server")?;

    info!("tshd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("installing ctrl-c handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn notify_ready() {
    // sd_notify(READY=1) via $NOTIFY_SOCKET; no-op outside systemd
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        use std::os::unix::net::UnixDatagram;
        if let Ok(sock) = UnixDatagram::unbound() {
            let _ = sock.send_to(b"READY=1\n", &socket);
            tracing::debug!(notify_socket = %socket, "sent systemd READY=1");
        }
    }
}
