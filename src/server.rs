//! Process entry point: banner, TLS bootstrap, port probe, and the listener.
//!
//! HTTPS is used whenever a certificate pair is available; otherwise the same
//! router is served over plain HTTP. Both listeners stop gracefully on Ctrl-C
//! or SIGTERM.

use std::future::Future;
use std::io;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::{Config, ServerConfig};
use crate::rest::{create_router, AppState};
use crate::tls::{self, CertificatePaths};

/// How long the startup probe waits for an existing listener to answer.
const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Server startup errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address '{addr}': {source}")]
    Address {
        addr: String,
        source: AddrParseError,
    },

    #[error("cannot bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("cannot load TLS certificate: {0}")]
    Tls(io::Error),

    #[error("server error: {0}")]
    Serve(io::Error),
}

/// Listener protocol picked at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Run the service until Ctrl-C or SIGTERM.
pub async fn run(config: Config) -> Result<(), ServerError> {
    run_until(config, shutdown_signal()).await
}

/// Run the service until `shutdown` completes.
pub async fn run_until<F>(config: Config, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = config.server.port;
    log_banner(port);

    let certificate = if config.tls.enabled {
        tls::ensure_certificate(&config.paths.cert_dir())
    } else {
        info!("TLS disabled in configuration.");
        None
    };
    let scheme = if certificate.is_some() {
        Scheme::Https
    } else {
        Scheme::Http
    };
    info!("Frontend: {}://127.0.0.1:{port}/", scheme.as_str());
    info!("");

    if port_in_use(port).await {
        warn!("Port {port} is already in use!");
        info!("Maybe another Powiernik instance is already running?");
    }

    let addr = bind_addr(&config.server)?;
    let state = Arc::new(AppState::from_config(&config));
    let app = create_router(state);

    info!("Starting server on {}://{addr}", scheme.as_str());
    info!("Press Ctrl+C to stop.");

    match certificate {
        Some(paths) => serve_https(app, addr, &paths, shutdown).await,
        None => serve_http(app, addr, shutdown).await,
    }
}

fn log_banner(port: u16) {
    info!("========================================");
    info!("  POWIERNIK - backend for Wizyta");
    info!("========================================");
    info!("Port: {port}");
}

/// Socket address from the configured host IP and port.
pub fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|source| ServerError::Address {
            addr: config.host.clone(),
            source,
        })?;
    Ok(SocketAddr::new(ip, config.port))
}

/// True when something already accepts connections on `127.0.0.1:port`.
pub async fn port_in_use(port: u16) -> bool {
    matches!(
        tokio::time::timeout(PORT_PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

async fn serve_http<F>(app: Router, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting HTTP server...");

    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()
    } else {
        tokio::net::TcpSocket::new_v6()
    }
    .map_err(|source| ServerError::Bind { addr, source })?;
    socket
        .set_reuseaddr(true)
        .map_err(|source| ServerError::Bind { addr, source })?;
    socket
        .bind(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;
    let listener = socket
        .listen(1024)
        .map_err(|source| ServerError::Bind { addr, source })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

#[cfg(feature = "tls")]
async fn serve_https<F>(
    app: Router,
    addr: SocketAddr,
    paths: &CertificatePaths,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    use axum_server::tls_rustls::RustlsConfig;

    // Fails only when a provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(ServerError::Tls)?;

    info!("Starting HTTPS server...");
    info!("NOTE: accept the certificate in the browser on the first connection!");

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

#[cfg(not(feature = "tls"))]
async fn serve_https<F>(
    app: Router,
    addr: SocketAddr,
    _paths: &CertificatePaths,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve_http(app, addr, shutdown).await
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Cannot install SIGTERM handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::select! {
            () = ctrl_c => info!("Stopped by user."),
            () = terminate => info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Stopped by user.");
    }
}
