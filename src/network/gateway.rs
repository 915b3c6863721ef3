//! Gateway: TCP/TLS listener performing authenticated WebSocket upgrades.
//!
//! The upgrade callback extracts `Authorization: Bearer <token>` and resolves
//! it to a subject; a missing or unresolvable identity rejects the handshake
//! with 401 before any session exists. Each accepted socket gets its own
//! connection task.

use crate::config::TlsConfig;
use crate::network::{Resolver, connection};
use crate::state::Hub;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_tungstenite::accept_hdr_async;
use tracing::{error, info, instrument, warn};

pub struct Gateway {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    hub: Arc<Hub>,
    resolver: Resolver,
}

impl Gateway {
    /// Bind the listener, loading the TLS acceptor when configured.
    pub async fn bind(
        addr: SocketAddr,
        tls_config: Option<&TlsConfig>,
        hub: Arc<Hub>,
        resolver: Resolver,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let tls = match tls_config {
            Some(cfg) => {
                let acceptor = Self::load_tls(cfg)?;
                info!(%addr, "TLS listener bound");
                Some(acceptor)
            }
            None => {
                info!(%addr, "Plaintext listener bound");
                None
            }
        };
        Ok(Self {
            listener,
            tls,
            hub,
            resolver,
        })
    }

    /// The bound address, for callers that bound port 0.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Load certificates and private key into a TlsAcceptor.
    fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
        let cert_file = std::fs::read(&config.cert_path)?;
        let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
        let certs: Vec<CertificateDer> = certs(cert_reader).collect::<Result<Vec<_>, _>>()?;
        if certs.is_empty() {
            anyhow::bail!("No certificates found in {}", config.cert_path);
        }

        let key_file = std::fs::read(&config.key_path)?;
        let key_reader = &mut BufReader::new(Cursor::new(key_file));
        let mut keys: Vec<PrivateKeyDer> = pkcs8_private_keys(key_reader)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(PrivateKeyDer::from)
            .collect();
        if keys.is_empty() {
            anyhow::bail!("No private keys found in {}", config.key_path);
        }
        let key = keys.remove(0);

        let tls_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)?;
        Ok(TlsAcceptor::from(Arc::new(tls_config)))
    }

    /// Accept connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    continue;
                }
            };

            let hub = Arc::clone(&self.hub);
            let resolver = Arc::clone(&self.resolver);
            match self.tls.clone() {
                Some(acceptor) => {
                    tokio::spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(tls_stream) => {
                                upgrade_and_serve(tls_stream, addr, hub, resolver).await;
                            }
                            Err(e) => warn!(%addr, error = %e, "TLS handshake failed"),
                        }
                    });
                }
                None => {
                    tokio::spawn(upgrade_and_serve(stream, addr, hub, resolver));
                }
            }
        }
    }
}

/// Perform the authenticated WebSocket upgrade, then hand the socket to the
/// connection loop.
async fn upgrade_and_serve<S>(stream: S, addr: SocketAddr, hub: Arc<Hub>, resolver: Resolver)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut subject = None;
    let auth_callback = |req: &http::Request<()>, response: http::Response<()>| {
        let token = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match token.and_then(|t| resolver.resolve(t)) {
            Some(resolved) => {
                subject = Some(resolved);
                Ok(response)
            }
            None => Err(http::Response::builder()
                .status(http::StatusCode::UNAUTHORIZED)
                .body(Some("A bearer identity is required".to_string()))
                .expect("static response")),
        }
    };

    match accept_hdr_async(stream, auth_callback).await {
        Ok(ws) => {
            let Some(subject) = subject else {
                // The callback admits the upgrade only after setting this.
                error!(%addr, "Upgrade accepted without a resolved subject");
                return;
            };
            info!(%addr, "WebSocket session established");
            if let Err(e) = connection::serve(ws, subject, addr, hub).await {
                warn!(%addr, error = %e, "Connection ended with error");
            }
        }
        Err(e) => warn!(%addr, error = %e, "WebSocket handshake rejected"),
    }
}
