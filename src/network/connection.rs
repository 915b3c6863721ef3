//! Per-connection loops.
//!
//! Each connection runs two tasks: a writer draining the session's frame
//! channel into the socket, and the read loop dispatching client frames.
//! Handlers and broadcasts only ever touch the channel, so a slow socket
//! cannot stall command processing.

use crate::handlers::{DispatchOutcome, dispatch};
use crate::session::{Session, resolve_subject};
use crate::state::Hub;
use futures_util::{SinkExt, StreamExt};
use mentord_proto::{ServerFrame, parse_client_frame};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

/// Frames buffered per connection before broadcasts start dropping.
const OUTBOUND_BUFFER: usize = 64;

/// Drive one upgraded WebSocket until close or fatal error.
pub async fn serve<S>(
    ws: WebSocketStream<S>,
    subject: String,
    addr: SocketAddr,
    hub: Arc<Hub>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(OUTBOUND_BUFFER);
    // Control frames bypass the session channel; an idle session must still
    // answer pings.
    let (ctl_tx, mut ctl_rx) = mpsc::channel::<Message>(4);

    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else { break };
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(e) => {
                            error!(error = %e, "Unencodable server frame dropped");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                msg = ctl_rx.recv() => {
                    let Some(msg) = msg else { break };
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = sink.close().await;
    });

    let mut session = Session::new(&hub, subject, tx);
    let session_id = session.session_id;
    debug!(%addr, %session_id, "Connection task started");

    if resolve_subject(&hub, &mut session).await {
        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    debug!(%addr, %session_id, error = %e, "Read error; closing");
                    break;
                }
            };
            match msg {
                Message::Text(text) => match parse_client_frame(&text) {
                    Ok(frame) => {
                        if dispatch(&hub, &mut session, frame).await == DispatchOutcome::Disconnect
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        session
                            .push(ServerFrame::error(
                                "Invalid request",
                                format!("Unparseable frame: {e}"),
                            ))
                            .await;
                    }
                },
                Message::Close(_) => break,
                Message::Ping(payload) => {
                    let _ = ctl_tx.try_send(Message::Pong(payload));
                }
                Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
            }
        }
    }

    if let Some(user_id) = session.user_id.as_deref() {
        hub.registry.deregister(user_id, session_id);
    }
    info!(%addr, %session_id, "Connection closed");

    // Dropping the session drops the channel sender, ending the writer.
    drop(session);
    let _ = writer.await;
    Ok(())
}
