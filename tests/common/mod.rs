//! Shared integration-test harness: in-process server plus WebSocket client.

#![allow(dead_code)]

use mentord::catalog::QuestionCatalog;
use mentord::model::User;
use mentord::network::{Gateway, TokenIsSubject};
use mentord::state::Hub;
use mentord::store::MemoryStore;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use futures_util::{SinkExt, StreamExt};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// An in-process server on an ephemeral port, backed by a memory store the
/// test can seed and inspect directly.
pub struct TestServer {
    pub hub: Arc<Hub>,
    pub store: Arc<MemoryStore>,
    pub addr: SocketAddr,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let hub = Hub::new(
            store.clone(),
            QuestionCatalog::default(),
            "test.local".into(),
        )
        .await?;
        let gateway = Gateway::bind(
            "127.0.0.1:0".parse()?,
            None,
            hub.clone(),
            Arc::new(TokenIsSubject),
        )
        .await?;
        let addr = gateway.local_addr()?;
        tokio::spawn(gateway.run());
        Ok(Self { hub, store, addr })
    }

    /// Seed a user whose subject is `auth0|{id}`.
    pub fn seed_user(&self, id: &str, mentor: bool, accepting: bool) -> User {
        let mut user = User::new(&format!("auth0|{id}"), "Test", None, "User", id);
        user.id = id.to_string();
        user.is_mentor = mentor;
        user.accepting_mentees = accepting;
        self.store.put_raw("users", id, user.to_doc());
        if user.is_accepting_mentor() {
            self.hub.mentors.apply(&user);
        }
        user
    }
}

/// A WebSocket test client speaking the frame protocol.
///
/// Pushes (state, banners, data events) can arrive before a command's ack;
/// frames read while waiting for an ack are queued so `expect_*` helpers see
/// them afterwards in arrival order.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_seq: u64,
    pending: VecDeque<Value>,
}

impl TestClient {
    /// Connect with `Authorization: Bearer <subject>`.
    pub async fn connect(addr: SocketAddr, subject: &str) -> anyhow::Result<Self> {
        let mut request = format!("ws://{addr}/").into_client_request()?;
        request.headers_mut().insert(
            http::header::AUTHORIZATION,
            format!("Bearer {subject}").parse()?,
        );
        let (ws, _) = connect_async(request).await?;
        Ok(Self {
            ws,
            next_seq: 1,
            pending: VecDeque::new(),
        })
    }

    /// Connect without an Authorization header; expected to be rejected.
    pub async fn connect_anonymous(addr: SocketAddr) -> anyhow::Result<()> {
        let request = format!("ws://{addr}/").into_client_request()?;
        let (_ws, _) = connect_async(request).await?;
        Ok(())
    }

    async fn next_socket_frame(&mut self) -> anyhow::Result<Value> {
        loop {
            let msg = timeout(RECV_TIMEOUT, self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            if let Message::Text(text) = msg {
                return Ok(serde_json::from_str(&text)?);
            }
        }
    }

    /// Send a ping and wait for the answering pong on an otherwise idle
    /// socket, queueing any frames that arrive in between.
    pub async fn ping_roundtrip(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        self.ws.send(Message::Ping(payload.to_vec())).await?;
        loop {
            let msg = timeout(RECV_TIMEOUT, self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            match msg {
                Message::Pong(body) => {
                    anyhow::ensure!(body == payload, "pong must echo the ping payload");
                    return Ok(());
                }
                Message::Text(text) => self.pending.push_back(serde_json::from_str(&text)?),
                _ => {}
            }
        }
    }

    /// Next server frame, queued frames first.
    pub async fn recv(&mut self) -> anyhow::Result<Value> {
        if let Some(frame) = self.pending.pop_front() {
            return Ok(frame);
        }
        self.next_socket_frame().await
    }

    /// Assert that the next frame is a `state` push with the given name.
    pub async fn expect_state(&mut self, expected: &str) -> anyhow::Result<()> {
        let frame = self.recv().await?;
        anyhow::ensure!(
            frame["type"] == "state" && frame["state"] == expected,
            "expected state {expected:?}, got {frame}"
        );
        Ok(())
    }

    /// Skip frames until a `data` push of the given payload type arrives.
    pub async fn expect_data(&mut self, payload_type: &str) -> anyhow::Result<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["type"] == "data" && frame["data"]["type"] == payload_type {
                return Ok(frame["data"].clone());
            }
        }
    }

    /// Skip frames until a `message` banner with the given title arrives.
    pub async fn expect_message(&mut self, title: &str) -> anyhow::Result<Value> {
        loop {
            let frame = self.recv().await?;
            if frame["type"] == "message" && frame["title"] == title {
                return Ok(frame);
            }
        }
    }

    /// Send a command frame without a `seq`.
    pub async fn fire_without_callback(&mut self, cmd: &str, payload: Value) -> anyhow::Result<()> {
        let frame = json!({ "cmd": cmd, "payload": payload });
        self.ws.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Send a command and wait for its ack, queueing everything that arrives
    /// before it. Returns the ack result.
    pub async fn call(&mut self, cmd: &str, payload: Value) -> anyhow::Result<Value> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let frame = json!({ "cmd": cmd, "seq": seq, "payload": payload });
        self.ws.send(Message::Text(frame.to_string())).await?;

        loop {
            let frame = self.next_socket_frame().await?;
            if frame["type"] == "ack" && frame["seq"] == seq {
                return Ok(frame["result"].clone());
            }
            self.pending.push_back(frame);
        }
    }

    /// Like [`TestClient::call`], asserting a truthy ack.
    pub async fn call_ok(&mut self, cmd: &str, payload: Value) -> anyhow::Result<Value> {
        let result = self.call(cmd, payload).await?;
        anyhow::ensure!(
            result != Value::Bool(false),
            "command {cmd} unexpectedly failed"
        );
        Ok(result)
    }
}
