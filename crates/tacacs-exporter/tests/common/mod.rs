//! In-process TACACS+ server used by the integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tacacs_exporter::{ConnectMode, Module};
use tacacs_proto::{AuthenReply, AuthenStart, AuthenStatus, Body, Header, Packet};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Minimal authentication server answering every START with a fixed status
///
/// Connections whose START cannot be decoded with the server's secret are
/// dropped without a reply.
pub struct TestServer {
    addr: SocketAddr,
    starts: Arc<Mutex<Vec<AuthenStart>>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(secret: &[u8], status: AuthenStatus) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local address");
        let starts = Arc::new(Mutex::new(Vec::new()));

        let secret = secret.to_vec();
        let recorded = Arc::clone(&starts);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let secret = secret.clone();
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve(stream, &secret, status, &recorded).await;
                });
            }
        });

        TestServer {
            addr,
            starts,
            handle,
        }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// START bodies received so far
    pub fn starts(&self) -> Vec<AuthenStart> {
        self.starts.lock().expect("starts lock poisoned").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    secret: &[u8],
    status: AuthenStatus,
    starts: &Mutex<Vec<AuthenStart>>,
) -> Option<()> {
    let mut header_buf = [0u8; Header::SIZE];
    stream.read_exact(&mut header_buf).await.ok()?;
    let header = Header::decode(&header_buf).ok()?;

    let mut body = vec![0u8; header.length as usize];
    stream.read_exact(&mut body).await.ok()?;

    let request = Packet::from_parts(header, body, secret).ok()?;
    let Body::AuthenStart(start) = request.body else {
        return None;
    };
    starts.lock().ok()?.push(start);

    let reply = Packet::new(
        request.header.version,
        request.header.seq_no + 1,
        0,
        request.header.session_id,
        Body::AuthenReply(AuthenReply::new(status).with_server_msg("test server")),
    )
    .ok()?;
    stream.write_all(&reply.encode(secret).ok()?).await.ok()?;
    stream.flush().await.ok()
}

/// Module with the given secret and timeout
pub fn module(secret: &str, timeout: Duration) -> Module {
    Module {
        username: "test".to_string(),
        password: "password".to_string(),
        secret: secret.as_bytes().to_vec(),
        connect_mode: ConnectMode::Single,
        privilege_level: 0,
        port: "probe".to_string(),
        timeout,
    }
}

/// Address of a port nothing is listening on
pub async fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local address");
    drop(listener);
    addr.to_string()
}
