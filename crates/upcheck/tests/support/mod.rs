//! Local canned-response HTTP server for probe tests.
//!
//! Keeps integration tests off the external network: each test spawns a
//! listener on a loopback port and tells it how to answer.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the server answers each request
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Respond with the given status code
    Status(u16),

    /// Accept the connection and never respond
    Hang,

    /// Reject HEAD with 405, answer GET with 200
    HeadNotAllowed,
}

/// Spawn a listener answering every connection per `behavior`; returns the
/// bound address. The accept loop dies with the test runtime.
pub async fn spawn_server(behavior: Behavior) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        loop {
            let Ok((stream, _peer)) = listener.accept().await else {
                break;
            };
            tokio::spawn(handle_connection(stream, behavior));
        }
    });

    addr
}

async fn handle_connection(mut stream: TcpStream, behavior: Behavior) {
    let request = read_request_head(&mut stream).await;

    match behavior {
        Behavior::Status(code) => {
            let _ = stream.write_all(response_bytes(code).as_bytes()).await;
        }
        Behavior::Hang => {
            // Hold the connection open without answering; the probe's own
            // timeout is what ends this.
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Behavior::HeadNotAllowed => {
            let code = if request.starts_with("HEAD") { 405 } else { 200 };
            let _ = stream.write_all(response_bytes(code).as_bytes()).await;
        }
    }
}

/// Read until the end of the request head (or EOF)
async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}

fn response_bytes(code: u16) -> String {
    let reason = match code {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Response",
    };
    format!("HTTP/1.1 {code} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
}
