//! Single-shot HTTP/1.1 responder for responses wiremock cannot produce:
//! bodies without `Content-Length`, bodies that stall, bodies cut short.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the server does after writing the body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterBody {
    /// Close the connection (ends a close-delimited body).
    Close,
    /// Keep the connection open without sending anything else.
    Stall,
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
    pub after_body: AfterBody,
}

impl RawResponse {
    /// 200 response delimited by connection close, with no `Content-Length`.
    pub fn close_delimited(body: Vec<u8>) -> Self {
        Self {
            content_length: None,
            body,
            after_body: AfterBody::Close,
        }
    }

    fn head(&self) -> String {
        let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n");
        match self.content_length {
            Some(length) => head.push_str(&format!("Content-Length: {length}\r\n")),
            None => head.push_str("Connection: close\r\n"),
        }
        head.push_str("\r\n");
        head
    }
}

/// Serves `response` to the first connection and returns the base URL.
pub async fn serve_once(response: RawResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind raw server");
    let address = listener.local_addr().expect("raw server address");

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        if socket.write_all(response.head().as_bytes()).await.is_err() {
            return;
        }
        for piece in response.body.chunks(16 * 1024) {
            if socket.write_all(piece).await.is_err() {
                return;
            }
        }
        let _ = socket.flush().await;

        match response.after_body {
            AfterBody::Close => {
                let _ = socket.shutdown().await;
            }
            AfterBody::Stall => {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }
    });

    format!("http://{address}")
}
