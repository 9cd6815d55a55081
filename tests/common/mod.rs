//! Minimal HTTP stand-in for the Slack Web API.
//!
//! Serves one canned `(status, body)` per connection, in order, and records
//! every request it receives.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// e.g. `GET /api/conversations.history?channel=C1 HTTP/1.1`
    pub request_line: String,
    /// Header lines, lowercased.
    pub headers: Vec<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn has_header(&self, line: &str) -> bool {
        self.headers.iter().any(|h| h == &line.to_lowercase())
    }
}

pub struct StubSlack {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubSlack {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                serve_one(stream, status, &body, &recorded).await;
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_one(
    mut stream: TcpStream,
    status: u16,
    body: &str,
    recorded: &Mutex<Vec<RecordedRequest>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<String> = lines.map(str::to_lowercase).collect();
    let content_length = headers
        .iter()
        .find_map(|h| h.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut request_body = buf[head_end + 4..].to_vec();
    while request_body.len() < content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request_body.extend_from_slice(&chunk[..n]),
        }
    }

    recorded.lock().unwrap().push(RecordedRequest {
        request_line,
        headers,
        body: String::from_utf8_lossy(&request_body).to_string(),
    });

    let response = format!(
        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
