//! Local HTTP server for client tests
//!
//! Answers requests one connection at a time with canned JSON responses
//! and hands back the raw requests once every response has been served.

use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Serve `responses` in order, one per connection. Returns the base URL
/// and a handle resolving to the raw requests.
pub async fn serve(responses: Vec<(u16, serde_json::Value)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);

            let status = StatusCode::from_u16(status).unwrap();
            let body = body.to_string();
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        }
        requests
    });
    (format!("http://{addr}"), handle)
}

/// Serve a single 200 response
pub async fn serve_once(body: serde_json::Value) -> (String, JoinHandle<String>) {
    let (base, handle) = serve(vec![(200, body)]).await;
    let request = tokio::spawn(async move { handle.await.unwrap().remove(0) });
    (base, request)
}

/// Read headers plus a `Content-Length` body
async fn read_request(socket: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        request.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&request).to_string();
        if let Some(split) = text.find("\r\n\r\n") {
            let length = text
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if request.len() >= split + 4 + length {
                break;
            }
        }
        if n == 0 {
            break;
        }
    }
    String::from_utf8_lossy(&request).to_string()
}

/// `GET /path?query HTTP/1.1`
pub fn request_line(raw: &str) -> &str {
    raw.lines().next().unwrap_or_default()
}

/// Header value by case-insensitive name
pub fn header<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let (head, _) = raw.split_once("\r\n\r\n")?;
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then_some(value.trim())
    })
}

pub fn request_body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

pub fn request_json(raw: &str) -> serde_json::Value {
    serde_json::from_str(request_body(raw)).unwrap()
}
