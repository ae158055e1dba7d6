#![allow(dead_code)]

use std::collections::HashMap;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// A response as seen by a client.
#[derive(Debug)]
pub struct RawResponse {
    pub version: String,
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.ok()?;
    if n == 0 {
        return None;
    }
    Some(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Reads one response framed by its Content-Length. `None` on EOF.
pub async fn read_response<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<RawResponse> {
    let status_line = read_line(reader).await?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next()?.to_string();
    let status = parts.next()?.parse().ok()?;
    let reason = parts.next().unwrap_or("").to_string();

    let mut headers = HashMap::new();
    loop {
        let line = read_line(reader).await?;
        if line.is_empty() {
            break;
        }
        let (k, v) = line.split_once(": ")?;
        headers.insert(k.to_string(), v.to_string());
    }

    let len: usize = headers.get("Content-Length")?.parse().ok()?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.ok()?;

    Some(RawResponse {
        version,
        status,
        reason,
        headers,
        body,
    })
}
