//! Minimal HTTP/1.1 server with Range GET support for integration tests.
//!
//! Serves a single static body. A GET without `Range` answers 200 with the
//! full body and `Content-Length`; a GET with `Range: bytes=a-b` answers 206
//! with the inclusive slice. Every connection is closed after one response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// Status returned to GETs without a `Range` header.
    pub size_status: u16,
    /// If false, the size response carries no `Content-Length`.
    pub send_content_length: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Bytes dropped from the end of every 206 body.
    pub truncate_by: usize,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            size_status: 200,
            send_content_length: true,
            support_ranges: true,
            truncate_by: 0,
        }
    }
}

/// A running server: its URL and the `Range` header of every request seen,
/// `"<none>"` for requests without one.
pub struct RangeServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RangeServer {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread serving `body`. The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (failing size request,
/// ranges ignored, short bodies).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{port}/archive.zip"),
        requests,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, log: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, range) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    }

    log.lock().unwrap().push(match range {
        Some((start, end)) => format!("bytes={start}-{end}"),
        None => "<none>".to_string(),
    });

    let total = body.len() as u64;
    match range {
        Some((start, end_incl)) if opts.support_ranges => {
            let end_excl = (end_incl.saturating_add(1)).min(total) as usize;
            let start = (start.min(total) as usize).min(end_excl);
            let slice = &body[start..end_excl];
            let slice = &slice[..slice.len().saturating_sub(opts.truncate_by)];
            let head = format!(
                "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nConnection: close\r\n\r\n",
                slice.len(),
                start,
                end_excl.saturating_sub(1),
                total
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(slice);
        }
        Some(_) => write_full(&mut stream, 200, body, true),
        None => write_full(&mut stream, opts.size_status, body, opts.send_content_length),
    }
}

fn write_full(stream: &mut TcpStream, status: u16, body: &[u8], content_length: bool) {
    let mut head = format!(
        "HTTP/1.1 {status} {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n",
        reason(status)
    );
    if content_length {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    if status == 200 {
        let _ = stream.write_all(body);
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                if let Some(part) = value.trim().strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
