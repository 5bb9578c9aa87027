//! Test helpers: a minimal local HTTP server and gzip payload construction
//!
//! Tests exercise the full network path against a loopback server instead of
//! the real dataset host, so the test suite runs without network access.

use async_compression::tokio::bufread::GzipEncoder;
use std::{collections::HashMap, net::SocketAddr, path::Path};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

/// A loopback HTTP server serving a fixed set of routes
pub struct TestServer {
    /// Address the server is listening on
    pub addr: SocketAddr,
}

/// Spawn a loopback server mapping paths to raw HTTP responses
///
/// Unknown paths get a 404. The server lives until the end of the test
/// process; each test spawns its own on an ephemeral port.
pub async fn serve(routes: Vec<(&str, Vec<u8>)>) -> TestServer {
    serve_with(|_addr| {
        routes
            .into_iter()
            .map(|(path, response)| (path.to_owned(), response))
            .collect()
    })
    .await
}

/// Like [`serve`], but routes may embed the server's own address
///
/// Index pages served by tests reference data files by absolute URL, which
/// is only known once the listener is bound.
pub async fn serve_with(
    build_routes: impl FnOnce(SocketAddr) -> Vec<(String, Vec<u8>)>,
) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback listener should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    let routes = build_routes(addr).into_iter().collect::<HashMap<_, _>>();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _peer)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut stream = BufReader::new(stream);
                let mut request_line = String::new();
                if stream.read_line(&mut request_line).await.is_err() {
                    return;
                }
                // Drain the headers so the client sees a well-behaved peer
                loop {
                    let mut header = String::new();
                    match stream.read_line(&mut header).await {
                        Ok(_) if header.trim().is_empty() => break,
                        Ok(0) | Err(_) => return,
                        Ok(_) => continue,
                    }
                }
                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let response = routes
                    .get(path)
                    .cloned()
                    .unwrap_or_else(|| b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_vec());
                let _ = stream.get_mut().write_all(&response).await;
                let _ = stream.get_mut().shutdown().await;
            });
        }
    });
    TestServer { addr }
}

/// Spawn a loopback server that sends `head` and then goes silent
///
/// The connection is held open without further data, stalling the client
/// either before response headers arrive (empty `head`) or partway through
/// the body, so tests can cancel a transfer that is genuinely in flight.
pub async fn serve_stalled(head: Vec<u8>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback listener should bind");
    let addr = listener.local_addr().expect("bound listener has an address");
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _peer)) = listener.accept().await else {
                break;
            };
            let head = head.clone();
            tokio::spawn(async move {
                let _ = stream.write_all(&head).await;
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            });
        }
    });
    TestServer { addr }
}

/// Build the beginning of a 200 response that announces more payload bytes
/// than it carries
pub fn http_ok_head(announced_len: usize, partial_body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\ncontent-length: {announced_len}\r\nconnection: close\r\n\r\n"
    )
    .into_bytes();
    response.extend_from_slice(partial_body);
    response
}

/// Build a complete 200 response around a payload
///
/// The announced content length matches the payload actually sent, so a
/// deliberately truncated payload looks like a clean, complete transfer to
/// the HTTP layer.
pub fn http_ok(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Gzip-compress a payload
pub async fn gzip(payload: &[u8]) -> Vec<u8> {
    let mut encoder = GzipEncoder::new(payload);
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .await
        .expect("in-memory gzip compression should not fail");
    compressed
}

/// Sorted file names in a directory, temp files included
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut entries = std::fs::read_dir(dir)
        .expect("test directory should be readable")
        .map(|entry| {
            entry
                .expect("test directory entries should be readable")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect::<Vec<_>>();
    entries.sort();
    entries
}
