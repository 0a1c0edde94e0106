use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use localserve::http::mime::MIME_TYPES;
use localserve::{LocalServer, ServerConfig, ServerError, ServerState};

struct RawResponse {
    status: u16,
    reason: String,
    headers: HashMap<String, String>,
    header_order: Vec<String>,
    body: Vec<u8>,
}

fn send(port: u16, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.write_all(raw).unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    out
}

fn parse(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header block");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let mut parts = status_line.splitn(3, ' ');
    assert_eq!(parts.next(), Some("HTTP/1.1"));
    let status = parts.next().unwrap().parse().unwrap();
    let reason = parts.next().unwrap().to_string();

    let mut headers = HashMap::new();
    let mut header_order = Vec::new();
    for line in lines {
        let (k, v) = line.split_once(": ").unwrap();
        header_order.push(k.to_string());
        headers.insert(k.to_string(), v.to_string());
    }

    RawResponse {
        status,
        reason,
        headers,
        header_order,
        body: raw[split + 4..].to_vec(),
    }
}

fn get(port: u16, path: &str) -> RawResponse {
    let req = format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n");
    parse(&send(port, req.as_bytes()))
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "hello world").unwrap();
    fs::write(dir.path().join("app.js"), "console.log('matrix');").unwrap();
    dir
}

fn started() -> (tempfile::TempDir, LocalServer, u16) {
    let dir = fixture();
    let server = LocalServer::new(dir.path()).unwrap();
    let port = server.start().unwrap();
    (dir, server, port)
}

#[test]
fn test_end_to_end_scenario() {
    let (_dir, server, port) = started();
    assert!(port > 0);
    assert!(server.is_running());

    let resp = get(port, "/index.html");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.reason, "OK");
    assert_eq!(resp.headers["Content-Type"], "text/html; charset=utf-8");
    assert_eq!(resp.headers["Content-Length"], "11");
    assert_eq!(resp.body, b"hello world");

    let missing = get(port, "/missing.png");
    assert_eq!(missing.status, 404);

    let root = get(port, "/");
    let with_query = get(port, "/?foo=bar");
    assert_eq!(root.status, with_query.status);
    assert_eq!(root.body, with_query.body);

    server.stop();
}

#[test]
fn test_root_matches_index() {
    let (_dir, _server, port) = started();

    let root = get(port, "/");
    let index = get(port, "/index.html");
    assert_eq!(root.status, index.status);
    assert_eq!(root.body, index.body);
}

#[test]
fn test_fixed_header_order() {
    let (_dir, _server, port) = started();
    let resp = get(port, "/app.js");

    assert_eq!(
        resp.header_order,
        vec![
            "Content-Type",
            "Content-Length",
            "Connection",
            "Access-Control-Allow-Origin",
            "Cache-Control",
        ]
    );
    assert_eq!(resp.headers["Content-Type"], "application/javascript; charset=utf-8");
    assert_eq!(resp.headers["Connection"], "close");
    assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(resp.headers["Cache-Control"], "no-cache");
}

#[test]
fn test_every_table_extension_served_with_its_type() {
    let dir = fixture();
    for (ext, _) in MIME_TYPES {
        fs::write(dir.path().join(format!("x.{ext}")), ext.as_bytes()).unwrap();
    }
    fs::write(dir.path().join("x.unknownext"), b"?").unwrap();

    let server = LocalServer::new(dir.path()).unwrap();
    let port = server.start().unwrap();

    for (ext, content_type) in MIME_TYPES {
        let resp = get(port, &format!("/x.{ext}"));
        assert_eq!(resp.status, 200, "{ext}");
        assert_eq!(resp.headers["Content-Type"], *content_type, "{ext}");
        assert_eq!(resp.body, ext.as_bytes());
    }

    let unknown = get(port, "/x.unknownext");
    assert_eq!(unknown.headers["Content-Type"], "application/octet-stream");
}

#[test]
fn test_not_found_body_mentions_404() {
    let (_dir, _server, port) = started();
    let resp = get(port, "/nope/nothing.css");

    assert_eq!(resp.status, 404);
    assert_eq!(resp.reason, "Not Found");
    assert!(String::from_utf8_lossy(&resp.body).contains("404"));
    assert_eq!(resp.headers["Content-Type"], "text/html; charset=utf-8");
}

#[test]
fn test_non_get_methods_are_rejected() {
    let (_dir, _server, port) = started();

    for method in ["POST", "HEAD", "PUT", "DELETE", "OPTIONS", "BREW"] {
        for path in ["/index.html", "/missing"] {
            let raw = send(port, format!("{method} {path} HTTP/1.1\r\n\r\n").as_bytes());
            let resp = parse(&raw);
            assert_eq!(resp.status, 405, "{method} {path}");
            assert_eq!(resp.reason, "Method Not Allowed");
        }
    }
}

#[test]
fn test_malformed_request_line() {
    let (_dir, _server, port) = started();
    let resp = parse(&send(port, b"GET\r\n\r\n"));

    assert_eq!(resp.status, 400);
    assert_eq!(resp.body, b"<html><body><h1>400 Bad Request</h1></body></html>");
}

#[test]
fn test_content_length_matches_body() {
    let (_dir, _server, port) = started();

    for path in ["/", "/app.js", "/missing"] {
        let resp = get(port, path);
        let declared: usize = resp.headers["Content-Length"].parse().unwrap();
        assert_eq!(declared, resp.body.len(), "{path}");
    }
}

#[test]
fn test_traversal_does_not_escape_root() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let inner = outer.path().join("www");
    fs::create_dir(&inner).unwrap();
    fs::write(inner.join("index.html"), "hello world").unwrap();

    let server = LocalServer::new(&inner).unwrap();
    let port = server.start().unwrap();

    for path in [
        "/../secret.txt",
        "/%2e%2e/secret.txt",
        "/....//secret.txt",
        "/..%2Fsecret.txt",
    ] {
        let resp = get(port, path);
        assert_ne!(resp.body, b"top secret", "{path}");
        assert_eq!(resp.status, 404, "{path}");
    }
}

#[test]
fn test_client_closing_without_request_gets_nothing() {
    let (_dir, server, port) = started();

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).unwrap();
    assert!(out.is_empty());

    // the server keeps serving
    assert_eq!(get(port, "/").status, 200);
    assert!(server.is_running());
}

#[test]
fn test_start_twice_returns_same_port() {
    let (_dir, server, port) = started();
    assert_eq!(server.start().unwrap(), port);
    assert_eq!(server.port(), port);
    assert_eq!(server.state(), ServerState::Ready(port));
}

#[test]
fn test_stop_then_start_again() {
    let (_dir, server, first) = started();

    server.stop();
    assert!(!server.is_running());
    assert_eq!(server.port(), 0);
    assert_eq!(server.state(), ServerState::Stopped);
    assert_eq!(server.active_connections(), 0);
    assert!(server.url_for("/index.html", "").is_none());

    let second = server.start().unwrap();
    assert!(second > 0);
    assert!(first > 0);
    assert_eq!(server.state(), ServerState::Ready(second));
    assert_eq!(get(second, "/index.html").body, b"hello world");
}

#[test]
fn test_stop_is_idempotent() {
    let dir = fixture();
    let server = LocalServer::new(dir.path()).unwrap();

    server.stop();
    assert_eq!(server.state(), ServerState::NotStarted);

    server.start().unwrap();
    server.stop();
    server.stop();
    assert_eq!(server.port(), 0);
}

/// Opens a connection that never sends a request and waits until the
/// server has registered it.
fn idle_connection(server: &LocalServer, port: u16) -> TcpStream {
    let idle = TcpStream::connect(("127.0.0.1", port)).unwrap();

    let mut waited = 0;
    while server.active_connections() == 0 && waited < 100 {
        thread::sleep(Duration::from_millis(10));
        waited += 1;
    }
    assert_eq!(server.active_connections(), 1);
    idle
}

/// The server must close `stream` (EOF, no bytes) well before its own 10 s
/// read timeout would.
fn assert_closed_by_server(mut stream: TcpStream) {
    stream.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    let started = Instant::now();

    let mut out = Vec::new();
    let result = stream.read_to_end(&mut out);

    assert!(matches!(result, Ok(0)), "expected EOF, got {result:?}");
    assert!(out.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_stop_cancels_idle_connections() {
    let (_dir, server, port) = started();
    let idle = idle_connection(&server, port);

    server.stop();

    assert_closed_by_server(idle);
}

#[test]
fn test_concurrent_clients() {
    let (_dir, server, port) = started();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            thread::spawn(move || {
                let path = if i % 2 == 0 { "/index.html" } else { "/missing" };
                get(port, path).status
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let status = h.join().unwrap();
        assert_eq!(status, if i % 2 == 0 { 200 } else { 404 });
    }

    let mut waited = 0;
    while server.active_connections() > 0 && waited < 100 {
        thread::sleep(Duration::from_millis(10));
        waited += 1;
    }
    assert_eq!(server.active_connections(), 0);
}

#[test]
fn test_url_for() {
    let dir = fixture();
    let server = LocalServer::new(dir.path()).unwrap();
    assert!(server.url_for("/index.html", "a=1").is_none());

    let port = server.start().unwrap();
    let url = server.url_for("/index.html", "screen=2&speed=1.5").unwrap();
    assert_eq!(
        url.as_str(),
        format!("http://127.0.0.1:{port}/index.html?screen=2&speed=1.5")
    );
}

#[test]
fn test_invalid_root_is_rejected() {
    let result = LocalServer::new("/no/such/dir/for/localserve");
    assert!(matches!(result, Err(ServerError::InvalidRoot { .. })));
}

#[test]
fn test_bind_failure_is_reported_and_retryable() {
    let dir = fixture();
    let config = ServerConfig {
        // TEST-NET-1, not assigned to any local interface
        bind_addr: "192.0.2.1".parse().unwrap(),
        ..ServerConfig::default()
    };
    let server = LocalServer::with_config(dir.path(), config).unwrap();

    let err = server.start().unwrap_err();
    assert!(matches!(err, ServerError::Bind(_)));
    assert!(matches!(server.state(), ServerState::Failed(_)));
    assert!(!server.is_running());
    assert_eq!(server.port(), 0);

    // a second attempt fails the same way rather than wedging the server
    assert!(matches!(server.start(), Err(ServerError::Bind(_))));
    server.stop();
}

#[test]
fn test_drop_stops_server() {
    let dir = fixture();
    let server = LocalServer::new(dir.path()).unwrap();
    let port = server.start().unwrap();
    let idle = idle_connection(&server, port);

    drop(server);

    assert_closed_by_server(idle);
}
