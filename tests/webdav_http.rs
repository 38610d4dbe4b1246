//! End-to-end WebDAV/HTTP framing scenarios over loopback sockets.

mod common;

use std::fs;
use std::io::Read;

use tempfile::TempDir;

use paperportald::core_dav::FsDavHandler;
use paperportald::core_host::{StdFs, StdNet};
use paperportald::core_http::HttpServer;

use common::{connect, read_http_response, send};

const PASV_MIN: u16 = 52200;
const PASV_MAX: u16 = 52299;

fn with_server(scenario: impl FnOnce(&mut HttpServer<'_>, u16, &TempDir)) {
    let root = tempfile::tempdir().expect("tempdir");
    let mut net = StdNet::new(PASV_MIN, PASV_MAX, None);
    let host_fs = StdFs;
    let mut handler = FsDavHandler::new();
    let root_str = root.path().to_str().expect("utf8 root").to_string();
    let mut server = HttpServer::new(&mut net, &host_fs, &root_str, &mut handler);
    server.start(0).expect("start");
    let port = server.local_port().expect("port");

    scenario(&mut server, port, &root);

    server.stop();
    server.stop();
}

#[test]
fn options_advertises_dav() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);
        send(&mut stream, b"OPTIONS / HTTP/1.1\r\nHost: x\r\n\r\n");
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("content-length").as_deref(), Some("0"));
        assert_eq!(resp.header("dav").as_deref(), Some("1"));
        assert!(resp.header("allow").unwrap().contains("PROPFIND"));
    });
}

#[test]
fn put_then_get_round_trip() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);

        send(
            &mut stream,
            b"PUT /f.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\n\r\nhello",
        );
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 201);
        assert_eq!(fs::read(root.path().join("f.txt")).expect("created"), b"hello");

        // Same keep-alive connection.
        send(&mut stream, b"GET /f.txt HTTP/1.1\r\nHost: x\r\n\r\n");
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("content-length").as_deref(), Some("5"));
        assert_eq!(resp.body, b"hello");

        // Re-PUT overwrites and answers 204.
        send(
            &mut stream,
            b"PUT /f.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nhi",
        );
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 204);
    });
}

#[test]
fn chunked_put_decodes_body() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);
        send(
            &mut stream,
            b"PUT /c.txt HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n",
        );
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 201);
        assert_eq!(fs::read(root.path().join("c.txt")).expect("created"), b"hello");
    });
}

#[test]
fn malformed_chunk_size_closes_with_400() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);
        send(
            &mut stream,
            b"PUT /c.txt HTTP/1.1\r\nHost: x\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\nhello\r\n",
        );
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.header("connection").as_deref(), Some("close"));

        // The server hangs up after the error response.
        let mut rest = Vec::new();
        for _ in 0..200 {
            tick();
            let mut buf = [0u8; 64];
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => rest.extend_from_slice(&buf[..n]),
                Err(_) => std::thread::sleep(std::time::Duration::from_millis(1)),
            }
        }
        assert!(rest.is_empty(), "unexpected bytes after error: {rest:?}");
    });
}

#[test]
fn get_missing_is_404_and_dir_is_403() {
    with_server(|server, port, root| {
        fs::create_dir(root.path().join("music")).expect("seed dir");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);

        send(&mut stream, b"GET /nope HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 404);

        send(&mut stream, b"GET /music HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 403);
    });
}

#[test]
fn head_sends_length_without_body() {
    with_server(|server, port, root| {
        fs::write(root.path().join("f.bin"), vec![7u8; 321]).expect("seed");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);
        send(&mut stream, b"HEAD /f.bin HTTP/1.1\r\nHost: x\r\n\r\n");
        let resp = {
            // HEAD responses carry Content-Length but no body; read just
            // the head.
            let mut head = String::new();
            loop {
                let line = common::read_line(&mut tick, &mut stream);
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            head
        };
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"), "{resp}");
        assert!(resp.contains("Content-Length: 321\r\n"), "{resp}");

        // The connection is still usable: the body was never sent.
        send(&mut stream, b"GET /nope HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 404);
    });
}

#[test]
fn mkcol_delete_lifecycle() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);

        send(&mut stream, b"MKCOL /box HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 201);
        assert!(root.path().join("box").is_dir());

        send(&mut stream, b"MKCOL /box HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 405);

        send(&mut stream, b"MKCOL /missing/parent HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 409);

        send(&mut stream, b"DELETE /box HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 204);
        assert!(!root.path().join("box").exists());
    });
}

#[test]
fn copy_and_move_with_overwrite_rules() {
    with_server(|server, port, root| {
        fs::write(root.path().join("src.txt"), b"payload").expect("seed");
        fs::write(root.path().join("taken.txt"), b"old").expect("seed");
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);

        send(
            &mut stream,
            b"COPY /src.txt HTTP/1.1\r\nHost: x\r\nDestination: http://x/copy.txt\r\n\r\n",
        );
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 201);
        assert_eq!(fs::read(root.path().join("copy.txt")).expect("copied"), b"payload");

        // Overwrite: F refuses an existing destination.
        send(
            &mut stream,
            b"COPY /src.txt HTTP/1.1\r\nHost: x\r\nDestination: /taken.txt\r\nOverwrite: F\r\n\r\n",
        );
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 412);

        send(
            &mut stream,
            b"MOVE /src.txt HTTP/1.1\r\nHost: x\r\nDestination: /moved.txt\r\n\r\n",
        );
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 201);
        assert!(!root.path().join("src.txt").exists());
        assert_eq!(fs::read(root.path().join("moved.txt")).expect("moved"), b"payload");

        // Missing Destination header is a bad request.
        send(&mut stream, b"MOVE /moved.txt HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 400);
    });
}

#[test]
fn propfind_is_delegated_as_unimplemented() {
    with_server(|server, port, _root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);
        send(
            &mut stream,
            b"PROPFIND / HTTP/1.1\r\nHost: x\r\nDepth: 1\r\nContent-Length: 0\r\n\r\n",
        );
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 501);

        send(&mut stream, b"BREW /pot HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(read_http_response(&mut tick, &mut stream).status, 501);
    });
}

#[test]
fn escaped_paths_stay_in_the_sandbox() {
    with_server(|server, port, root| {
        let mut now = 0u64;
        let mut tick = || {
            now += 33;
            server.tick(now);
        };
        let mut stream = connect(port);

        // Percent-encoded traversal clamps at the virtual root.
        send(
            &mut stream,
            b"PUT /%2e%2e/%2e%2e/esc.txt HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\nok",
        );
        let resp = read_http_response(&mut tick, &mut stream);
        assert_eq!(resp.status, 201);
        assert!(root.path().join("esc.txt").exists());
        assert!(!root.path().parent().unwrap().join("esc.txt").exists());
    });
}
