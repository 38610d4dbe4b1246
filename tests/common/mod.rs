//! Shared plumbing for driving a tick-based server and a loopback client
//! from one thread.
#![allow(dead_code)]

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Upper bound on pump iterations before a helper gives up. Each iteration
/// ticks the server once and sleeps 1 ms.
const MAX_SPINS: usize = 5000;

pub fn connect(port: u16) -> TcpStream {
    let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream.set_nonblocking(true).expect("nonblocking");
    stream
}

/// Read one CRLF-terminated line, ticking the server while waiting.
pub fn read_line(tick: &mut impl FnMut(), stream: &mut TcpStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    for _ in 0..MAX_SPINS {
        tick();
        loop {
            match stream.read(&mut byte) {
                Ok(0) => panic!("connection closed while waiting for a line"),
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        return String::from_utf8(line).expect("utf8 line");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => panic!("read failed: {}", e),
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("timed out waiting for a line; got {:?}", line);
}

/// Read until the peer closes, ticking the server while waiting.
pub fn read_to_end(tick: &mut impl FnMut(), stream: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    for _ in 0..MAX_SPINS {
        tick();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => return out,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(_) => return out,
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("timed out waiting for close; got {} bytes", out.len());
}

/// Read exactly `n` bytes, ticking the server while waiting.
pub fn read_exact(tick: &mut impl FnMut(), stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    for _ in 0..MAX_SPINS {
        if out.len() >= n {
            out.truncate(n);
            return out;
        }
        tick();
        loop {
            match stream.read(&mut buf) {
                Ok(0) => panic!("connection closed after {} of {} bytes", out.len(), n),
                Ok(got) => {
                    out.extend_from_slice(&buf[..got]);
                    if out.len() >= n {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => panic!("read failed: {}", e),
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("timed out reading {} bytes; got {}", n, out.len());
}

pub fn send(stream: &mut TcpStream, bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        match stream.write(rest) {
            Ok(n) => rest = &rest[n..],
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(e) => panic!("write failed: {}", e),
        }
    }
}

/// One parsed HTTP response: status code, raw head, body bytes.
pub struct HttpResponse {
    pub status: u16,
    pub head: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<String> {
        for line in self.head.lines().skip(1) {
            if let Some((n, v)) = line.split_once(':') {
                if n.eq_ignore_ascii_case(name) {
                    return Some(v.trim().to_string());
                }
            }
        }
        None
    }
}

/// Read a full HTTP response with a `Content-Length` body.
pub fn read_http_response(tick: &mut impl FnMut(), stream: &mut TcpStream) -> HttpResponse {
    let mut head = String::new();
    loop {
        let line = read_line(tick, stream);
        let done = line == "\r\n";
        head.push_str(&line);
        if done {
            break;
        }
    }
    let head = head.trim_end().to_string();
    let status: u16 = head
        .lines()
        .next()
        .and_then(|line| line.split(' ').nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status code");
    let length: usize = head
        .lines()
        .find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse().ok())?
        })
        .unwrap_or(0);
    let body = read_exact(tick, stream, length);
    HttpResponse { status, head, body }
}
