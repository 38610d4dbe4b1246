//! HTTP/1.1 response framing.
//!
//! The writer is a little state record that only moves forward:
//! `init -> head-written -> (body-written)* -> finished`. Writing out of
//! order is a programmer error and reported as such instead of corrupting
//! the wire.

use core::fmt::Write as _;

use heapless::String as FixedString;

use crate::constants::{SEND_TIMEOUT_MS, SERVER_NAME};
use crate::core_host::net::{send_all, Conn};
use crate::error::HttpError;

/// Response head scratch: status line, fixed headers, caller headers.
const HEAD_MAX: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// `Content-Length: 0`.
    Empty,
    /// `Content-Length: n`, body bytes must total exactly n.
    Length(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
}

pub struct ResponseWriter {
    pub wrote_head: bool,
    pub chunked: bool,
    pub finished: bool,
    pub close_after_response: bool,
    /// Body bytes still owed under `Length` framing.
    remaining: u64,
    /// HEAD responses carry the framing headers but no body bytes.
    head_only: bool,
}

impl ResponseWriter {
    pub fn new(close_after_response: bool, head_only: bool) -> Self {
        Self {
            wrote_head: false,
            chunked: false,
            finished: false,
            close_after_response,
            remaining: 0,
            head_only,
        }
    }

    pub fn write_head(
        &mut self,
        conn: &mut dyn Conn,
        status: u16,
        headers: &[(&str, &str)],
        framing: BodyFraming,
    ) -> Result<(), HttpError> {
        if self.wrote_head || self.finished {
            return Err(HttpError::ResponseState);
        }

        let mut head: FixedString<HEAD_MAX> = FixedString::new();
        write!(head, "HTTP/1.1 {} {}\r\n", status, reason(status))
            .map_err(|_| HttpError::ResponseState)?;
        write!(head, "Server: {}\r\n", SERVER_NAME).map_err(|_| HttpError::ResponseState)?;
        write!(
            head,
            "Connection: {}\r\n",
            if self.close_after_response {
                "close"
            } else {
                "keep-alive"
            }
        )
        .map_err(|_| HttpError::ResponseState)?;
        for (name, value) in headers {
            write!(head, "{}: {}\r\n", name, value).map_err(|_| HttpError::ResponseState)?;
        }
        match framing {
            BodyFraming::Empty => {
                head.push_str("Content-Length: 0\r\n")
                    .map_err(|_| HttpError::ResponseState)?;
            }
            BodyFraming::Length(n) => {
                write!(head, "Content-Length: {}\r\n", n).map_err(|_| HttpError::ResponseState)?;
                self.remaining = n;
            }
            BodyFraming::Chunked => {
                head.push_str("Transfer-Encoding: chunked\r\n")
                    .map_err(|_| HttpError::ResponseState)?;
                self.chunked = true;
            }
        }
        head.push_str("\r\n").map_err(|_| HttpError::ResponseState)?;

        send_all(conn, head.as_bytes(), SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
        self.wrote_head = true;
        Ok(())
    }

    pub fn write_body(&mut self, conn: &mut dyn Conn, bytes: &[u8]) -> Result<(), HttpError> {
        if !self.wrote_head || self.finished || self.head_only {
            return Err(HttpError::ResponseState);
        }
        if bytes.is_empty() {
            return Ok(());
        }
        if self.chunked {
            let mut prefix: FixedString<16> = FixedString::new();
            write!(prefix, "{:x}\r\n", bytes.len()).map_err(|_| HttpError::ResponseState)?;
            send_all(conn, prefix.as_bytes(), SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
            send_all(conn, bytes, SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
            send_all(conn, b"\r\n", SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
        } else {
            if (bytes.len() as u64) > self.remaining {
                return Err(HttpError::ResponseState);
            }
            send_all(conn, bytes, SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
            self.remaining -= bytes.len() as u64;
        }
        Ok(())
    }

    pub fn finish(&mut self, conn: &mut dyn Conn) -> Result<(), HttpError> {
        if !self.wrote_head || self.finished {
            return Err(HttpError::ResponseState);
        }
        if self.chunked && !self.head_only {
            send_all(conn, b"0\r\n\r\n", SEND_TIMEOUT_MS).map_err(HttpError::Net)?;
        }
        if !self.chunked && !self.head_only && self.remaining != 0 {
            return Err(HttpError::ResponseState);
        }
        self.finished = true;
        Ok(())
    }
}

/// Reason phrases for the statuses the engine emits; everything else reads
/// as a generic success.
pub fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        207 => "Multi-Status",
        301 => "Moved Permanently",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "OK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;

    struct SinkConn {
        sent: Vec<u8>,
    }

    impl Conn for SinkConn {
        fn recv(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, NetError> {
            Err(NetError::WouldBlock)
        }

        fn send(&mut self, buf: &[u8], _timeout_ms: u32) -> Result<usize, NetError> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn local_ipv4(&self) -> Option<[u8; 4]> {
            None
        }
    }

    #[test]
    fn fixed_length_response() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(false, false);
        resp.write_head(&mut conn, 200, &[("Content-Type", "text/plain")], BodyFraming::Length(5))
            .unwrap();
        resp.write_body(&mut conn, b"hello").unwrap();
        resp.finish(&mut conn).unwrap();

        let text = String::from_utf8(conn.sent).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"), "{text}");
        assert!(text.contains("Connection: keep-alive\r\n"), "{text}");
        assert!(text.contains("Content-Length: 5\r\n"), "{text}");
        assert!(text.ends_with("\r\n\r\nhello"), "{text}");
    }

    #[test]
    fn chunked_response_framing() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(true, false);
        resp.write_head(&mut conn, 200, &[], BodyFraming::Chunked).unwrap();
        resp.write_body(&mut conn, b"hello").unwrap();
        resp.write_body(&mut conn, b" world!").unwrap();
        resp.finish(&mut conn).unwrap();

        let text = String::from_utf8(conn.sent).unwrap();
        assert!(text.contains("Connection: close\r\n"), "{text}");
        assert!(text.contains("Transfer-Encoding: chunked\r\n"), "{text}");
        assert!(text.ends_with("5\r\nhello\r\n7\r\n world!\r\n0\r\n\r\n"), "{text}");
    }

    #[test]
    fn body_before_head_is_a_framing_error() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(false, false);
        assert_eq!(
            resp.write_body(&mut conn, b"x"),
            Err(HttpError::ResponseState)
        );
    }

    #[test]
    fn write_after_finish_is_a_framing_error() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(false, false);
        resp.write_head(&mut conn, 204, &[], BodyFraming::Empty).unwrap();
        resp.finish(&mut conn).unwrap();
        assert_eq!(
            resp.write_body(&mut conn, b"x"),
            Err(HttpError::ResponseState)
        );
        assert_eq!(resp.finish(&mut conn), Err(HttpError::ResponseState));
    }

    #[test]
    fn short_length_body_cannot_finish() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(false, false);
        resp.write_head(&mut conn, 200, &[], BodyFraming::Length(5)).unwrap();
        resp.write_body(&mut conn, b"hi").unwrap();
        assert_eq!(resp.finish(&mut conn), Err(HttpError::ResponseState));
    }

    #[test]
    fn head_only_skips_body_enforcement() {
        let mut conn = SinkConn { sent: Vec::new() };
        let mut resp = ResponseWriter::new(false, true);
        resp.write_head(&mut conn, 200, &[], BodyFraming::Length(1234)).unwrap();
        resp.finish(&mut conn).unwrap();
        let text = String::from_utf8(conn.sent).unwrap();
        assert!(text.contains("Content-Length: 1234\r\n"), "{text}");
        assert!(text.ends_with("\r\n\r\n"), "{text}");
    }
}
