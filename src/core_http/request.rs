//! HTTP/1.1 request-head parsing: request line, method token, header table.
//!
//! The whole head lives in the server's 16 KiB scratch; parsed names,
//! values, and the raw target are slices into it. Only the decoded path is
//! copied out, into a capped buffer.

use heapless::{String as FixedString, Vec as FixedVec};

use crate::constants::{MAX_HEADERS, TARGET_MAX};
use crate::error::HttpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Get,
    Head,
    Put,
    Delete,
    Mkcol,
    Copy,
    Move,
    Propfind,
    Proppatch,
    Other,
}

impl Method {
    pub fn from_token(token: &str) -> Method {
        match token {
            "OPTIONS" => Method::Options,
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "MKCOL" => Method::Mkcol,
            "COPY" => Method::Copy,
            "MOVE" => Method::Move,
            "PROPFIND" => Method::Propfind,
            "PROPPATCH" => Method::Proppatch,
            _ => Method::Other,
        }
    }
}

pub type PathBuf = FixedString<TARGET_MAX>;

#[derive(Debug, PartialEq, Eq)]
pub struct RequestHead<'b> {
    pub method: Method,
    /// Raw request target as sent, query string included.
    pub target: &'b str,
    /// Percent-decoded target up to the first `?`.
    pub path: PathBuf,
    headers: FixedVec<(&'b str, &'b str), MAX_HEADERS>,
}

/// Locate the `\r\n\r\n` terminating the request head.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Parse the head (request line + headers, without the terminating blank
/// line). Continuation lines are rejected; names are matched
/// case-insensitively by the accessors.
pub fn parse_head(head: &str) -> Result<RequestHead<'_>, HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(HttpError::BadRequest)?;

    let mut parts = request_line.split(' ');
    let method_token = parts.next().ok_or(HttpError::BadRequest)?;
    let target = parts.next().ok_or(HttpError::BadRequest)?;
    let _version = parts.next().ok_or(HttpError::BadRequest)?;
    if method_token.is_empty() || target.is_empty() {
        return Err(HttpError::BadRequest);
    }

    let mut headers: FixedVec<(&str, &str), MAX_HEADERS> = FixedVec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            // obs-fold continuation lines are not supported.
            return Err(HttpError::BadRequest);
        }
        let (name, value) = line.split_once(':').ok_or(HttpError::BadRequest)?;
        if name.is_empty() || name.contains(' ') {
            return Err(HttpError::BadRequest);
        }
        headers
            .push((name, value.trim()))
            .map_err(|_| HttpError::BadRequest)?;
    }

    Ok(RequestHead {
        method: Method::from_token(method_token),
        target,
        path: decode_path(target)?,
        headers,
    })
}

impl<'b> RequestHead<'b> {
    pub fn header(&self, name: &str) -> Option<&'b str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// `Content-Length`, rejecting duplicates and junk.
    pub fn content_length(&self) -> Result<Option<u64>, HttpError> {
        let mut found = None;
        for (name, value) in self.headers.iter() {
            if !name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            if found.is_some() {
                return Err(HttpError::BadRequest);
            }
            found = Some(value.parse::<u64>().map_err(|_| HttpError::BadRequest)?);
        }
        Ok(found)
    }

    /// Whether the body uses chunked transfer coding. The final coding
    /// token decides; substring matching would misread unrelated tokens.
    pub fn is_chunked(&self) -> bool {
        match self.header("transfer-encoding") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .last()
                .map(|token| token.eq_ignore_ascii_case("chunked"))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Whether the client asked to close the connection after this
    /// response.
    pub fn wants_close(&self) -> bool {
        match self.header("connection") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .any(|token| token.eq_ignore_ascii_case("close")),
            None => false,
        }
    }
}

/// Copy the target up to the first `?` into a capped buffer, decoding
/// percent escapes. The decoded bytes must be UTF-8 and NUL-free. Also
/// used on `Destination` headers by the DAV layer.
pub fn decode_path(target: &str) -> Result<PathBuf, HttpError> {
    let raw = target.split('?').next().unwrap_or(target);
    let bytes = raw.as_bytes();
    let mut decoded = [0u8; TARGET_MAX];
    let mut len = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|&b| hex_val(b));
            let lo = bytes.get(i + 2).and_then(|&b| hex_val(b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    i += 3;
                    (hi << 4) | lo
                }
                _ => return Err(HttpError::BadRequest),
            }
        } else {
            i += 1;
            bytes[i - 1]
        };
        if b == 0 || len == TARGET_MAX {
            return Err(HttpError::BadRequest);
        }
        decoded[len] = b;
        len += 1;
    }
    let text = core::str::from_utf8(&decoded[..len]).map_err(|_| HttpError::BadRequest)?;
    let mut out: PathBuf = FixedString::new();
    out.push_str(text).map_err(|_| HttpError::BadRequest)?;
    Ok(out)
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(10 + (b - b'a')),
        b'A'..=b'F' => Some(10 + (b - b'A')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_and_headers_parse() {
        let head = "GET /a/b?q=1 HTTP/1.1\r\nHost: x\r\nContent-Length: 5";
        let req = parse_head(head).unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.target, "/a/b?q=1");
        assert_eq!(req.path.as_str(), "/a/b");
        assert_eq!(req.header("host"), Some("x"));
        assert_eq!(req.header("HOST"), Some("x"));
        assert_eq!(req.content_length().unwrap(), Some(5));
    }

    #[test]
    fn unknown_method_is_other() {
        let req = parse_head("BREW /pot HTTP/1.1\r\nHost: x").unwrap();
        assert_eq!(req.method, Method::Other);
    }

    #[test]
    fn missing_version_is_rejected() {
        assert_eq!(parse_head("GET /"), Err(HttpError::BadRequest));
    }

    #[test]
    fn continuation_lines_rejected() {
        let head = "GET / HTTP/1.1\r\nX-A: 1\r\n 2";
        assert_eq!(parse_head(head), Err(HttpError::BadRequest));
    }

    #[test]
    fn duplicate_content_length_rejected() {
        let head = "PUT /f HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 5";
        let req = parse_head(head).unwrap();
        assert_eq!(req.content_length(), Err(HttpError::BadRequest));
    }

    #[test]
    fn chunked_matches_final_token_only() {
        let req = parse_head("PUT /f HTTP/1.1\r\nTransfer-Encoding: chunked").unwrap();
        assert!(req.is_chunked());
        let req = parse_head("PUT /f HTTP/1.1\r\nTransfer-Encoding: gzip, chunked").unwrap();
        assert!(req.is_chunked());
        let req = parse_head("PUT /f HTTP/1.1\r\nTransfer-Encoding: chunked, gzip").unwrap();
        assert!(!req.is_chunked());
        let req = parse_head("PUT /f HTTP/1.1\r\nX-Note: not chunked here").unwrap();
        assert!(!req.is_chunked());
    }

    #[test]
    fn percent_decoding() {
        let req = parse_head("GET /a%20b/c%2Fd HTTP/1.1\r\nHost: x").unwrap();
        assert_eq!(req.path.as_str(), "/a b/c/d");
        assert_eq!(
            parse_head("GET /bad%zz HTTP/1.1\r\nHost: x").unwrap_err(),
            HttpError::BadRequest
        );
        assert_eq!(
            parse_head("GET /%00 HTTP/1.1\r\nHost: x").unwrap_err(),
            HttpError::BadRequest
        );
    }

    #[test]
    fn connection_close_detected() {
        let req = parse_head("GET / HTTP/1.1\r\nConnection: keep-alive, close").unwrap();
        assert!(req.wants_close());
        let req = parse_head("GET / HTTP/1.1\r\nConnection: keep-alive").unwrap();
        assert!(!req.wants_close());
    }

    #[test]
    fn find_header_end_locates_blank_line() {
        assert_eq!(find_header_end(b"GET / HTTP/1.1\r\n\r\nrest"), Some(14));
        assert_eq!(find_header_end(b"partial\r\n"), None);
    }
}
