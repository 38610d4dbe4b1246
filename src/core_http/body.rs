//! Request body reading: none, `Content-Length`, or chunked.
//!
//! Bytes already pulled into the head scratch ahead of the body are served
//! first; the connection is only touched once the prefetch is drained.

use crate::constants::FRAME_READ_TIMEOUT_MS;
use crate::core_host::net::Conn;
use crate::error::{HttpError, NetError};

/// Byte source combining the head-scratch prefetch with the connection.
pub struct Source<'c> {
    leftover: &'c [u8],
    pos: usize,
    conn: &'c mut dyn Conn,
}

impl<'c> Source<'c> {
    pub fn new(leftover: &'c [u8], conn: &'c mut dyn Conn) -> Self {
        Self::resume(leftover, 0, conn)
    }

    /// Rebuild a source for an exchange spanning ticks: same prefetch
    /// window, read cursor restored to where the previous tick stopped.
    pub fn resume(leftover: &'c [u8], pos: usize, conn: &'c mut dyn Conn) -> Self {
        Self {
            leftover,
            pos,
            conn,
        }
    }

    /// Bytes of the prefetch consumed so far. Whatever is left belongs to
    /// the next pipelined request.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// The underlying connection, for the response side of the exchange.
    pub(crate) fn conn_mut(&mut self) -> &mut dyn Conn {
        &mut *self.conn
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        if self.pos < self.leftover.len() {
            let take = (self.leftover.len() - self.pos).min(buf.len());
            buf[..take].copy_from_slice(&self.leftover[self.pos..self.pos + take]);
            self.pos += take;
            return Ok(take);
        }
        match self.conn.recv(buf, FRAME_READ_TIMEOUT_MS) {
            Ok(n) => Ok(n),
            Err(NetError::Closed) => Err(HttpError::UnexpectedEndOfStream),
            Err(e) => Err(HttpError::Net(e)),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), HttpError> {
        let mut filled = 0usize;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(HttpError::UnexpectedEndOfStream);
            }
            filled += n;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, HttpError> {
        let mut one = [0u8; 1];
        self.read_exact(&mut one)?;
        Ok(one[0])
    }
}

enum State {
    Done,
    Length { remaining: u64 },
    ChunkSize,
    ChunkData { remaining: u64 },
    ChunkTrailers,
}

/// Decodes the request body per the framing headers. `read` returning 0
/// means the body is fully consumed.
pub struct BodyReader {
    state: State,
}

impl BodyReader {
    pub fn empty() -> Self {
        Self { state: State::Done }
    }

    pub fn with_length(length: u64) -> Self {
        if length == 0 {
            return Self::empty();
        }
        Self {
            state: State::Length { remaining: length },
        }
    }

    pub fn chunked() -> Self {
        Self {
            state: State::ChunkSize,
        }
    }

    pub fn read(&mut self, src: &mut Source<'_>, buf: &mut [u8]) -> Result<usize, HttpError> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match &mut self.state {
                State::Done => return Ok(0),
                State::Length { remaining } => {
                    let want = (*remaining).min(buf.len() as u64) as usize;
                    let n = src.read(&mut buf[..want])?;
                    if n == 0 {
                        return Err(HttpError::UnexpectedEndOfStream);
                    }
                    *remaining -= n as u64;
                    if *remaining == 0 {
                        self.state = State::Done;
                    }
                    return Ok(n);
                }
                State::ChunkSize => {
                    let size = read_chunk_size(src)?;
                    if size == 0 {
                        self.state = State::ChunkTrailers;
                    } else {
                        self.state = State::ChunkData { remaining: size };
                    }
                }
                State::ChunkData { remaining } => {
                    let want = (*remaining).min(buf.len() as u64) as usize;
                    let n = src.read(&mut buf[..want])?;
                    if n == 0 {
                        return Err(HttpError::UnexpectedEndOfStream);
                    }
                    *remaining -= n as u64;
                    if *remaining == 0 {
                        expect_crlf(src)?;
                        self.state = State::ChunkSize;
                    }
                    return Ok(n);
                }
                State::ChunkTrailers => {
                    // Trailer lines are discarded; the empty line ends the
                    // body.
                    loop {
                        let line_len = skip_line(src)?;
                        if line_len == 0 {
                            break;
                        }
                    }
                    self.state = State::Done;
                }
            }
        }
    }

    /// Whether the body has been consumed to its end.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

/// Parse one `hex-size[;extensions]\r\n` line.
fn read_chunk_size(src: &mut Source<'_>) -> Result<u64, HttpError> {
    let mut line = [0u8; 32];
    let mut len = 0usize;
    loop {
        let b = src.read_byte()?;
        if b == b'\n' {
            break;
        }
        if len == line.len() {
            return Err(HttpError::BadChunkedEncoding);
        }
        line[len] = b;
        len += 1;
    }
    if len > 0 && line[len - 1] == b'\r' {
        len -= 1;
    }
    let text = core::str::from_utf8(&line[..len]).map_err(|_| HttpError::BadChunkedEncoding)?;
    let digits = text.split(';').next().unwrap_or("").trim();
    if digits.is_empty() {
        return Err(HttpError::BadChunkedEncoding);
    }
    u64::from_str_radix(digits, 16).map_err(|_| HttpError::BadChunkedEncoding)
}

fn expect_crlf(src: &mut Source<'_>) -> Result<(), HttpError> {
    let mut two = [0u8; 2];
    src.read_exact(&mut two)?;
    if &two != b"\r\n" {
        return Err(HttpError::BadChunkedEncoding);
    }
    Ok(())
}

/// Skip one CRLF-terminated line, returning its length without the
/// terminator.
fn skip_line(src: &mut Source<'_>) -> Result<usize, HttpError> {
    let mut len = 0usize;
    loop {
        let b = src.read_byte()?;
        if b == b'\n' {
            return Ok(len);
        }
        if b != b'\r' {
            len += 1;
        }
        if len > 8192 {
            return Err(HttpError::BadChunkedEncoding);
        }
    }
}
