//! The WebDAV variant's HTTP/1.1 engine: framing, keep-alive, and method
//! dispatch into the DAV handler. One client, one request in flight, one
//! cooperative `tick` per scheduler pass. A request that moves body bytes
//! spans ticks: the handler opens the handles and returns a transfer
//! record, and each tick advances it by at most one transfer-buffer-sized
//! chunk, mirroring the FTP data-transfer steppers.

pub mod body;
pub mod exchange;
pub mod request;
pub mod response;
pub mod transfer;

use log::{debug, info, warn};

use crate::constants::{FRAME_READ_TIMEOUT_MS, HEADER_BUF, POLL_TIMEOUT_MS, TRANSFER_BUF};
use crate::core_dav::{DavHandler, Dispatch};
use crate::core_host::fs::HostFs;
use crate::core_host::net::{Conn, Listener, NetAdapter};
use crate::core_storage::SandboxFs;
use crate::error::{HttpError, NetError, StartError};

use body::{BodyReader, Source};
use exchange::{Exchange, Wire};
use request::{find_header_end, parse_head, Method};
use response::{BodyFraming, ResponseWriter};
use transfer::{BodyTransfer, Step};

/// State of the exchange currently spanning ticks.
struct ActiveExchange {
    body: BodyReader,
    resp: ResponseWriter,
    /// Prefetch window into the head scratch and the cursor within it.
    body_start: usize,
    body_pos: usize,
    close: bool,
    phase: Phase,
}

enum Phase {
    /// A handler-supplied body transfer being stepped.
    Transfer(BodyTransfer),
    /// Response written; consuming the rest of the request body before the
    /// connection can be reused.
    Drain,
}

pub struct HttpServer<'a> {
    net: &'a mut dyn NetAdapter,
    fs: SandboxFs<'a>,
    handler: &'a mut dyn DavHandler,
    listener: Option<Box<dyn Listener>>,
    conn: Option<Box<dyn Conn>>,
    running: bool,
    head_buf: [u8; HEADER_BUF],
    /// Bytes currently buffered: a partial head, or pipelined input
    /// carried over from the previous request.
    head_len: usize,
    active: Option<ActiveExchange>,
    xfer_buf: [u8; TRANSFER_BUF],
}

impl<'a> HttpServer<'a> {
    pub fn new(
        net: &'a mut dyn NetAdapter,
        host_fs: &'a dyn HostFs,
        root: &'a str,
        handler: &'a mut dyn DavHandler,
    ) -> Self {
        Self {
            net,
            fs: SandboxFs::new(host_fs, root),
            handler,
            listener: None,
            conn: None,
            running: false,
            head_buf: [0; HEADER_BUF],
            head_len: 0,
            active: None,
            xfer_buf: [0; TRANSFER_BUF],
        }
    }

    pub fn start(&mut self, port: u16) -> Result<(), StartError> {
        match self.fs.stat("/") {
            Ok(info) if info.is_dir => {}
            _ => return Err(StartError::Root),
        }
        self.listener = Some(self.net.bind(port)?);
        self.running = true;
        info!("WebDAV server listening on port {}", port);
        Ok(())
    }

    /// Close everything, innermost handle first. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.active = None;
        self.conn = None;
        self.listener = None;
        self.head_len = 0;
        self.running = false;
    }

    pub fn local_port(&self) -> Option<u16> {
        self.listener.as_ref().map(|l| l.local_port())
    }

    /// One scheduler pass: accept, or advance the in-flight exchange by
    /// one chunk, or dispatch at most one new request.
    pub fn tick(&mut self, _now_ms: u64) {
        if !self.running {
            return;
        }
        if self.conn.is_none() {
            self.try_accept();
            return;
        }
        if self.active.is_some() {
            self.step_active();
            return;
        }
        self.service_request();
    }

    fn try_accept(&mut self) {
        let listener = match self.listener.as_mut() {
            Some(listener) => listener,
            None => return,
        };
        match listener.accept(POLL_TIMEOUT_MS) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.head_len = 0;
            }
            Err(NetError::WouldBlock) => {}
            Err(e) => debug!("accept failed: {}", e),
        }
    }

    /// Read one request head and dispatch it to the handler. Transfers the
    /// handler hands back are stepped on subsequent ticks.
    fn service_request(&mut self) {
        // Wait for the first bytes without blocking the tick; once a
        // request has started, framing reads may use the long timeout.
        if find_header_end(&self.head_buf[..self.head_len]).is_none() {
            if self.head_len == HEADER_BUF {
                self.fail_close(HttpError::LineTooLong);
                return;
            }
            let conn = match self.conn.as_mut() {
                Some(conn) => conn,
                None => return,
            };
            match conn.recv(&mut self.head_buf[self.head_len..], POLL_TIMEOUT_MS) {
                Ok(n) => self.head_len += n,
                Err(NetError::WouldBlock) => return,
                Err(_) => {
                    self.drop_conn();
                    return;
                }
            }
            while find_header_end(&self.head_buf[..self.head_len]).is_none() {
                if self.head_len == HEADER_BUF {
                    warn!("request head exceeded {} bytes", HEADER_BUF);
                    self.fail_close(HttpError::LineTooLong);
                    return;
                }
                let conn = match self.conn.as_mut() {
                    Some(conn) => conn,
                    None => return,
                };
                match conn.recv(&mut self.head_buf[self.head_len..], FRAME_READ_TIMEOUT_MS) {
                    Ok(n) => self.head_len += n,
                    Err(_) => {
                        self.drop_conn();
                        return;
                    }
                }
            }
        }

        let head_end = match find_header_end(&self.head_buf[..self.head_len]) {
            Some(end) => end,
            None => return,
        };
        let body_start = head_end + 4;

        // Parsed into a stack-local copy of the head bytes (rather than
        // borrowing `self.head_buf` directly) so error paths below can
        // still call back into `&mut self`.
        let mut head_copy = [0u8; HEADER_BUF];
        head_copy[..head_end].copy_from_slice(&self.head_buf[..head_end]);

        let head_text = match core::str::from_utf8(&head_copy[..head_end]) {
            Ok(text) => text,
            Err(_) => {
                self.fail_close(HttpError::BadRequest);
                return;
            }
        };
        let head = match parse_head(head_text) {
            Ok(head) => head,
            Err(e) => {
                self.fail_close(e);
                return;
            }
        };

        let body = if head.is_chunked() {
            BodyReader::chunked()
        } else {
            match head.content_length() {
                Ok(Some(n)) => BodyReader::with_length(n),
                Ok(None) => BodyReader::empty(),
                Err(e) => {
                    self.fail_close(e);
                    return;
                }
            }
        };

        let close_requested = head.wants_close();
        let head_only = head.method == Method::Head;
        debug!("{:?} {}", head.method, head.target);

        let active = self.active.insert(ActiveExchange {
            body,
            resp: ResponseWriter::new(close_requested, head_only),
            body_start,
            body_pos: 0,
            close: close_requested,
            phase: Phase::Drain,
        });
        let conn = match self.conn.as_mut() {
            Some(conn) => conn.as_mut(),
            None => {
                self.active = None;
                return;
            }
        };
        let source = Source::resume(
            &self.head_buf[active.body_start..self.head_len],
            active.body_pos,
            conn,
        );
        let wire = Wire::new(source, &mut active.body, &mut active.resp);
        let mut ex = Exchange::new(head, wire);

        match self.handler.handle(&self.fs, &mut ex) {
            Ok(Dispatch::Transfer(transfer)) => {
                let pos = ex.consumed();
                drop(ex);
                active.body_pos = pos;
                active.phase = Phase::Transfer(transfer);
            }
            Ok(Dispatch::Done) => {
                let wrote_head = ex.wire.resp.wrote_head;
                let finished = ex.wire.resp.finished;
                let finish_err = if wrote_head && !finished {
                    ex.finish().is_err()
                } else {
                    false
                };
                let pos = ex.consumed();
                drop(ex);
                active.body_pos = pos;
                if !wrote_head {
                    // The handler produced nothing; treat as its bug.
                    self.fail_active(HttpError::ResponseState);
                } else if finish_err {
                    self.drop_conn();
                } else {
                    self.finish_or_drain();
                }
            }
            Err(e) => {
                warn!("request failed: {}", e);
                let pos = ex.consumed();
                drop(ex);
                active.body_pos = pos;
                self.fail_active(e);
            }
        }
    }

    /// Advance the in-flight exchange by one chunk.
    fn step_active(&mut self) {
        let active = match self.active.as_mut() {
            Some(active) => active,
            None => return,
        };
        let conn = match self.conn.as_mut() {
            Some(conn) => conn.as_mut(),
            None => {
                self.active = None;
                return;
            }
        };
        let source = Source::resume(
            &self.head_buf[active.body_start..self.head_len],
            active.body_pos,
            conn,
        );
        let mut wire = Wire::new(source, &mut active.body, &mut active.resp);

        match &mut active.phase {
            Phase::Transfer(transfer) => {
                let step = transfer.step(&self.fs, &mut wire, &mut self.xfer_buf);
                let pos = wire.consumed();
                drop(wire);
                active.body_pos = pos;
                match step {
                    Step::Progress => {}
                    Step::Done => {
                        active.phase = Phase::Drain;
                        self.finish_or_drain();
                    }
                    Step::Failed(e) => {
                        warn!("request failed: {}", e);
                        self.fail_active(e);
                    }
                }
            }
            Phase::Drain => {
                let result = wire.read_body(&mut self.xfer_buf);
                let pos = wire.consumed();
                drop(wire);
                active.body_pos = pos;
                match result {
                    Ok(0) => self.complete_active(),
                    Ok(_) => {}
                    Err(e) => {
                        debug!("body drain failed: {}", e);
                        self.fail_active(e);
                    }
                }
            }
        }
    }

    /// The response is out: complete at once when the body is already
    /// consumed (or the connection is closing anyway), else keep draining
    /// one chunk per tick.
    fn finish_or_drain(&mut self) {
        let (close, body_done) = match &self.active {
            Some(active) => (active.close, active.body.is_done()),
            None => return,
        };
        if close || body_done {
            self.complete_active();
        }
    }

    /// Close out the exchange: carry pipelined bytes for the next request,
    /// or drop the connection when it asked to close.
    fn complete_active(&mut self) {
        let active = match self.active.take() {
            Some(active) => active,
            None => return,
        };
        if active.close {
            self.drop_conn();
            return;
        }
        let carry_start = active.body_start + active.body_pos;
        self.head_buf.copy_within(carry_start..self.head_len, 0);
        self.head_len -= carry_start;
    }

    /// Best-effort error status when no head has gone out, then close.
    fn fail_active(&mut self, e: HttpError) {
        if let (Some(active), Some(conn)) = (self.active.as_mut(), self.conn.as_mut()) {
            if !active.resp.wrote_head {
                active.resp.close_after_response = true;
                let _ = active
                    .resp
                    .write_head(conn.as_mut(), e.status(), &[], BodyFraming::Empty);
                let _ = active.resp.finish(conn.as_mut());
            }
        }
        self.drop_conn();
    }

    /// Best-effort error response for failures before an exchange exists.
    fn fail_close(&mut self, e: HttpError) {
        debug!("closing connection: {}", e);
        if let Some(conn) = self.conn.as_mut() {
            let mut resp = ResponseWriter::new(true, false);
            let _ = resp.write_head(conn.as_mut(), e.status(), &[], BodyFraming::Empty);
            let _ = resp.finish(conn.as_mut());
        }
        self.drop_conn();
    }

    fn drop_conn(&mut self) {
        self.active = None;
        self.conn = None;
        self.head_len = 0;
    }
}
