//! One request/response exchange.
//!
//! The byte-level half lives in `Wire`: the body reader, the response
//! writer, and the connection they share. `Exchange` adds the parsed
//! request head for the handler's dispatch call. The split lets the server
//! keep the body/response state across ticks and rebuild a `Wire` around it
//! each time an in-flight transfer is stepped; the response state record
//! keeps its monotonic `init -> head -> body -> finished` transitions
//! throughout.

use crate::core_http::body::{BodyReader, Source};
use crate::core_http::request::{Method, RequestHead};
use crate::core_http::response::{BodyFraming, ResponseWriter};
use crate::error::HttpError;

/// Request-body and response plumbing over one connection.
pub struct Wire<'c> {
    source: Source<'c>,
    body: &'c mut BodyReader,
    pub(crate) resp: &'c mut ResponseWriter,
}

impl<'c> Wire<'c> {
    pub(crate) fn new(
        source: Source<'c>,
        body: &'c mut BodyReader,
        resp: &'c mut ResponseWriter,
    ) -> Self {
        Self { source, body, resp }
    }

    /// Read the next piece of the request body; 0 at end of body.
    pub fn read_body(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        self.body.read(&mut self.source, buf)
    }

    pub fn write_head(
        &mut self,
        status: u16,
        headers: &[(&str, &str)],
        framing: BodyFraming,
    ) -> Result<(), HttpError> {
        self.resp
            .write_head(self.source.conn_mut(), status, headers, framing)
    }

    pub fn write_body(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        self.resp.write_body(self.source.conn_mut(), bytes)
    }

    pub fn finish(&mut self) -> Result<(), HttpError> {
        self.resp.finish(self.source.conn_mut())
    }

    /// Shorthand for the common empty-body terminal replies.
    pub fn respond_empty(&mut self, status: u16, headers: &[(&str, &str)]) -> Result<(), HttpError> {
        self.write_head(status, headers, BodyFraming::Empty)?;
        self.finish()
    }

    /// Prefetch bytes consumed so far; the server carries the cursor
    /// between ticks and leaves the rest for the next pipelined request.
    pub(crate) fn consumed(&self) -> usize {
        self.source.consumed()
    }
}

pub struct Exchange<'c> {
    head: RequestHead<'c>,
    pub(crate) wire: Wire<'c>,
}

impl<'c> Exchange<'c> {
    pub(crate) fn new(head: RequestHead<'c>, wire: Wire<'c>) -> Self {
        Self { head, wire }
    }

    // Request side.

    pub fn method(&self) -> Method {
        self.head.method
    }

    /// Decoded absolute path of the request target.
    pub fn path(&self) -> &str {
        self.head.path.as_str()
    }

    /// Raw request target as received.
    pub fn target(&self) -> &'c str {
        self.head.target
    }

    pub fn header(&self, name: &str) -> Option<&'c str> {
        self.head.header(name)
    }

    /// Read the next piece of the request body; 0 at end of body.
    pub fn read_body(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        self.wire.read_body(buf)
    }

    // Response side.

    pub fn write_head(
        &mut self,
        status: u16,
        headers: &[(&str, &str)],
        framing: BodyFraming,
    ) -> Result<(), HttpError> {
        self.wire.write_head(status, headers, framing)
    }

    pub fn write_body(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        self.wire.write_body(bytes)
    }

    pub fn finish(&mut self) -> Result<(), HttpError> {
        self.wire.finish()
    }

    pub fn respond_empty(&mut self, status: u16, headers: &[(&str, &str)]) -> Result<(), HttpError> {
        self.wire.respond_empty(status, headers)
    }

    pub(crate) fn consumed(&self) -> usize {
        self.wire.consumed()
    }
}
