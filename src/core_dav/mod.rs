//! WebDAV method handling behind the engine's dispatcher.
//!
//! The engine hands every parsed request to a `DavHandler`; the shipped
//! `FsDavHandler` covers the plain-file methods. Property marshalling
//! (PROPFIND/PROPPATCH XML) is a host concern: a host that wants it
//! supplies its own handler wrapping this one.

pub mod handler;

pub use handler::FsDavHandler;

use crate::core_http::exchange::Exchange;
use crate::core_http::transfer::BodyTransfer;
use crate::core_storage::SandboxFs;
use crate::error::HttpError;

/// What a handler produced for one exchange.
pub enum Dispatch {
    /// The response was fully written within the call.
    Done,
    /// A body remains to be streamed; the engine advances the returned
    /// transfer one chunk per tick.
    Transfer(BodyTransfer),
}

pub trait DavHandler {
    /// Dispatch one exchange. Headless work (stat, mkdir, rename) answers
    /// within the call and returns `Done`; anything that moves file or
    /// body bytes returns a `Transfer` for the tick loop to step, so a
    /// large resource never stalls the scheduler. Returning an error
    /// closes the connection after a best-effort status; handlers answer
    /// expected failures (404, 409, ...) themselves and reserve `Err` for
    /// framing-level trouble.
    fn handle(
        &mut self,
        fs: &SandboxFs<'_>,
        ex: &mut Exchange<'_>,
    ) -> Result<Dispatch, HttpError>;
}
