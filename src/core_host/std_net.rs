use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::net::{Conn, Listener, NetAdapter};
use crate::error::NetError;

/// How long a deadline loop sleeps between retries. Short enough that the
/// 33 ms tick budget is not blown by a timeout-0 call (those never sleep).
const RETRY_SLEEP: Duration = Duration::from_millis(2);

/// `std::net` implementation of the host network adapter. Sockets run in
/// non-blocking mode; timeouts are enforced by deadline loops.
pub struct StdNet {
    pasv_min: u16,
    pasv_max: u16,
    cursor: u16,
    advertised: Option<[u8; 4]>,
}

impl StdNet {
    pub fn new(pasv_min: u16, pasv_max: u16, advertised: Option<[u8; 4]>) -> Self {
        Self {
            pasv_min,
            pasv_max,
            cursor: pasv_min,
            advertised,
        }
    }

    fn bind_port(port: u16) -> Result<StdListener, NetError> {
        let listener =
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(|_| NetError::Io)?;
        listener.set_nonblocking(true).map_err(|_| NetError::Io)?;
        let local_port = listener.local_addr().map_err(|_| NetError::Io)?.port();
        Ok(StdListener {
            listener,
            local_port,
        })
    }
}

impl NetAdapter for StdNet {
    fn bind(&mut self, port: u16) -> Result<Box<dyn Listener>, NetError> {
        let l = Self::bind_port(port)?;
        debug!("listening on 0.0.0.0:{}", l.local_port);
        Ok(Box::new(l))
    }

    fn bind_passive(&mut self) -> Result<Box<dyn Listener>, NetError> {
        let range = u32::from(self.pasv_max.saturating_sub(self.pasv_min)) + 1;
        for _ in 0..range {
            let port = self.cursor;
            self.cursor = if self.cursor >= self.pasv_max {
                self.pasv_min
            } else {
                self.cursor + 1
            };
            match Self::bind_port(port) {
                Ok(l) => {
                    trace!("passive listener bound on port {}", port);
                    return Ok(Box::new(l));
                }
                Err(_) => continue,
            }
        }
        warn!(
            "no free passive port in {}..={}",
            self.pasv_min, self.pasv_max
        );
        Err(NetError::Io)
    }

    fn advertised_ipv4(&self) -> Option<[u8; 4]> {
        self.advertised
    }
}

pub struct StdListener {
    listener: TcpListener,
    local_port: u16,
}

impl Listener for StdListener {
    fn accept(&mut self, timeout_ms: u32) -> Result<Box<dyn Conn>, NetError> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(true).map_err(|_| NetError::Io)?;
                    stream.set_nodelay(true).ok();
                    debug!("accepted connection from {}", peer);
                    return Ok(Box::new(StdConn { stream }));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(NetError::WouldBlock);
                    }
                    std::thread::sleep(RETRY_SLEEP);
                }
                Err(_) => return Err(NetError::Io),
            }
        }
    }

    fn local_port(&self) -> u16 {
        self.local_port
    }
}

pub struct StdConn {
    stream: TcpStream,
}

fn map_io(e: std::io::Error) -> NetError {
    match e.kind() {
        ErrorKind::WouldBlock => NetError::WouldBlock,
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof => NetError::Closed,
        _ => NetError::Io,
    }
}

impl Conn for StdConn {
    fn recv(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, NetError> {
        if buf.is_empty() {
            // A zero-length read is indistinguishable from EOF below.
            return Ok(0);
        }
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        loop {
            match self.stream.read(buf) {
                Ok(0) => return Err(NetError::Closed),
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(NetError::WouldBlock);
                    }
                    std::thread::sleep(RETRY_SLEEP);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io(e)),
            }
        }
    }

    fn send(&mut self, buf: &[u8], timeout_ms: u32) -> Result<usize, NetError> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        loop {
            match self.stream.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(NetError::WouldBlock);
                    }
                    std::thread::sleep(RETRY_SLEEP);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io(e)),
            }
        }
    }

    fn local_ipv4(&self) -> Option<[u8; 4]> {
        match self.stream.local_addr() {
            Ok(SocketAddr::V4(a)) => Some(a.ip().octets()),
            _ => None,
        }
    }
}
