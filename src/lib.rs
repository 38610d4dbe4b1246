//! Paper Portal: a single-client LAN file server engine with an FTP
//! variant and a WebDAV (HTTP/1.1) variant.
//!
//! The engine is strictly tick-driven: the host calls
//! [`core_ftp::FtpServer::tick`] or [`core_http::HttpServer::tick`] on a
//! ~33 ms cadence and every step inside is bounded by explicit adapter
//! timeouts. All I/O goes through the host adapter traits in
//! [`core_host`]; all storage access goes through the sandboxed virtual
//! path layer in [`core_path`] and [`core_storage`].

pub mod config;
pub mod constants;
pub mod core_dav;
pub mod core_ftp;
pub mod core_host;
pub mod core_http;
pub mod core_path;
pub mod core_storage;
pub mod error;

pub use config::{Config, Credentials, Protocol};
