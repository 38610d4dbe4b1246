use std::fs;
use std::net::Ipv4Addr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::{DEFAULT_ROOT, FTP_PORT, HTTP_PORT, PASV_PORT_MAX, PASV_PORT_MIN};

/// Which protocol variant a server instance speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Webdav,
}

/// The single static FTP credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_protocol")]
    pub protocol: Protocol,
    /// Defaults to 21 for FTP and 8080 for WebDAV when absent.
    pub listen_port: Option<u16>,
    #[serde(default = "default_root")]
    pub root_dir: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_pasv_min")]
    pub pasv_port_min: u16,
    #[serde(default = "default_pasv_max")]
    pub pasv_port_max: u16,
    /// Public address to advertise in PASV replies, overriding the address
    /// observed on the control connection.
    pub pasv_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
}

fn default_protocol() -> Protocol {
    Protocol::Ftp
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_user() -> String {
    "paper".to_string()
}

fn default_password() -> String {
    "paper".to_string()
}

fn default_pasv_min() -> u16 {
    PASV_PORT_MIN
}

fn default_pasv_max() -> u16 {
    PASV_PORT_MAX
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            listen_port: None,
            root_dir: default_root(),
            user: default_user(),
            password: default_password(),
            pasv_port_min: default_pasv_min(),
            pasv_port_max: default_pasv_max(),
            pasv_address: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn effective_port(&self) -> u16 {
        self.listen_port.unwrap_or(match self.protocol {
            Protocol::Ftp => FTP_PORT,
            Protocol::Webdav => HTTP_PORT,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    pub fn pasv_ipv4(&self) -> Result<Option<[u8; 4]>> {
        match &self.pasv_address {
            None => Ok(None),
            Some(addr) => {
                let ip: Ipv4Addr = addr
                    .parse()
                    .with_context(|| format!("invalid pasv_address: {}", addr))?;
                Ok(Some(ip.octets()))
            }
        }
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}
