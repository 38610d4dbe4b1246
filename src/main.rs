mod core_cli;

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use env_logger::{Builder, Env};
use log::info;
use structopt::StructOpt;

use paperportald::config::{load_config, Config, Protocol};
use paperportald::constants::TICK_INTERVAL_MS;
use paperportald::core_dav::FsDavHandler;
use paperportald::core_ftp::FtpServer;
use paperportald::core_host::{StdFs, StdNet, SystemClock};
use paperportald::core_http::HttpServer;

use crate::core_cli::Cli;

const DEFAULT_CONFIG_PATH: &str = "/etc/paperportald.conf";

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::from_args();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration, falling back to built-in defaults when no file
    // is present at the default location.
    let mut config = if args.config.is_empty() {
        match load_config(DEFAULT_CONFIG_PATH) {
            Ok(config) => config,
            Err(_) => {
                info!("no config at {}, using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    } else {
        load_config(&args.config)?
    };

    // CLI overrides
    if let Some(protocol) = &args.protocol {
        config.server.protocol = match protocol.to_ascii_lowercase().as_str() {
            "ftp" => Protocol::Ftp,
            "webdav" => Protocol::Webdav,
            other => bail!("unknown protocol: {}", other),
        };
    }
    if let Some(port) = args.port {
        config.server.listen_port = Some(port);
    }
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }

    run(config)
}

fn run(config: Config) -> Result<()> {
    info!("starting with config: {:?}", config);

    let advertised = config.server.pasv_ipv4()?;
    let mut net = StdNet::new(
        config.server.pasv_port_min,
        config.server.pasv_port_max,
        advertised,
    );
    let host_fs = StdFs;
    let clock = SystemClock;
    let port = config.server.effective_port();

    match config.server.protocol {
        Protocol::Ftp => {
            let mut server = FtpServer::new(
                &mut net,
                &host_fs,
                &config.server.root_dir,
                &clock,
                config.server.credentials(),
            );
            server
                .start(port)
                .with_context(|| format!("failed to start FTP server on port {}", port))?;
            drive(|now_ms| server.tick(now_ms))
        }
        Protocol::Webdav => {
            let mut handler = FsDavHandler::new();
            let mut server = HttpServer::new(
                &mut net,
                &host_fs,
                &config.server.root_dir,
                &mut handler,
            );
            server
                .start(port)
                .with_context(|| format!("failed to start WebDAV server on port {}", port))?;
            drive(|now_ms| server.tick(now_ms))
        }
    }
}

/// The stand-in host runtime: a ~33 ms tick cadence, forever.
fn drive(mut tick: impl FnMut(u64)) -> Result<()> {
    let started = Instant::now();
    loop {
        tick(started.elapsed().as_millis() as u64);
        thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
    }
}
