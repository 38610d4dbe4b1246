use log::{debug, warn};

use crate::core_ftp::reply::{format_pasv, format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, Transfer};
use crate::core_host::net::NetAdapter;

/// Handles the PASV FTP command.
///
/// Allocates the next listener from the passive port pool and arms it on
/// the session. A repeated PASV drops the previous listener and allocates a
/// fresh port. The advertised address is the configured public address when
/// set, otherwise the address the client reached the control socket on.
pub fn handle_pasv_command(
    auth: &mut AuthSession,
    net: &mut dyn NetAdapter,
    control_ipv4: Option<[u8; 4]>,
) -> ReplyBuf {
    if matches!(auth.transfer, Transfer::PassiveArmed { .. }) {
        debug!("re-arming passive mode, dropping previous listener");
        auth.transfer = Transfer::None;
    }

    let listener = match net.bind_passive() {
        Ok(listener) => listener,
        Err(e) => {
            warn!("passive listener allocation failed: {}", e);
            return format_reply(425, "Can't open data connection.");
        }
    };
    let ip = match net.advertised_ipv4().or(control_ipv4) {
        Some(ip) => ip,
        None => {
            warn!("no IPv4 address to advertise in PASV reply");
            return format_reply(425, "Can't open data connection.");
        }
    };
    let port = listener.local_port();
    debug!("passive mode armed on {}.{}.{}.{}:{}", ip[0], ip[1], ip[2], ip[3], port);
    auth.transfer = Transfer::PassiveArmed { listener };
    format_pasv(ip, port)
}
