use log::{info, warn};

use crate::config::Credentials;
use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::{AuthSession, Session};

/// Handles the PASS FTP command.
///
/// Valid only directly after USER. A wrong password resets the session to
/// the unauthenticated state.
pub fn handle_pass_command(session: &mut Session, creds: &Credentials, arg: &str) -> ReplyBuf {
    match session {
        Session::UserSupplied { .. } => {
            if arg == creds.password {
                info!("login succeeded");
                *session = Session::Authenticated(AuthSession::new());
                format_reply(230, "User logged in, proceed.")
            } else {
                warn!("login failed: bad password");
                *session = Session::Unauth;
                super::not_logged_in()
            }
        }
        Session::Unauth => format_reply(503, "Login with USER first."),
        Session::Authenticated(_) => format_reply(230, "Already logged in."),
    }
}
