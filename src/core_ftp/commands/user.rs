use heapless::String as FixedString;
use log::{info, warn};

use crate::config::Credentials;
use crate::core_ftp::reply::{format_reply, ReplyBuf};
use crate::core_ftp::session::Session;

/// Handles the USER FTP command.
///
/// A matching user name moves the session to the password phase; anything
/// else answers 530 and leaves the session unauthenticated. Issuing USER
/// again restarts authentication and discards any prior session state.
pub fn handle_user_command(session: &mut Session, creds: &Credentials, arg: &str) -> ReplyBuf {
    if arg.is_empty() {
        return super::syntax_error();
    }
    if arg != creds.user {
        warn!("rejected USER {:?}", arg);
        *session = Session::Unauth;
        return super::not_logged_in();
    }
    let mut user = FixedString::new();
    if user.push_str(arg).is_err() {
        return super::syntax_error();
    }
    info!("USER {} accepted, awaiting password", arg);
    *session = Session::UserSupplied { user };
    format_reply(331, "User name okay, need password.")
}
