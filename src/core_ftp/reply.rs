//! Control-channel reply formatting and the PASV address tuple.

use core::fmt::Write as _;

use heapless::String as FixedString;

use crate::constants::REPLY_BUF;

pub type ReplyBuf = FixedString<REPLY_BUF>;

/// Format a single-line `NNN text\r\n` reply into a fixed buffer. Text that
/// would overflow the buffer is truncated at the last boundary that still
/// leaves room for the CRLF.
pub fn format_reply(code: u16, text: &str) -> ReplyBuf {
    let mut out: ReplyBuf = FixedString::new();
    if write!(out, "{} ", code).is_err() {
        out.clear();
    }
    for ch in text.chars() {
        let mut probe = [0u8; 4];
        let encoded = ch.encode_utf8(&mut probe);
        if out.len() + encoded.len() + 2 > REPLY_BUF {
            break;
        }
        let _ = out.push(ch);
    }
    let _ = out.push_str("\r\n");
    out
}

/// `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` with
/// `port = p1*256 + p2`.
pub fn format_pasv(ip: [u8; 4], port: u16) -> ReplyBuf {
    let mut text: FixedString<96> = FixedString::new();
    let _ = write!(
        text,
        "Entering Passive Mode ({},{},{},{},{},{})",
        ip[0],
        ip[1],
        ip[2],
        ip[3],
        port / 256,
        port % 256
    );
    format_reply(227, text.as_str())
}

/// Parse the `(h1,h2,h3,h4,p1,p2)` tuple out of a PASV reply line. Used by
/// tests and kept next to the formatter so the two stay inverses.
pub fn parse_pasv(reply: &str) -> Option<([u8; 4], u16)> {
    let open = reply.find('(')?;
    let close = reply[open..].find(')')? + open;
    let mut fields = reply[open + 1..close].split(',');
    let mut next = || -> Option<u16> { fields.next()?.trim().parse().ok() };
    let h1 = next()?;
    let h2 = next()?;
    let h3 = next()?;
    let h4 = next()?;
    let p1 = next()?;
    let p2 = next()?;
    if h1 > 255 || h2 > 255 || h3 > 255 || h4 > 255 || p1 > 255 || p2 > 255 {
        return None;
    }
    Some(([h1 as u8, h2 as u8, h3 as u8, h4 as u8], p1 * 256 + p2))
}
