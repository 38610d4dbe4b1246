//! UNIX-ls-style LIST lines and bare NLST lines.

use core::fmt::Write as _;

use chrono::{DateTime, Utc};
use heapless::String as FixedString;

use crate::core_host::fs::DirEntry;

/// A listing line never exceeds the fixed name limit plus the ls prefix.
pub const LINE_MAX: usize = 320;

pub type ListLine = FixedString<LINE_MAX>;

/// Entries younger than roughly six months show `Mmm dd hh:mm`, older ones
/// `Mmm dd  yyyy`, matching classic ls output.
const SIX_MONTHS_SECS: i64 = 180 * 24 * 3600;

pub fn format_list_line(entry: &DirEntry, now_unix: i64) -> ListLine {
    let mut out: ListLine = FixedString::new();
    let kind = if entry.is_dir { 'd' } else { '-' };
    let perms = if entry.is_dir { "rwxr-xr-x" } else { "rw-r--r--" };
    let size = entry.size.unwrap_or(0);
    let _ = write!(out, "{}{}   1 paper paper {:>12} ", kind, perms, size);
    push_timestamp(&mut out, entry.mtime_unix, now_unix);
    let _ = out.push(' ');
    let _ = out.push_str(entry.name.as_str());
    let _ = out.push_str("\r\n");
    out
}

pub fn format_nlst_line(entry: &DirEntry) -> ListLine {
    let mut out: ListLine = FixedString::new();
    let _ = out.push_str(entry.name.as_str());
    let _ = out.push_str("\r\n");
    out
}

fn push_timestamp(out: &mut ListLine, mtime_unix: Option<i64>, now_unix: i64) {
    let mtime = match mtime_unix.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)) {
        Some(t) => t,
        None => {
            let _ = out.push_str("Jan  1  1970");
            return;
        }
    };
    let recent = now_unix > 0 && (now_unix - mtime.timestamp()).abs() < SIX_MONTHS_SECS;
    let formatted = if recent {
        mtime.format("%b %e %H:%M")
    } else {
        mtime.format("%b %e  %Y")
    };
    let _ = write!(out, "{}", formatted);
}
