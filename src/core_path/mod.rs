//! Sandboxed path layer.
//!
//! Maps client-visible virtual paths (absolute, `/`-rooted) onto host paths
//! under the fixed storage root. Normalization clamps `..` at the virtual
//! root instead of failing, which keeps clients that issue redundant CDUP
//! working.

use heapless::String as FixedString;

use crate::constants::{HOST_PATH_MAX, PATH_MAX};
use crate::error::PathError;

/// Normalized virtual path in a fixed buffer. Always starts with `/`,
/// contains no `.`/`..` segments, no `//`, and no trailing slash unless it
/// is exactly `/`.
pub type VPathBuf = FixedString<PATH_MAX>;

/// Host-absolute path in a fixed buffer sized for root + path + NUL. The
/// NUL terminator itself is a host-ABI artifact; the Rust adapters take the
/// string slice.
pub type HostPathBuf = FixedString<HOST_PATH_MAX>;

/// Resolve `user_path` against `cwd` into a normalized virtual path.
///
/// `cwd` must itself be a normalized virtual path (the session owns one and
/// only ever stores normalize() output there). Empty and `.` segments are
/// dropped, `..` pops one segment but never climbs above `/`, and any input
/// containing a NUL byte is rejected.
pub fn normalize(cwd: &str, user_path: &str) -> Result<VPathBuf, PathError> {
    if user_path.as_bytes().contains(&0) || cwd.as_bytes().contains(&0) {
        return Err(PathError::InvalidPath);
    }
    if !cwd.starts_with('/') {
        return Err(PathError::InvalidPath);
    }

    let mut out: VPathBuf = FixedString::new();
    if user_path.starts_with('/') {
        out.push('/').map_err(|_| PathError::InvalidPath)?;
    } else {
        out.push_str(cwd).map_err(|_| PathError::InvalidPath)?;
    }

    for segment in user_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => pop_segment(&mut out),
            seg => {
                if !out.ends_with('/') {
                    out.push('/').map_err(|_| PathError::InvalidPath)?;
                }
                out.push_str(seg).map_err(|_| PathError::InvalidPath)?;
            }
        }
    }

    if out.is_empty() {
        return Err(PathError::InvalidPath);
    }
    Ok(out)
}

/// Drop the last segment of a normalized path, clamping at `/`.
fn pop_segment(path: &mut VPathBuf) {
    if path.as_str() == "/" {
        return;
    }
    match path.rfind('/') {
        Some(0) | None => {
            path.clear();
            // Cannot fail: capacity is at least one byte.
            let _ = path.push('/');
        }
        Some(idx) => path.truncate(idx),
    }
}

/// Prefix a normalized virtual path with the fixed host root. `/` alone
/// maps to the root exactly, with no trailing slash.
pub fn to_host(root: &str, vpath: &str) -> Result<HostPathBuf, PathError> {
    if !vpath.starts_with('/') || vpath.as_bytes().contains(&0) {
        return Err(PathError::InvalidPath);
    }
    let mut out: HostPathBuf = FixedString::new();
    out.push_str(root).map_err(|_| PathError::InvalidPath)?;
    if vpath != "/" {
        out.push_str(vpath).map_err(|_| PathError::InvalidPath)?;
    }
    Ok(out)
}

/// Append a directory entry name to a host directory path.
pub fn join_child(host_dir: &str, name: &str) -> Result<HostPathBuf, PathError> {
    if name.as_bytes().contains(&0) {
        return Err(PathError::InvalidPath);
    }
    let mut out: HostPathBuf = FixedString::new();
    out.push_str(host_dir).map_err(|_| PathError::InvalidPath)?;
    if !host_dir.ends_with('/') {
        out.push('/').map_err(|_| PathError::InvalidPath)?;
    }
    out.push_str(name).map_err(|_| PathError::InvalidPath)?;
    Ok(out)
}
