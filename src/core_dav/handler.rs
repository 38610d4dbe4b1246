//! Filesystem-backed WebDAV method handler.
//!
//! Every method validates and opens its handles here; the byte-moving
//! methods hand the opened handles back to the engine as a `BodyTransfer`
//! so the streaming happens one chunk per tick.

use log::{debug, info};

use crate::core_host::fs::{FileRead, FileWrite};
use crate::core_http::exchange::Exchange;
use crate::core_http::request::{decode_path, Method};
use crate::core_http::response::BodyFraming;
use crate::core_http::transfer::{BodyTransfer, CopyStream, GetStream, PutSink};
use crate::core_path::{normalize, VPathBuf};
use crate::core_storage::SandboxFs;
use crate::error::{FsError, HttpError};

use super::{DavHandler, Dispatch};

const ALLOW: &str = "OPTIONS, GET, HEAD, PUT, DELETE, MKCOL, COPY, MOVE, PROPFIND, PROPPATCH";
const OCTET_STREAM: &str = "application/octet-stream";

pub struct FsDavHandler;

impl FsDavHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FsDavHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DavHandler for FsDavHandler {
    fn handle(
        &mut self,
        fs: &SandboxFs<'_>,
        ex: &mut Exchange<'_>,
    ) -> Result<Dispatch, HttpError> {
        let path = match normalize("/", ex.path()) {
            Ok(path) => path,
            Err(_) => return respond_done(ex, 400),
        };
        match ex.method() {
            Method::Options => {
                ex.respond_empty(
                    200,
                    &[("DAV", "1"), ("Allow", ALLOW), ("MS-Author-Via", "DAV")],
                )?;
                Ok(Dispatch::Done)
            }
            Method::Get | Method::Head => get(fs, ex, &path),
            Method::Put => put(fs, ex, &path),
            Method::Delete => delete(fs, ex, &path),
            Method::Mkcol => mkcol(fs, ex, &path),
            Method::Copy => copy(fs, ex, &path),
            Method::Move => rename(fs, ex, &path),
            Method::Propfind | Method::Proppatch | Method::Other => respond_done(ex, 501),
        }
    }
}

fn get(fs: &SandboxFs<'_>, ex: &mut Exchange<'_>, path: &VPathBuf) -> Result<Dispatch, HttpError> {
    let stat = match fs.stat(path.as_str()) {
        Ok(stat) => stat,
        Err(e) => return respond_done(ex, status_for(e)),
    };
    if stat.is_dir {
        // Collection contents are the property layer's business.
        return respond_done(ex, 403);
    }
    let reader = match fs.open_read(path.as_str()) {
        Ok(reader) => reader,
        Err(e) => return respond_done(ex, status_for(e)),
    };

    ex.write_head(
        200,
        &[("Content-Type", OCTET_STREAM)],
        BodyFraming::Length(stat.size),
    )?;
    if ex.method() == Method::Head {
        ex.finish()?;
        return Ok(Dispatch::Done);
    }
    Ok(Dispatch::Transfer(BodyTransfer::Get(GetStream {
        reader,
        remaining: stat.size,
    })))
}

fn put(fs: &SandboxFs<'_>, ex: &mut Exchange<'_>, path: &VPathBuf) -> Result<Dispatch, HttpError> {
    let existed = fs.stat(path.as_str()).is_ok();
    let writer = match fs.open_write_trunc(path.as_str()) {
        Ok(writer) => writer,
        Err(e) => return respond_done(ex, put_status_for(e)),
    };
    info!("PUT {}", path);
    Ok(Dispatch::Transfer(BodyTransfer::Put(PutSink {
        writer,
        status: if existed { 204 } else { 201 },
    })))
}

fn delete(
    fs: &SandboxFs<'_>,
    ex: &mut Exchange<'_>,
    path: &VPathBuf,
) -> Result<Dispatch, HttpError> {
    let stat = match fs.stat(path.as_str()) {
        Ok(stat) => stat,
        Err(e) => return respond_done(ex, status_for(e)),
    };
    let result = if stat.is_dir {
        fs.remove_dir(path.as_str())
    } else {
        fs.delete(path.as_str())
    };
    match result {
        Ok(()) => {
            info!("DELETE {}", path);
            respond_done(ex, 204)
        }
        Err(e) => respond_done(ex, status_for(e)),
    }
}

fn mkcol(
    fs: &SandboxFs<'_>,
    ex: &mut Exchange<'_>,
    path: &VPathBuf,
) -> Result<Dispatch, HttpError> {
    // MKCOL request bodies are format-specific and unsupported.
    let mut probe = [0u8; 1];
    if ex.read_body(&mut probe)? != 0 {
        return respond_done(ex, 415);
    }
    match fs.make_dir(path.as_str()) {
        Ok(()) => {
            info!("MKCOL {}", path);
            respond_done(ex, 201)
        }
        Err(FsError::Exists) => respond_done(ex, 405),
        Err(FsError::NotFound) => respond_done(ex, 409),
        Err(e) => respond_done(ex, status_for(e)),
    }
}

fn copy(fs: &SandboxFs<'_>, ex: &mut Exchange<'_>, path: &VPathBuf) -> Result<Dispatch, HttpError> {
    let (dest, overwrite) = match destination(ex) {
        Some(parts) => parts,
        None => return respond_done(ex, 400),
    };
    let stat = match fs.stat(path.as_str()) {
        Ok(stat) => stat,
        Err(e) => return respond_done(ex, status_for(e)),
    };
    if stat.is_dir {
        // Depth-infinity collection copies are not supported.
        return respond_done(ex, 403);
    }
    let dest_existed = fs.stat(dest.as_str()).is_ok();
    if dest_existed && !overwrite {
        return respond_done(ex, 412);
    }
    let (reader, writer) = match open_copy_pair(fs, path, &dest) {
        Ok(pair) => pair,
        Err(e) => return respond_done(ex, status_for(e)),
    };
    info!("COPY {} -> {}", path, dest);
    Ok(Dispatch::Transfer(BodyTransfer::Copy(CopyStream {
        reader,
        writer,
        status: if dest_existed { 204 } else { 201 },
        delete_source: None,
    })))
}

fn rename(
    fs: &SandboxFs<'_>,
    ex: &mut Exchange<'_>,
    path: &VPathBuf,
) -> Result<Dispatch, HttpError> {
    let (dest, overwrite) = match destination(ex) {
        Some(parts) => parts,
        None => return respond_done(ex, 400),
    };
    let stat = match fs.stat(path.as_str()) {
        Ok(stat) => stat,
        Err(e) => return respond_done(ex, status_for(e)),
    };
    let dest_existed = fs.stat(dest.as_str()).is_ok();
    if dest_existed && !overwrite {
        return respond_done(ex, 412);
    }

    match fs.rename(path.as_str(), dest.as_str()) {
        Ok(()) => {
            info!("MOVE {} -> {}", path, dest);
            respond_done(ex, if dest_existed { 204 } else { 201 })
        }
        Err(FsError::CrossDevice) if !stat.is_dir => {
            // The engine never falls back on its own; the handler does,
            // for plain files. The copy streams tick by tick and the
            // source is removed once the last chunk lands.
            debug!("MOVE falling back to copy+delete for {}", path);
            let (reader, writer) = match open_copy_pair(fs, path, &dest) {
                Ok(pair) => pair,
                Err(e) => return respond_done(ex, status_for(e)),
            };
            Ok(Dispatch::Transfer(BodyTransfer::Copy(CopyStream {
                reader,
                writer,
                status: if dest_existed { 204 } else { 201 },
                delete_source: Some(path.clone()),
            })))
        }
        Err(e) => respond_done(ex, status_for(e)),
    }
}

fn open_copy_pair(
    fs: &SandboxFs<'_>,
    from: &VPathBuf,
    to: &VPathBuf,
) -> Result<(Box<dyn FileRead>, Box<dyn FileWrite>), FsError> {
    let reader = fs.open_read(from.as_str())?;
    let writer = fs.open_write_trunc(to.as_str())?;
    Ok((reader, writer))
}

fn respond_done(ex: &mut Exchange<'_>, status: u16) -> Result<Dispatch, HttpError> {
    ex.respond_empty(status, &[])?;
    Ok(Dispatch::Done)
}

/// Parse the `Destination` header into a normalized virtual path, plus the
/// `Overwrite` flag (default true).
fn destination(ex: &Exchange<'_>) -> Option<(VPathBuf, bool)> {
    let raw = ex.header("destination")?;
    let path_part = if raw.starts_with('/') {
        raw
    } else {
        // absolute-URI form: strip scheme://authority.
        let after_scheme = raw.split_once("://")?.1;
        match after_scheme.find('/') {
            Some(idx) => &after_scheme[idx..],
            None => "/",
        }
    };
    let decoded = decode_path(path_part).ok()?;
    let normalized = normalize("/", decoded.as_str()).ok()?;
    let overwrite = match ex.header("overwrite") {
        Some(value) => !value.trim().eq_ignore_ascii_case("F"),
        None => true,
    };
    Some((normalized, overwrite))
}

fn status_for(e: FsError) -> u16 {
    match e {
        FsError::NotFound => 404,
        FsError::Exists => 405,
        FsError::NotEmpty | FsError::IsDir => 409,
        FsError::InvalidPath => 400,
        FsError::CrossDevice => 502,
        FsError::Io => 500,
    }
}

/// PUT maps a missing parent collection to 409 per the WebDAV rules.
fn put_status_for(e: FsError) -> u16 {
    match e {
        FsError::NotFound => 409,
        FsError::IsDir => 409,
        other => status_for(other),
    }
}
