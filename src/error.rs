use thiserror::Error;

/// Failures of the sandboxed path layer. `InvalidPath` is the sole failure
/// mode; everything else a path can cause surfaces as a filesystem error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path")]
    InvalidPath,
}

/// Filesystem adapter errors as surfaced to the protocol layers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("invalid path")]
    InvalidPath,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    Exists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("is a directory")]
    IsDir,
    #[error("rename crosses devices")]
    CrossDevice,
    #[error("host i/o error")]
    Io,
}

impl From<PathError> for FsError {
    fn from(_: PathError) -> Self {
        FsError::InvalidPath
    }
}

impl FsError {
    /// Three-digit reply the FTP state machine answers with when an
    /// operation fails with this error.
    pub fn ftp_reply(&self) -> (u16, &'static str) {
        match self {
            FsError::NotFound => (550, "File or directory not found."),
            FsError::Exists => (550, "Already exists."),
            FsError::NotEmpty => (550, "Directory not empty."),
            FsError::IsDir => (550, "Is a directory."),
            FsError::InvalidPath => (550, "Invalid path."),
            FsError::CrossDevice => (550, "Rename not supported across devices."),
            FsError::Io => (451, "Requested action aborted. Local error in processing."),
        }
    }
}

/// Network adapter conditions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    #[error("operation would block")]
    WouldBlock,
    #[error("peer closed the connection")]
    Closed,
    #[error("socket i/o error")]
    Io,
}

/// Failures bringing a server instance up.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    #[error("network: {0}")]
    Net(#[from] NetError),
    #[error("storage root unavailable")]
    Root,
}

/// HTTP framing failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("malformed request")]
    BadRequest,
    #[error("request line or header block too long")]
    LineTooLong,
    #[error("malformed chunked encoding")]
    BadChunkedEncoding,
    #[error("peer closed mid-frame")]
    UnexpectedEndOfStream,
    #[error("response written out of order")]
    ResponseState,
    #[error(transparent)]
    Net(#[from] NetError),
}

impl HttpError {
    /// Status code for the best-effort error response sent before the
    /// connection is closed. Errors with no meaningful wire form map to 500.
    pub fn status(&self) -> u16 {
        match self {
            HttpError::BadRequest | HttpError::BadChunkedEncoding => 400,
            HttpError::LineTooLong => 431,
            HttpError::UnexpectedEndOfStream | HttpError::Net(_) => 400,
            HttpError::ResponseState => 500,
        }
    }
}
