use std::{fmt, io};

/// Errors that can occur when working with a random-access file.
#[derive(Debug, Clone, PartialEq)]
pub enum RandomAccessError {
    /// The caller passed an argument outside its domain (e.g. a negative position).
    InvalidArgument(String),
    /// The file did not exist at open time.
    FileNotFound(String),
    /// Any other failure reported by the underlying channel.
    InputOutput(String),
    /// A whole-remainder read was attempted while already at the end of file.
    EndOfFile,
}

impl RandomAccessError {
    /// Classifies a failure that happened while opening `path`.
    pub(crate) fn from_open(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => RandomAccessError::FileNotFound(path.to_string()),
            _ => RandomAccessError::InputOutput(format!("{path}: {err}")),
        }
    }

    pub(crate) fn not_open() -> Self {
        RandomAccessError::InputOutput("file is not open".to_string())
    }
}

impl fmt::Display for RandomAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandomAccessError::InvalidArgument(msg) => {
                write!(f, "Invalid argument: {msg}")
            }
            RandomAccessError::FileNotFound(path) => {
                write!(f, "File not found: {path}")
            }
            RandomAccessError::InputOutput(msg) => {
                write!(f, "I/O error: {msg}")
            }
            RandomAccessError::EndOfFile => {
                write!(f, "End of file reached")
            }
        }
    }
}

impl std::error::Error for RandomAccessError {}

impl From<io::Error> for RandomAccessError {
    fn from(err: io::Error) -> Self { RandomAccessError::InputOutput(err.to_string()) }
}
