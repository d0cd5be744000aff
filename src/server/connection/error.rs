/// Connection error types.
///
/// Every variant ends the session it occurred on. They are kept apart only so
/// the debug log says what happened.
#[derive(Debug)]
pub enum ConnectionError {
    /// Reading from the client failed.
    Io(std::io::Error),
    /// The writer task could not deliver to the client and has stopped.
    WriteFailed,
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Io(e) => write!(f, "I/O error: {}", e),
            ConnectionError::WriteFailed => write!(f, "connection lost while writing"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Io(e) => Some(e),
            ConnectionError::WriteFailed => None,
        }
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(e: std::io::Error) -> Self {
        ConnectionError::Io(e)
    }
}
