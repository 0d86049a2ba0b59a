use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Missing or conflicting inputs, missing `firebase.json`, bad entry point.
    Configuration(String),
    /// The deploy tool exited unsuccessfully, including after the verbose retry.
    ProcessExecution(String),
    /// The tool's output was not a well-formed result document.
    PayloadParse(String),
    /// The tool ran but reported `status: "error"`; carries the tool's own message.
    Deployment(String),
    IoError(std::io::Error),
}

impl Error {
    /// The bare message, without the kind prefix `Display` adds.
    ///
    /// Failure reports surface this text so users see the originating error.
    pub fn message(&self) -> String {
        match self {
            Error::Configuration(msg)
            | Error::ProcessExecution(msg)
            | Error::PayloadParse(msg)
            | Error::Deployment(msg) => msg.clone(),
            Error::IoError(err) => err.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::ProcessExecution(msg) => write!(f, "Deploy process failed: {}", msg),
            Error::PayloadParse(msg) => write!(f, "Could not parse deploy output: {}", msg),
            Error::Deployment(msg) => write!(f, "Deployment error: {}", msg),
            Error::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PayloadParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
