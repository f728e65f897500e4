/// Client error code carried when the gateway did not supply one.
pub const CLIENT_ERROR_CODE_NONE: i64 = 0;
/// Client error code the gateway uses to report a timed out call.
pub const CLIENT_ERROR_CODE_TIMEOUT: i64 = 1;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),
    #[error("Client error {0}")]
    Client(ClientError),
    #[error("Encode error {0}")]
    Encode(serde_json::Error),
    #[error("Decode error {0}")]
    Decode(serde_json::Error),
    #[error("Http error {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Client(err) if err.is_timeout())
    }
}

/// Reports whether `err` is a client-level error carrying the timeout code.
pub fn is_timeout_error(err: &Error) -> bool {
    err.is_timeout()
}

/// The response body does not have the documented envelope shape.
#[derive(thiserror::Error, Debug)]
pub enum ProtocolViolation {
    #[error("response body is not a JSON object: {0}")]
    MalformedBody(serde_json::Error),
    #[error("expected a {0} field")]
    MissingField(&'static str),
    #[error("expected {expected} {field} field")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("expected jsonrpc version 2.0, got {0:?}")]
    UnsupportedVersion(String),
    #[error("unexpected error level {0}")]
    UnexpectedErrorLevel(i64),
}

impl ProtocolViolation {
    /// Name of the offending field, when the violation is about one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ProtocolViolation::MissingField(field) => Some(*field),
            ProtocolViolation::WrongType { field, .. } => Some(*field),
            ProtocolViolation::UnsupportedVersion(_) => Some("jsonrpc"),
            ProtocolViolation::UnexpectedErrorLevel(_) => Some("result.error_level"),
            ProtocolViolation::MalformedBody(_) => None,
        }
    }
}

/// Library-level failure reported by the gateway (error level 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub code: i64,
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code == CLIENT_ERROR_CODE_TIMEOUT
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClientError: {{\"code\": {}, \"message\": \"{}\"}}",
            self.code, self.message
        )
    }
}
impl std::error::Error for ClientError {}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        Error::Client(err)
    }
}
