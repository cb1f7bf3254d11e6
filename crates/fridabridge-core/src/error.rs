//! Shared error type across fridabridge crates, plus the native error translator.

use thiserror::Error;

/// Error domain the instrumentation engine uses for its own failures.
pub const ENGINE_ERROR_DOMAIN: &str = "frida-error-quark";

/// GIO error domain; the engine surfaces some I/O failures through it.
pub const GIO_ERROR_DOMAIN: &str = "g-io-error-quark";

/// Structured error exactly as reported by a blocking native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub domain: String,
    pub code: i32,
    pub message: String,
}

impl NativeError {
    pub fn new(domain: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }

    /// Error raised in the engine's own domain.
    pub fn engine(code: i32, message: impl Into<String>) -> Self {
        Self::new(ENGINE_ERROR_DOMAIN, code, message)
    }
}

/// Fixed classification of failures (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoDevice,
    AddressInUse,
    ExecutableNotFound,
    ExecutableNotSupported,
    InvalidArgument,
    InvalidOperation,
    NotSupported,
    PermissionDenied,
    ProcessNotFound,
    ProcessNotResponding,
    ProtocolError,
    ServerNotRunning,
    TimedOut,
    TransportError,
    Unknown,
}

impl ErrorKind {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NoDevice => "NO_DEVICE",
            ErrorKind::AddressInUse => "ADDRESS_IN_USE",
            ErrorKind::ExecutableNotFound => "EXECUTABLE_NOT_FOUND",
            ErrorKind::ExecutableNotSupported => "EXECUTABLE_NOT_SUPPORTED",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::InvalidOperation => "INVALID_OPERATION",
            ErrorKind::NotSupported => "NOT_SUPPORTED",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::ProcessNotFound => "PROCESS_NOT_FOUND",
            ErrorKind::ProcessNotResponding => "PROCESS_NOT_RESPONDING",
            ErrorKind::ProtocolError => "PROTOCOL_ERROR",
            ErrorKind::ServerNotRunning => "SERVER_NOT_RUNNING",
            ErrorKind::TimedOut => "TIMED_OUT",
            ErrorKind::TransportError => "TRANSPORT_ERROR",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }

    /// Classify a native error by domain and code.
    pub fn classify(err: &NativeError) -> Self {
        match err.domain.as_str() {
            ENGINE_ERROR_DOMAIN => match err.code {
                0 => ErrorKind::ServerNotRunning,
                1 => ErrorKind::ExecutableNotFound,
                2 => ErrorKind::ExecutableNotSupported,
                3 => ErrorKind::ProcessNotFound,
                4 => ErrorKind::ProcessNotResponding,
                5 => ErrorKind::InvalidArgument,
                6 => ErrorKind::InvalidOperation,
                7 => ErrorKind::PermissionDenied,
                8 => ErrorKind::AddressInUse,
                9 => ErrorKind::TimedOut,
                10 => ErrorKind::NotSupported,
                11 => ErrorKind::ProtocolError,
                12 => ErrorKind::TransportError,
                _ => ErrorKind::Unknown,
            },
            GIO_ERROR_DOMAIN => match err.code {
                13 => ErrorKind::InvalidArgument,
                14 => ErrorKind::PermissionDenied,
                15 => ErrorKind::NotSupported,
                24 => ErrorKind::TimedOut,
                _ => ErrorKind::Unknown,
            },
            _ => ErrorKind::Unknown,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by core and host.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Translated failure of a blocking native call.
    #[error("{message}")]
    Native {
        kind: ErrorKind,
        code: i32,
        message: String,
    },
    #[error("no device")]
    NoDevice,
    /// Operation attempted on a handle whose native resource was released.
    #[error("use of released {0} handle")]
    Released(&'static str),
    #[error("script not loaded")]
    NotLoaded,
    #[error("{entity}: signal unsupported: {signal}")]
    UnsupportedSignal {
        entity: &'static str,
        signal: String,
    },
    #[error("correlation key already registered: {0}")]
    DuplicateKey(String),
    #[error("rpc call timeout ({method}, {after_ms}ms)")]
    Timeout { method: String, after_ms: u64 },
    /// Remote side answered an RPC call with an error outcome.
    #[error("{0}")]
    Rpc(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Translate a native error into a typed host error.
    ///
    /// Every translated error is logged once, here.
    pub fn from_native(err: NativeError) -> Self {
        let kind = ErrorKind::classify(&err);
        tracing::error!(
            domain = %err.domain,
            code = err.code,
            kind = kind.as_str(),
            "{}",
            err.message
        );
        BridgeError::Native {
            kind,
            code: err.code,
            message: err.message,
        }
    }

    /// Build a host-side error and log it, mirroring the native path.
    pub fn logged(self) -> Self {
        tracing::error!(kind = self.kind().as_str(), "{self}");
        self
    }

    /// Map to the stable classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Native { kind, .. } => *kind,
            BridgeError::NoDevice => ErrorKind::NoDevice,
            BridgeError::Released(_) | BridgeError::NotLoaded => ErrorKind::InvalidOperation,
            BridgeError::UnsupportedSignal { .. } | BridgeError::UnsupportedVersion => {
                ErrorKind::NotSupported
            }
            BridgeError::DuplicateKey(_) | BridgeError::BadRequest(_) => {
                ErrorKind::InvalidArgument
            }
            BridgeError::Timeout { .. } => ErrorKind::TimedOut,
            BridgeError::Protocol(_) => ErrorKind::ProtocolError,
            BridgeError::Rpc(_) | BridgeError::Internal(_) => ErrorKind::Unknown,
        }
    }

    /// Native code when the error came from the engine.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            BridgeError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Translate an optional native error: absence stays absence.
pub fn translate(err: Option<NativeError>) -> Option<BridgeError> {
    err.map(BridgeError::from_native)
}

/// Translate the error side of a native call result.
pub fn check<T>(res: std::result::Result<T, NativeError>) -> Result<T> {
    res.map_err(BridgeError::from_native)
}
