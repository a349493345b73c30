use transport::ClientError;

/// Failures talking to the debugger backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Transport(#[from] ClientError),

    #[error("backend sent no body for {0} request")]
    MissingBody(&'static str),
}

/// Errors returned by [`crate::Controller`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A command is in flight.
    #[error("a command is already running")]
    SessionBusy,

    /// The debuggee has exited. Permanent for the controller's lifetime.
    #[error("the debuggee has quit")]
    SessionTerminated,

    /// Nothing to run: the input was blank and no previous command exists.
    #[error("no command to run")]
    EmptyCommand,

    #[error("breakpoint request at {filename}:{line} failed: {reason}")]
    BreakpointRequestFailed {
        filename: String,
        line: usize,
        reason: String,
    },

    #[error("configuration of breakpoint {name} was rejected")]
    ConfigRejected { name: String },

    #[error("unknown breakpoint {0}")]
    UnknownBreakpoint(String),

    #[error("running {command:?}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: BackendError,
    },

    #[error("listing {filename}:{line}: {source}")]
    ListingFailed {
        filename: String,
        line: usize,
        #[source]
        source: BackendError,
    },
}

impl SessionError {
    /// Whether the error was raised by the session gate before any backend call.
    pub fn is_session_state(&self) -> bool {
        matches!(self, SessionError::SessionBusy | SessionError::SessionTerminated)
    }
}
