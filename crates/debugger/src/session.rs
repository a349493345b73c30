//! Session state.

use crate::error::SessionError;

/// Lifecycle of the single debugging session.
///
/// `Terminated` is absorbing: once the backend reports that the debuggee
/// quit, no further commands or breakpoint edits are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Terminated,
}

impl SessionState {
    pub fn is_running(self) -> bool {
        self == SessionState::Running
    }

    /// Fails unless a new command or breakpoint operation may start.
    pub fn ensure_idle(self) -> Result<(), SessionError> {
        match self {
            SessionState::Idle => Ok(()),
            SessionState::Running => Err(SessionError::SessionBusy),
            SessionState::Terminated => Err(SessionError::SessionTerminated),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    state: SessionState,
    last_command: String,
}

impl Session {
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn last_command(&self) -> &str {
        &self.last_command
    }

    /// Resolve `candidate` into the command to run and mark the session running.
    ///
    /// A blank candidate falls back to the last command.
    pub(crate) fn begin(&mut self, candidate: &str) -> Result<String, SessionError> {
        self.state.ensure_idle()?;

        let command = if candidate.is_empty() {
            self.last_command.clone()
        } else {
            candidate.to_string()
        };
        if command.is_empty() {
            return Err(SessionError::EmptyCommand);
        }

        self.last_command.clone_from(&command);
        self.state = SessionState::Running;
        tracing::debug!(%command, "session running");
        Ok(command)
    }

    pub(crate) fn terminate(&mut self) {
        if self.state != SessionState::Terminated {
            tracing::debug!("session terminated");
        }
        self.state = SessionState::Terminated;
    }

    /// End the running command. Returns `true` if the session went back to idle.
    pub(crate) fn finish(&mut self) -> bool {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Idle;
                tracing::debug!("session idle");
                true
            }
            SessionState::Idle | SessionState::Terminated => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_records_command() {
        let mut session = Session::default();

        let command = session.begin("next").unwrap();

        assert_eq!(command, "next");
        assert_eq!(session.last_command(), "next");
        assert!(session.state().is_running());
    }

    #[test]
    fn blank_input_falls_back_to_last_command() {
        let mut session = Session::default();
        session.begin("next").unwrap();
        assert!(session.finish());

        assert_eq!(session.begin("").unwrap(), "next");
    }

    #[test]
    fn blank_input_without_history_is_empty() {
        let mut session = Session::default();

        assert!(matches!(session.begin(""), Err(SessionError::EmptyCommand)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn busy_session_keeps_last_command() {
        let mut session = Session::default();
        session.begin("continue").unwrap();

        assert!(matches!(session.begin("next"), Err(SessionError::SessionBusy)));
        assert_eq!(session.last_command(), "continue");
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut session = Session::default();
        session.begin("continue").unwrap();
        session.terminate();

        assert!(!session.finish());
        assert!(matches!(
            session.begin("restart"),
            Err(SessionError::SessionTerminated)
        ));
        assert!(matches!(session.begin(""), Err(SessionError::SessionTerminated)));
    }
}
