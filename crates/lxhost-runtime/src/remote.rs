use crate::transport::Transport;
use crate::{SessionError, TransportError};
use std::sync::Arc;
use tracing::trace;

/// Output of a session call that also reports the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub output: String,
    pub exit_status: Option<i32>,
}

/// An already-authenticated connection to another host, owned by the caller.
///
/// Sessions come in two calling conventions. A *captured* session returns
/// output together with the exit status; a *plain* session returns only the
/// output text. Implement whichever one the underlying client offers; the
/// other keeps its default of `None`, meaning "not supported".
pub trait RemoteSession: Send + Sync {
    fn exec_captured(&self, _line: &str) -> Option<Result<SessionOutput, SessionError>> {
        None
    }

    fn exec_plain(&self, _line: &str) -> Option<Result<String, SessionError>> {
        None
    }

    /// Short label for logs and error messages.
    fn describe(&self) -> String {
        "remote session".to_owned()
    }
}

/// Runs commands through a [`RemoteSession`]. The session is shared, not
/// owned: it outlives any number of calls and is closed by the caller.
pub struct RemoteTransport {
    session: Arc<dyn RemoteSession>,
    use_sudo: bool,
}

impl RemoteTransport {
    pub fn new(session: Arc<dyn RemoteSession>, use_sudo: bool) -> Self {
        Self { session, use_sudo }
    }

    pub fn session(&self) -> &Arc<dyn RemoteSession> {
        &self.session
    }
}

impl Transport for RemoteTransport {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn use_sudo(&self) -> bool {
        self.use_sudo
    }

    fn run(&self, line: &str) -> Result<String, TransportError> {
        if let Some(result) = self.session.exec_captured(line) {
            let captured = result.map_err(TransportError::Session)?;
            // exit status is not interpreted
            trace!("remote exit status: {:?}", captured.exit_status);
            return Ok(captured.output.trim().to_owned());
        }
        if let Some(result) = self.session.exec_plain(line) {
            let output = result.map_err(TransportError::Session)?;
            return Ok(output.trim().to_owned());
        }
        Err(TransportError::UnsupportedSession(self.session.describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturedSession {
        seen: Mutex<Vec<String>>,
    }

    impl RemoteSession for CapturedSession {
        fn exec_captured(&self, line: &str) -> Option<Result<SessionOutput, SessionError>> {
            self.seen.lock().unwrap().push(line.to_owned());
            Some(Ok(SessionOutput {
                output: "\nstate:   RUNNING\n\n".to_owned(),
                exit_status: Some(0),
            }))
        }

        fn exec_plain(&self, _line: &str) -> Option<Result<String, SessionError>> {
            panic!("captured convention must win");
        }
    }

    struct PlainSession;

    impl RemoteSession for PlainSession {
        fn exec_plain(&self, line: &str) -> Option<Result<String, SessionError>> {
            Some(Ok(format!("  ran: {line}  ")))
        }
    }

    struct BrokenSession;

    impl RemoteSession for BrokenSession {
        fn exec_plain(&self, _line: &str) -> Option<Result<String, SessionError>> {
            Some(Err("connection reset".into()))
        }
    }

    struct InertSession;

    impl RemoteSession for InertSession {
        fn describe(&self) -> String {
            "inert@host".to_owned()
        }
    }

    #[test]
    fn captured_convention_is_preferred() {
        let session = Arc::new(CapturedSession::default());
        let transport = RemoteTransport::new(session.clone(), true);
        let out = transport
            .exec(&Command::new("lxc-info").args(["-n", "web", "--state"]))
            .unwrap();
        assert_eq!(out, "state:   RUNNING");
        assert_eq!(
            *session.seen.lock().unwrap(),
            vec!["sudo lxc-info -n web --state".to_owned()]
        );
    }

    #[test]
    fn plain_convention_is_used_as_fallback() {
        let transport = RemoteTransport::new(Arc::new(PlainSession), false);
        let out = transport.exec(&Command::new("lxc-ls").arg("-1")).unwrap();
        assert_eq!(out, "ran: lxc-ls -1");
    }

    #[test]
    fn session_errors_are_wrapped() {
        let transport = RemoteTransport::new(Arc::new(BrokenSession), false);
        let err = transport.run("lxc-ls").unwrap_err();
        assert!(matches!(err, TransportError::Session(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn session_without_a_convention_is_rejected() {
        let transport = RemoteTransport::new(Arc::new(InertSession), false);
        let err = transport.run("lxc-ls").unwrap_err();
        match err {
            TransportError::UnsupportedSession(label) => assert_eq!(label, "inert@host"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
