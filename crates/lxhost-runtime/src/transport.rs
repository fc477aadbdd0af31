use crate::command::{shell_quote, Command, SUDO};
use crate::local::LocalTransport;
use crate::mock::MockTransport;
use crate::remote::{RemoteSession, RemoteTransport};
use crate::TransportError;
use std::sync::Arc;
use tracing::debug;

/// Delimiter closing the here-document used by [`Transport::write_file`].
/// Content that contains it on a line of its own gets a numbered variant.
pub const HEREDOC_DELIMITER: &str = "LXHOST_EOF";

/// First of `LXHOST_EOF`, `LXHOST_EOF_1`, `LXHOST_EOF_2`, ... that no line
/// of `content` equals.
pub fn heredoc_delimiter(content: &str) -> String {
    let taken = |candidate: &str| content.lines().any(|line| line == candidate);
    if !taken(HEREDOC_DELIMITER) {
        return HEREDOC_DELIMITER.to_owned();
    }
    (1u64..)
        .map(|n| format!("{HEREDOC_DELIMITER}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_default()
}

/// Runs command lines somewhere and hands back what they printed.
///
/// Implementations only capture output; whatever the command changed on the
/// target is invisible to them. Non-zero exit statuses are not errors.
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Whether commands are prefixed with `sudo`.
    fn use_sudo(&self) -> bool;

    /// Run an already rendered shell line, returning trimmed output.
    fn run(&self, line: &str) -> Result<String, TransportError>;

    fn exec(&self, command: &Command) -> Result<String, TransportError> {
        let line = command.render(self.use_sudo());
        debug!("[{}] {line}", self.name());
        self.run(&line)
    }

    /// Write `content` to a file on the target, then apply ownership and
    /// mode. The write is a plain `tee` pipeline, not an atomic replace.
    fn write_file(&self, write: &FileWrite) -> Result<String, TransportError> {
        let tee = if self.use_sudo() {
            format!("{SUDO} tee")
        } else {
            "tee".to_owned()
        };
        let delimiter = heredoc_delimiter(&write.content);
        let path = shell_quote(&write.path);
        let script = format!(
            "cat <<'{delimiter}' | {tee} {path}\n{content}\n{delimiter}",
            content = write.content,
        );
        debug!(
            "[{}] writing {} bytes to {}",
            self.name(),
            write.content.len(),
            write.path
        );

        let mut outputs = vec![self.run(&script)?];
        if let Some(owner) = &write.chown {
            outputs.push(self.exec(
                &Command::new("chown").args(["-v", &*shell_quote(owner), &*path]),
            )?);
        }
        if let Some(mode) = &write.chmod {
            outputs.push(self.exec(
                &Command::new("chmod").args(["-v", &*shell_quote(mode), &*path]),
            )?);
        }
        outputs.retain(|o| !o.is_empty());
        Ok(outputs.join("\n"))
    }
}

/// A file to render on the target host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub content: String,
    /// `user:group` applied with `chown -v`.
    pub chown: Option<String>,
    /// Octal mode applied with `chmod -v`.
    pub chmod: Option<String>,
}

impl FileWrite {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            chown: None,
            chmod: None,
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: &str) -> Self {
        self.chown = Some(owner.to_owned());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: &str) -> Self {
        self.chmod = Some(mode.to_owned());
        self
    }
}

/// Build a transport by kind name: `local`, `remote` or `mock`.
pub fn select_transport(
    kind: &str,
    session: Option<Arc<dyn RemoteSession>>,
    use_sudo: bool,
) -> Result<Arc<dyn Transport>, TransportError> {
    match kind {
        "local" => Ok(Arc::new(LocalTransport::new(use_sudo))),
        "remote" => {
            let session = session.ok_or(TransportError::NoSession)?;
            Ok(Arc::new(RemoteTransport::new(session, use_sudo)))
        }
        "mock" => Ok(Arc::new(MockTransport::new().with_sudo(use_sudo))),
        other => Err(TransportError::UnknownKind(other.to_owned())),
    }
}
