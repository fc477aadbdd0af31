use crate::transport::Transport;
use crate::TransportError;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use tracing::{debug, trace};

const READ_CHUNK: usize = 1024;

/// Runs commands on this host through `sh -c`, with stdout and stderr
/// attached to a fresh pseudo-terminal. The child leads its own session with
/// that pty as controlling terminal, so tools writing to `/dev/tty` are
/// captured too.
pub struct LocalTransport {
    use_sudo: bool,
    shell: String,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self {
            use_sudo: false,
            shell: "/bin/sh".to_owned(),
        }
    }
}

impl LocalTransport {
    pub fn new(use_sudo: bool) -> Self {
        Self {
            use_sudo,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl Transport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    fn use_sudo(&self) -> bool {
        self.use_sudo
    }

    fn run(&self, line: &str) -> Result<String, TransportError> {
        let (master, slave) = open_pty()?;

        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::from(slave.try_clone()?))
            .stderr(Stdio::from(slave));
        attach_controlling_terminal(&mut command);
        let mut child = command.spawn()?;
        // the builder holds the only parent-side copies of the slave
        drop(command);

        let drained = drain(File::from(master));
        let status = child.wait()?;
        let output = drained?;
        trace!("local command exited with {status}");

        // the pty line discipline turns "\n" into "\r\n"
        let text = String::from_utf8_lossy(&output).replace("\r\n", "\n");
        Ok(text.trim().to_owned())
    }
}

/// Read everything the child writes. A pty master reports `EIO` instead of
/// EOF once every slave descriptor is closed; both mean the stream ended.
fn drain(mut reader: File) -> io::Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                debug!("pty closed by child");
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(output)
}

#[allow(unsafe_code)]
fn open_pty() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut master: libc::c_int = -1;
    let mut slave: libc::c_int = -1;
    // SAFETY: openpty only writes the two descriptors; name, termios and
    // winsize are optional and passed as null.
    let ret = unsafe {
        libc::openpty(
            &raw mut master,
            &raw mut slave,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: openpty succeeded, so both descriptors are open and owned by us.
    let pair = unsafe { (OwnedFd::from_raw_fd(master), OwnedFd::from_raw_fd(slave)) };
    set_cloexec(&pair.0)?;
    set_cloexec(&pair.1)?;
    Ok(pair)
}

/// Make the child a session leader owning the pty on its stdout.
#[allow(unsafe_code)]
fn attach_controlling_terminal(command: &mut Command) {
    // SAFETY: the hook runs in the forked child before exec and only calls
    // the async-signal-safe setsid and ioctl. Stdio is already redirected,
    // so fd 1 is the pty slave.
    unsafe {
        command.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            if libc::ioctl(libc::STDOUT_FILENO, libc::TIOCSCTTY, 0) == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[allow(unsafe_code)]
fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we own; F_SETFD only touches fd flags.
    let ret = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
