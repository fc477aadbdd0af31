use crate::command::SUDO;
use crate::transport::Transport;
use crate::TransportError;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Script {
    replies: VecDeque<Reply>,
    delay: Option<Duration>,
}

/// Scripted transport for tests.
///
/// Replies are keyed by program, the first token after an optional `sudo`.
/// A program scripted with several replies hands them out in order and
/// repeats the last one. Unscripted programs print nothing. Every line is
/// recorded.
#[derive(Default)]
pub struct MockTransport {
    use_sudo: bool,
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    #[must_use]
    pub fn respond(self, program: &str, output: &str) -> Self {
        self.respond_sequence(program, &[output])
    }

    #[must_use]
    pub fn respond_sequence(self, program: &str, outputs: &[&str]) -> Self {
        self.script(
            program,
            outputs.iter().map(|o| Reply::Output((*o).to_owned())).collect(),
        )
    }

    /// Make `program` block for `delay` before replying.
    #[must_use]
    pub fn respond_after(self, program: &str, output: &str, delay: Duration) -> Self {
        let this = self.respond(program, output);
        if let Ok(mut scripts) = this.scripts.lock() {
            if let Some(script) = scripts.get_mut(program) {
                script.delay = Some(delay);
            }
        }
        this
    }

    #[must_use]
    pub fn fail(self, program: &str, message: &str) -> Self {
        self.script(program, VecDeque::from([Reply::Fail(message.to_owned())]))
    }

    fn script(self, program: &str, replies: VecDeque<Reply>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(
                program.to_owned(),
                Script {
                    replies,
                    delay: None,
                },
            );
        }
        self
    }

    /// Every line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How many lines invoked `program`.
    pub fn call_count(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|line| program_of(line) == program)
            .count()
    }

    fn next_reply(&self, program: &str) -> Result<(Option<Reply>, Option<Duration>), TransportError> {
        let mut scripts = self
            .scripts
            .lock()
            .map_err(|e| TransportError::Session(format!("mutex poisoned: {e}").into()))?;
        Ok(match scripts.get_mut(program) {
            Some(script) => {
                let reply = if script.replies.len() > 1 {
                    script.replies.pop_front()
                } else {
                    script.replies.front().cloned()
                };
                (reply, script.delay)
            }
            None => (None, None),
        })
    }
}

fn program_of(line: &str) -> &str {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some(SUDO) => tokens.next().unwrap_or(""),
        Some(first) => first,
        None => "",
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn use_sudo(&self) -> bool {
        self.use_sudo
    }

    fn run(&self, line: &str) -> Result<String, TransportError> {
        self.calls
            .lock()
            .map_err(|e| TransportError::Session(format!("mutex poisoned: {e}").into()))?
            .push(line.to_owned());

        let (reply, delay) = self.next_reply(program_of(line))?;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        match reply {
            Some(Reply::Output(text)) => Ok(text.trim().to_owned()),
            Some(Reply::Fail(message)) => Err(TransportError::Session(message.into())),
            None => Ok(String::new()),
        }
    }
}
