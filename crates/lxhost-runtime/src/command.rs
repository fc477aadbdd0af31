use std::borrow::Cow;
use std::fmt;

/// Token that escalates privileges when prepended to a command line.
pub const SUDO: &str = "sudo";

/// One shell invocation as an ordered list of tokens.
///
/// Built by value (`Command::new("lxc-info").arg("-n").arg(name)`) and never
/// mutated afterwards. Tokens are joined with single spaces for transmission;
/// empty tokens are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    /// The line sent to the shell, with `sudo` in front when `sudo` is set.
    pub fn render(&self, sudo: bool) -> String {
        let prefix = sudo.then_some(SUDO);
        prefix
            .into_iter()
            .chain(self.tokens())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote `token` for a POSIX shell. Tokens made only of characters the
/// shell treats literally come back unchanged.
pub fn shell_quote(token: &str) -> Cow<'_, str> {
    let literal = |c: char| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c);
    if !token.is_empty() && token.chars().all(literal) {
        Cow::Borrowed(token)
    } else {
        Cow::Owned(format!("'{}'", token.replace('\'', r"'\''")))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_join_with_single_spaces() {
        let cmd = Command::new("lxc-info").args(["-n", "web", "--state"]);
        assert_eq!(cmd.render(false), "lxc-info -n web --state");
    }

    #[test]
    fn sudo_is_prepended() {
        let cmd = Command::new("lxc-ls").arg("-1");
        assert_eq!(cmd.render(true), "sudo lxc-ls -1");
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let cmd = Command::new("lxc-stop").arg("").arg("-n").arg("db");
        assert_eq!(cmd.render(false), "lxc-stop -n db");
    }

    #[test]
    fn plain_paths_are_not_quoted() {
        assert_eq!(shell_quote("/etc/lxc/web"), "/etc/lxc/web");
        assert_eq!(shell_quote("root:root"), "root:root");
    }

    #[test]
    fn unsafe_tokens_are_single_quoted() {
        assert_eq!(shell_quote("/srv/my lxc/web"), "'/srv/my lxc/web'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn display_omits_sudo() {
        let cmd = Command::new("lxc-freeze").args(["-n", "db"]);
        assert_eq!(cmd.to_string(), "lxc-freeze -n db");
        assert_eq!(cmd.program(), "lxc-freeze");
        assert_eq!(cmd.get_args().len(), 2);
    }
}
