use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::SubmitError;

/// A single positional argument passed to the user program
///
/// Numbers are printed the way serde_json prints them: `10` stays `10`, `0.5` stays `0.5`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Argument {
    Number(Number),
    Text(String),
}

impl Argument {
    /// Read a token typed on the command line
    ///
    /// Only tokens that print back unchanged become numbers, so `1e3` or `007` stay text.
    pub fn parse(token: &str) -> Argument {
        match serde_json::from_str::<Number>(token) {
            Ok(number) if number.to_string() == token => Argument::Number(number),
            _ => Argument::Text(token.to_string()),
        }
    }

    /// Arguments are joined with single spaces, so each must stay one token
    fn check_token(&self) -> Result<(), String> {
        match self {
            Argument::Number(_) => Ok(()),
            Argument::Text(text) if text.is_empty() => Err("empty string argument".to_string()),
            Argument::Text(text) if text.chars().any(|c| c.is_whitespace() || c.is_control()) => {
                Err(format!("argument {text:?} contains whitespace or control characters"))
            }
            Argument::Text(_) => Ok(()),
        }
    }

    /// The argument as one shell word, quoted when it holds shell syntax
    pub fn shell_quoted(&self) -> Result<String, SubmitError> {
        let text = self.to_string();
        shell_quote(&text).map(Cow::into_owned)
    }
}

/// Quote a string so the shell reads it back as exactly one word
pub(crate) fn shell_quote(text: &str) -> Result<Cow<'_, str>, SubmitError> {
    shlex::try_quote(text)
        .map_err(|err| SubmitError::InvalidArguments(format!("can't quote {text:?} for the shell: {err}")))
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Argument::Number(number) => write!(f, "{number}"),
            Argument::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Number(value.into())
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Argument::Number(value.into())
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Text(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Text(value)
    }
}

/// The program every task runs, e.g. `python run.py`
///
/// May contain spaces for constant leading arguments. It is shell text and goes into the script
/// unquoted, so it must fit on one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate(String);

impl CommandTemplate {
    pub fn new(command: impl Into<String>) -> Result<Self, SubmitError> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(SubmitError::InvalidArguments("command template is empty".to_string()));
        }
        if command.chars().any(char::is_control) {
            return Err(SubmitError::InvalidArguments(format!(
                "command template {command:?} contains control characters"
            )));
        }
        Ok(CommandTemplate(command))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `template + " " + args joined by spaces`, or the template alone for an empty tuple
    pub fn render(&self, args: &[Argument]) -> String {
        if args.is_empty() {
            return self.0.clone();
        }
        let joined: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        format!("{} {}", self.0, joined.join(" "))
    }

    /// Same as `render`, with every argument quoted so the shell passes it through unchanged
    pub fn render_shell(&self, args: &[Argument]) -> Result<String, SubmitError> {
        let mut line = self.0.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.shell_quoted()?);
        }
        Ok(line)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tuple of arguments per array task, in task order
///
/// Always non-empty and every argument is a single whitespace-free token.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Vec<Vec<Argument>>", into = "Vec<Vec<Argument>>")]
pub struct ArgumentSet {
    sets: Vec<Vec<Argument>>,
}

impl ArgumentSet {
    pub fn new(sets: Vec<Vec<Argument>>) -> Result<Self, SubmitError> {
        if sets.is_empty() {
            return Err(SubmitError::InvalidArguments("no argument sets given".to_string()));
        }
        for (i, set) in sets.iter().enumerate() {
            for arg in set {
                arg.check_token()
                    .map_err(|reason| SubmitError::InvalidArguments(format!("set {i}: {reason}")))?;
            }
        }
        Ok(ArgumentSet { sets })
    }

    /// Build sets from whitespace separated strings, one string per task
    pub fn from_inline<S: AsRef<str>>(tuples: &[S]) -> Result<Self, SubmitError> {
        let sets = tuples
            .iter()
            .map(|tuple| tuple.as_ref().split_whitespace().map(Argument::parse).collect())
            .collect();
        ArgumentSet::new(sets)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Argument]> {
        self.sets.iter().map(|set| set.as_slice())
    }
}

impl TryFrom<Vec<Vec<Argument>>> for ArgumentSet {
    type Error = SubmitError;

    fn try_from(sets: Vec<Vec<Argument>>) -> Result<Self, Self::Error> {
        ArgumentSet::new(sets)
    }
}

impl From<ArgumentSet> for Vec<Vec<Argument>> {
    fn from(set: ArgumentSet) -> Self {
        set.sets
    }
}
