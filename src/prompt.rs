use crate::error::{PersephoneError, Result};
use dialoguer::{Input, Password};
use std::io::{self, BufRead, IsTerminal, Write};

/// Source of answers for missing configuration values.
pub trait Prompter {
    /// Ask for a value for the dotted `key` and return one line of input.
    fn prompt(&mut self, key: &str) -> Result<String>;
}

impl<F> Prompter for F
where
    F: FnMut(&str) -> Result<String>,
{
    fn prompt(&mut self, key: &str) -> Result<String> {
        self(key)
    }
}

/// Reads answers from the terminal. Input is echoed, passphrase included.
///
/// Unless both stdin and stderr are terminals the prompt goes to stderr and
/// a plain line is read, so answers can be piped in.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn prompt(&mut self, key: &str) -> Result<String> {
        let prompt_error = |source: io::Error| PersephoneError::Prompt {
            key: key.to_string(),
            source,
        };
        let text = format!("Please enter a value for {}", key);

        if !is_interactive() {
            return read_plain_line(&text).map_err(prompt_error);
        }

        Input::<String>::new()
            .with_prompt(text)
            .allow_empty(true)
            .interact_text()
            .map_err(|dialoguer::Error::IO(e)| prompt_error(e))
    }
}

/// Ask for a secret without echoing it when a terminal is available.
pub fn read_secret(key: &str) -> Result<String> {
    let prompt_error = |source: io::Error| PersephoneError::Prompt {
        key: key.to_string(),
        source,
    };
    let text = format!("Enter new value for {}", key);

    if !is_interactive() {
        return read_plain_line(&text).map_err(prompt_error);
    }

    Password::new()
        .with_prompt(text)
        .allow_empty_password(true)
        .interact()
        .map_err(|dialoguer::Error::IO(e)| prompt_error(e))
}

/// dialoguer draws on stderr and reads keys from stdin, so it needs both.
fn is_interactive() -> bool {
    use_terminal(io::stdin().is_terminal(), io::stderr().is_terminal())
}

fn use_terminal(stdin_is_tty: bool, stderr_is_tty: bool) -> bool {
    stdin_is_tty && stderr_is_tty
}

fn read_plain_line(text: &str) -> io::Result<String> {
    eprint!("{}: ", text);
    io::stderr().flush()?;
    read_answer(io::stdin().lock())
}

fn read_answer(mut reader: impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before a value was entered",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
