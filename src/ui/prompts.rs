//! ui::prompts
//!
//! Interactive prompts for `login`.
//!
//! Prompts go to stdout and answers come from stdin. Passwords are read
//! without echo through `rpassword` when stdin is a terminal; piped input
//! is read line by line so the command can be scripted.

use std::io::{self, BufRead, IsTerminal, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled: input closed")]
    Cancelled,

    #[error("failed to read {what}: {message}")]
    Io { what: &'static str, message: String },
}

/// Prompt for a line of text, trimmed.
pub fn input(message: &str) -> Result<String, PromptError> {
    let stdin = io::stdin();
    input_from(&mut stdin.lock(), &mut io::stdout(), message)
}

/// Prompt for a password, trimmed.
pub fn password(message: &str) -> Result<String, PromptError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return rpassword::prompt_password(message)
            .map(|p| p.trim().to_string())
            .map_err(|e| read_error("password", e));
    }
    password_from(&mut stdin.lock(), &mut io::stdout(), message)
}

/// [`input`] over explicit streams.
pub fn input_from(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    message: &str,
) -> Result<String, PromptError> {
    write!(writer, "{}", message)
        .and_then(|_| writer.flush())
        .map_err(|e| read_error("username", e))?;

    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| read_error("username", e))?;
    if read == 0 {
        let _ = writeln!(writer);
        return Err(PromptError::Cancelled);
    }
    Ok(line.trim().to_string())
}

/// [`password`] over explicit streams; the answer is not echoed back.
pub fn password_from(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    message: &str,
) -> Result<String, PromptError> {
    write!(writer, "{}", message)
        .and_then(|_| writer.flush())
        .map_err(|e| read_error("password", e))?;

    rpassword::read_password_from_bufread(reader)
        .map(|p| p.trim().to_string())
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => PromptError::Cancelled,
            _ => read_error("password", e),
        })
}

fn read_error(what: &'static str, err: io::Error) -> PromptError {
    PromptError::Io {
        what,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_prints_prompt_and_trims() {
        let mut reader = io::Cursor::new(b"  alice \nrest\n".to_vec());
        let mut out = Vec::new();
        let answer = input_from(&mut reader, &mut out, "Username for \"dav\": ").unwrap();
        assert_eq!(answer, "alice");
        assert_eq!(String::from_utf8(out).unwrap(), "Username for \"dav\": ");
    }

    #[test]
    fn input_at_eof_is_cancelled() {
        let mut reader = io::Cursor::new(Vec::new());
        let mut out = Vec::new();
        assert!(matches!(
            input_from(&mut reader, &mut out, "Username: "),
            Err(PromptError::Cancelled)
        ));
    }

    #[test]
    fn password_reads_line() {
        let mut reader = io::Cursor::new(b"s3cret\n".to_vec());
        let mut out = Vec::new();
        let answer = password_from(&mut reader, &mut out, "Password: ").unwrap();
        assert_eq!(answer, "s3cret");
        assert_eq!(String::from_utf8(out).unwrap(), "Password: ");
    }

    #[test]
    fn password_at_eof_is_cancelled() {
        let mut reader = io::Cursor::new(Vec::new());
        let mut out = Vec::new();
        assert!(matches!(
            password_from(&mut reader, &mut out, "Password: "),
            Err(PromptError::Cancelled)
        ));
    }
}
