use credentials::Password;
use error;
use pinentry::{self, Pinentry};
use rpassword;
use std::io;
use std::io::prelude::*;
use std::path::PathBuf;

/// What to show when asking. All text is opaque to the transport; empty
/// strings are legal.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    title: &'a str,
    prompt: &'a str,
    description: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> PromptRequest<'a> {
    pub fn new(title: &'a str, prompt: &'a str) -> PromptRequest<'a> {
        PromptRequest {
            title,
            prompt,
            description: None,
            error: None,
        }
    }

    /// Longer text shown above the entry field.
    pub fn description(mut self, description: &'a str) -> PromptRequest<'a> {
        self.description = Some(description);
        self
    }

    /// Error from a failed previous attempt, for retry prompts.
    pub fn error(mut self, error: &'a str) -> PromptRequest<'a> {
        self.error = Some(error);
        self
    }
}

pub trait Prompt {
    /// `Ok(None)` is the user declining to answer.
    fn prompt(&self) -> error::Result<Option<Password>>;
    /// A yes/no question through the same channel.
    fn confirm(&self, question: &str) -> error::Result<bool>;
}

pub struct PinentryPrompt<'a> {
    binary: PathBuf,
    request: &'a PromptRequest<'a>,
}

impl<'a> PinentryPrompt<'a> {
    /// `None` when no pinentry program can be found; callers fall back to
    /// the terminal.
    pub fn resolve(request: &'a PromptRequest<'a>) -> Option<PinentryPrompt<'a>> {
        pinentry::resolve_binary().map(|binary| PinentryPrompt { binary, request })
    }

    pub fn with_binary(binary: PathBuf, request: &'a PromptRequest<'a>) -> PinentryPrompt<'a> {
        PinentryPrompt { binary, request }
    }
}

impl<'a> Prompt for PinentryPrompt<'a> {
    fn prompt(&self) -> error::Result<Option<Password>> {
        let mut session = Pinentry::spawn(&self.binary)?;
        session.set_title(self.request.title)?;
        session.set_prompt(self.request.prompt)?;
        if let Some(description) = self.request.description {
            session.set_desc(description)?;
        }
        if let Some(error) = self.request.error {
            session.set_error(error)?;
        }
        session.get_pin()
    }

    fn confirm(&self, question: &str) -> error::Result<bool> {
        let mut session = Pinentry::spawn(&self.binary)?;
        session.set_title(self.request.title)?;
        session.set_desc(question)?;
        session.confirm()
    }
}

/// Echo-off entry on the controlling terminal, for sessions with no
/// pinentry. Description and error text go to stderr so stdout stays
/// clean for the caller.
pub struct TerminalPrompt<'a> {
    request: &'a PromptRequest<'a>,
}

impl<'a> TerminalPrompt<'a> {
    pub fn new(request: &'a PromptRequest<'a>) -> TerminalPrompt<'a> {
        TerminalPrompt { request }
    }
}

impl<'a> Prompt for TerminalPrompt<'a> {
    fn prompt(&self) -> error::Result<Option<Password>> {
        {
            let stderr = io::stderr();
            let mut stderr = stderr.lock();
            if let Some(description) = self.request.description {
                writeln!(stderr, "{}", description)?;
            }
            if let Some(error) = self.request.error {
                writeln!(stderr, "{}", error)?;
            }
        }
        match rpassword::prompt_password(format!("{}: ", self.request.prompt)) {
            Ok(password) => Ok(Some(Password::new(password))),
            // EOF on the tty is the closest thing a terminal has to cancel.
            Err(ref error) if error.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn confirm(&self, question: &str) -> error::Result<bool> {
        {
            let stderr = io::stderr();
            let mut stderr = stderr.lock();
            write!(stderr, "{} [y/N] ", question)?;
            stderr.flush()?;
        }
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}

/// Fixed answers for scripted callers and tests.
pub struct StaticPrompt {
    password: Option<String>,
    answer: bool,
}

impl StaticPrompt {
    pub fn new(password: String) -> StaticPrompt {
        StaticPrompt {
            password: Some(password),
            answer: true,
        }
    }

    /// Behaves as if the user dismissed every dialog.
    pub fn cancelled() -> StaticPrompt {
        StaticPrompt {
            password: None,
            answer: false,
        }
    }

    pub fn confirm_with(mut self, answer: bool) -> StaticPrompt {
        self.answer = answer;
        self
    }
}

impl Prompt for StaticPrompt {
    fn prompt(&self) -> error::Result<Option<Password>> {
        Ok(self.password.clone().map(Password::new))
    }

    fn confirm(&self, _question: &str) -> error::Result<bool> {
        Ok(self.answer)
    }
}
