//! Client side of pinentry's line protocol.
//!
//! One `Pinentry` owns one spawned process. Commands go out one per line;
//! replies are `OK`, `ERR <code> <desc>`, data (`D `) and status (`S `,
//! `# `) lines, the last two ignored. Values in both directions travel
//! percent-escaped so they stay on one line.

pub mod codec;

use credentials::Password;
use error::*;
use std::env;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use which;

/// gpg-error code for a user cancel, in the low 16 bits of an `ERR`.
const GPG_ERR_CANCELED: u32 = 99;
/// gpg-error code for answering no to `CONFIRM`.
const GPG_ERR_NOT_CONFIRMED: u32 = 114;

/// Find the pinentry program: `$PWGATE_PINENTRY` if set, otherwise
/// `pinentry` on the search path. `None` means prompting has to happen
/// somewhere else.
pub fn resolve_binary() -> Option<PathBuf> {
    let name = env::var_os("PWGATE_PINENTRY").unwrap_or_else(|| OsString::from("pinentry"));
    which::which(name).ok()
}

pub struct Pinentry {
    child: Child,
    input: ChildStdin,
    output: BufReader<ChildStdout>,
}

impl Pinentry {
    pub fn spawn(binary: &Path) -> Result<Pinentry> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context(format!("spawn {}", binary.display()))?;
        let input = child.stdin.take().expect("piped stdin");
        let output = BufReader::new(child.stdout.take().expect("piped stdout"));
        let mut session = Pinentry {
            child,
            input,
            output,
        };
        // The server opens with a bare OK greeting.
        session.read_reply()?;
        Ok(session)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        self.request("SETTITLE", Some(title)).map(|_| ())
    }

    pub fn set_prompt(&mut self, prompt: &str) -> Result<()> {
        self.request("SETPROMPT", Some(prompt)).map(|_| ())
    }

    pub fn set_desc(&mut self, desc: &str) -> Result<()> {
        self.request("SETDESC", Some(desc)).map(|_| ())
    }

    pub fn set_error(&mut self, error: &str) -> Result<()> {
        self.request("SETERROR", Some(error)).map(|_| ())
    }

    /// Ask for the secret. `Ok(None)` is the user pressing cancel; an `OK`
    /// with no data is a present, empty password.
    pub fn get_pin(&mut self) -> Result<Option<Password>> {
        match self.request("GETPIN", None) {
            Ok(data) => {
                let pin = data.map(|raw| codec::unescape(&raw)).unwrap_or_default();
                Ok(Some(Password::new(pin)))
            }
            Err(error) => {
                if gpg_code(&error) == Some(GPG_ERR_CANCELED) {
                    return Ok(None);
                }
                Err(error)
            }
        }
    }

    /// Ask the confirmation question set up with `set_desc`. Both "no" and
    /// cancel come back as `Ok(false)`.
    pub fn confirm(&mut self) -> Result<bool> {
        match self.request("CONFIRM", None) {
            Ok(_) => Ok(true),
            Err(error) => match gpg_code(&error) {
                Some(GPG_ERR_CANCELED) | Some(GPG_ERR_NOT_CONFIRMED) => Ok(false),
                _ => Err(error),
            },
        }
    }

    /// Send one command and collect its reply. The payload, if any, is the
    /// concatenation of the `D` lines, still escaped.
    pub fn request(&mut self, command: &str, argument: Option<&str>) -> Result<Option<String>> {
        let line = match argument {
            Some(argument) => format!("{} {}\n", command, codec::escape(argument)),
            None => format!("{}\n", command),
        };
        self.input
            .write_all(line.as_bytes())
            .context("write to pinentry")?;
        self.input.flush().context("write to pinentry")?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<Option<String>> {
        let mut data: Option<String> = None;
        loop {
            let mut line = String::new();
            let read = self
                .output
                .read_line(&mut line)
                .context("read from pinentry")?;
            if read == 0 {
                bail!("pinentry closed the stream mid-request");
            }
            // Only strip line terminators; data lines may end in spaces.
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            if line == "OK" || line.starts_with("OK ") {
                return Ok(data);
            }
            if line.starts_with("D ") {
                data.get_or_insert_with(String::new).push_str(&line[2..]);
            } else if line.starts_with("S ") || line.starts_with('#') {
                // Status and comment lines carry nothing we need.
            } else if line.starts_with("ERR ") {
                let mut fields = line[4..].splitn(2, ' ');
                let code = fields
                    .next()
                    .and_then(|code| code.parse().ok())
                    .unwrap_or(0);
                let description = String::from(fields.next().unwrap_or(""));
                return Err(PwgateError::Pinentry(code, description).into());
            } else {
                return Err(PwgateError::Protocol(line).into());
            }
        }
    }
}

impl Drop for Pinentry {
    fn drop(&mut self) {
        // Best effort; the child may already be gone.
        let _ = self.input.write_all(b"BYE\n");
        let _ = self.input.flush();
        let _ = self.child.wait();
    }
}

fn gpg_code(error: &Error) -> Option<u32> {
    match error.downcast_ref::<PwgateError>() {
        Some(&PwgateError::Pinentry(code, _)) => Some(code & 0xffff),
        _ => None,
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::test::*;
    use super::*;
    use tempfile::TempDir;

    fn session(script: &str) -> (TempDir, Pinentry) {
        let dir = TempDir::new().unwrap();
        let binary = fake_pinentry(&dir, script);
        let session = Pinentry::spawn(&binary).unwrap();
        (dir, session)
    }

    #[test]
    fn test_get_pin() {
        let (_dir, mut session) = session(COOPERATIVE);
        session.set_title("title").unwrap();
        session.set_prompt("Passphrase").unwrap();
        session.set_desc("multi\nline\ndescription").unwrap();
        session.set_error("wrong, try again").unwrap();
        let pin = session.get_pin().unwrap().unwrap();
        assert_eq!(pin.str(), "sec%ret");
    }

    #[test]
    fn test_status_and_comment_lines_are_ignored() {
        let (_dir, mut session) = session(CHATTY);
        let pin = session.get_pin().unwrap().unwrap();
        assert_eq!(pin.str(), "first\nsecond half");
    }

    #[test]
    fn test_cancelled_get_pin_is_none() {
        let (_dir, mut session) = session(CANCELLING);
        assert!(session.get_pin().unwrap().is_none());
    }

    #[test]
    fn test_empty_pin_is_an_empty_password() {
        let (_dir, mut session) = session(EMPTY_PIN);
        let pin = session.get_pin().unwrap().unwrap();
        assert!(pin.str().is_empty());
    }

    #[test]
    fn test_confirm_yes() {
        let (_dir, mut session) = session(COOPERATIVE);
        session.set_desc("Save it?").unwrap();
        assert!(session.confirm().unwrap());
    }

    #[test]
    fn test_confirm_no() {
        let (_dir, mut session) = session(NOT_CONFIRMED);
        assert!(!session.confirm().unwrap());
    }

    #[test]
    fn test_confirm_cancel_is_no() {
        let (_dir, mut session) = session(CANCELLING);
        assert!(!session.confirm().unwrap());
    }

    #[test]
    fn test_garbage_reply_is_a_protocol_error() {
        let (_dir, mut session) = session(GIBBERISH);
        let error = session.get_pin().unwrap_err();
        match error.downcast_ref::<PwgateError>() {
            Some(&PwgateError::Protocol(ref line)) => assert_eq!(line, "BLURB"),
            _ => panic!("unexpected error: {}", error),
        }
    }

    #[test]
    fn test_missing_binary_fails_to_spawn() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("no-such-pinentry");
        assert!(Pinentry::spawn(&binary).is_err());
    }
}
