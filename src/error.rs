use std::result;

pub use failure::{Error, ResultExt};

pub type Result<T> = result::Result<T, Error>;

/// Failures that callers match on. Everything else travels as a generic
/// `failure::Error` with context attached at the call site.
///
/// Cancellation is not here: declining a prompt is an answer, not a
/// failure, and comes back as `Ok(None)` (or `Ok(false)` for confirms).
#[derive(Debug, Fail)]
pub enum PwgateError {
    #[fail(display = "no credential store is available on this platform")]
    Unavailable,
    #[fail(display = "authentication failed or was refused")]
    AuthenticationFailed,
    #[fail(display = "no stored secret for {}/{}", _0, _1)]
    NotFound(String, String),
    #[fail(display = "{} failed ({})", _0, _1)]
    PlatformError(&'static str, i32),
    #[fail(display = "pinentry error {}: {}", _0, _1)]
    Pinentry(u32, String),
    #[fail(display = "unexpected pinentry reply: {}", _0)]
    Protocol(String),
}
