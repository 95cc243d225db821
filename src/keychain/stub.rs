//! Fail-closed stand-in for platforms without a native credential store.
//! Nothing here touches the OS; every operation reports `Unavailable` and
//! callers take the interactive path instead.

use credentials::Password;
use error::PwgateError;

pub const SUPPORTED: bool = false;

pub fn available() -> bool {
    false
}

pub struct NativeKeychain;

impl NativeKeychain {
    pub fn new() -> Result<NativeKeychain, PwgateError> {
        Err(PwgateError::Unavailable)
    }

    pub fn store(
        &self,
        _service: &str,
        _account: &str,
        _secret: &Password,
    ) -> Result<(), PwgateError> {
        Err(PwgateError::Unavailable)
    }

    pub fn retrieve(&self, _service: &str, _account: &str) -> Result<Password, PwgateError> {
        Err(PwgateError::Unavailable)
    }

    pub fn delete(&self, _service: &str, _account: &str) -> Result<(), PwgateError> {
        Err(PwgateError::Unavailable)
    }

    pub fn exists(&self, _service: &str, _account: &str) -> Result<bool, PwgateError> {
        Err(PwgateError::Unavailable)
    }

    pub fn authenticate(&self, _reason: &str) -> Result<(), PwgateError> {
        Err(PwgateError::Unavailable)
    }
}
