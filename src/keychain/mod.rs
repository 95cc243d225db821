//! The platform credential store behind one trait.
//!
//! Exactly one variant compiles in: the Apple keychain with a Touch ID
//! gate on `macos`, a fail-closed stub everywhere else. Callers treat any
//! error from any operation as "prompt interactively instead" and never
//! need to look at the cause.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use self::macos as imp;

#[cfg(not(target_os = "macos"))]
mod stub;
#[cfg(not(target_os = "macos"))]
use self::stub as imp;

use credentials::Password;
use error::Error;

pub trait SecretStore {
    /// Insert or overwrite the record for (service, account).
    fn store(&self, service: &str, account: &str, secret: &Password) -> Result<(), Error>;
    /// Authenticate the user, then hand back the stored secret.
    fn retrieve(&self, service: &str, account: &str) -> Result<Password, Error>;
    /// Remove the record. Removing an absent record succeeds.
    fn delete(&self, service: &str, account: &str) -> Result<(), Error>;
    /// Whether a record is present, without authenticating and without
    /// exposing the secret.
    fn exists(&self, service: &str, account: &str) -> Result<bool, Error>;
    /// Stand-alone authentication check, tied to no record.
    fn authenticate(&self, reason: &str) -> Result<(), Error>;
}

/// The native store for this build. Construction acquires the platform
/// authentication context; drop releases it.
pub struct Keychain {
    native: imp::NativeKeychain,
}

impl Keychain {
    /// Compile-time answer: does this build carry a store at all?
    pub fn supported() -> bool {
        imp::SUPPORTED
    }

    /// Runtime answer: is the store usable right now (sensor present,
    /// biometrics enrolled)?
    pub fn available() -> bool {
        imp::available()
    }

    pub fn new() -> Result<Keychain, Error> {
        Ok(Keychain {
            native: imp::NativeKeychain::new()?,
        })
    }
}

impl SecretStore for Keychain {
    fn store(&self, service: &str, account: &str, secret: &Password) -> Result<(), Error> {
        Ok(self.native.store(service, account, secret)?)
    }

    fn retrieve(&self, service: &str, account: &str) -> Result<Password, Error> {
        Ok(self.native.retrieve(service, account)?)
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), Error> {
        Ok(self.native.delete(service, account)?)
    }

    fn exists(&self, service: &str, account: &str) -> Result<bool, Error> {
        Ok(self.native.exists(service, account)?)
    }

    fn authenticate(&self, reason: &str) -> Result<(), Error> {
        Ok(self.native.authenticate(reason)?)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use error::PwgateError;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// In-memory `SecretStore` with switchable failure modes, for driving
    /// the flows that sit on top of the keychain.
    pub struct MemoryStore {
        secrets: RefCell<HashMap<(String, String), String>>,
        deny: Cell<bool>,
        fail_store: Cell<bool>,
    }

    fn key(service: &str, account: &str) -> (String, String) {
        (String::from(service), String::from(account))
    }

    impl MemoryStore {
        pub fn new() -> MemoryStore {
            MemoryStore {
                secrets: RefCell::new(HashMap::new()),
                deny: Cell::new(false),
                fail_store: Cell::new(false),
            }
        }

        /// Make `retrieve` and `authenticate` behave as if the user failed
        /// the biometric check.
        pub fn deny_auth(&self, deny: bool) {
            self.deny.set(deny);
        }

        pub fn fail_store(&self, fail: bool) {
            self.fail_store.set(fail);
        }
    }

    impl SecretStore for MemoryStore {
        fn store(&self, service: &str, account: &str, secret: &Password) -> Result<(), Error> {
            if self.fail_store.get() {
                return Err(PwgateError::PlatformError("MemoryStore::store", -1).into());
            }
            self.secrets
                .borrow_mut()
                .insert(key(service, account), String::from(secret.str()));
            Ok(())
        }

        fn retrieve(&self, service: &str, account: &str) -> Result<Password, Error> {
            if self.deny.get() {
                return Err(PwgateError::AuthenticationFailed.into());
            }
            match self.secrets.borrow().get(&key(service, account)) {
                Some(secret) => Ok(Password::new(secret.clone())),
                None => {
                    Err(PwgateError::NotFound(String::from(service), String::from(account)).into())
                }
            }
        }

        fn delete(&self, service: &str, account: &str) -> Result<(), Error> {
            self.secrets.borrow_mut().remove(&key(service, account));
            Ok(())
        }

        fn exists(&self, service: &str, account: &str) -> Result<bool, Error> {
            Ok(self.secrets.borrow().contains_key(&key(service, account)))
        }

        fn authenticate(&self, _reason: &str) -> Result<(), Error> {
            if self.deny.get() {
                return Err(PwgateError::AuthenticationFailed.into());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::MemoryStore;
    use super::*;
    use error::PwgateError;

    #[test]
    fn test_store_then_exists_then_retrieve() {
        let store = MemoryStore::new();
        assert!(!store.exists("svc", "alice").unwrap());
        store
            .store("svc", "alice", &Password::new(String::from("s3cret")))
            .unwrap();
        assert!(store.exists("svc", "alice").unwrap());
        assert_eq!(store.retrieve("svc", "alice").unwrap().str(), "s3cret");
    }

    #[test]
    fn test_store_upserts() {
        let store = MemoryStore::new();
        store
            .store("svc", "alice", &Password::new(String::from("one")))
            .unwrap();
        store
            .store("svc", "alice", &Password::new(String::from("two")))
            .unwrap();
        assert_eq!(store.retrieve("svc", "alice").unwrap().str(), "two");
    }

    #[test]
    fn test_delete_then_gone() {
        let store = MemoryStore::new();
        store
            .store("svc", "alice", &Password::new(String::from("s3cret")))
            .unwrap();
        store.delete("svc", "alice").unwrap();
        assert!(!store.exists("svc", "alice").unwrap());
        // Deleting an absent record is a defined no-op.
        store.delete("svc", "alice").unwrap();
    }

    #[test]
    fn test_records_are_scoped_by_service() {
        let store = MemoryStore::new();
        store
            .store("svc-a", "alice", &Password::new(String::from("a")))
            .unwrap();
        assert!(!store.exists("svc-b", "alice").unwrap());
    }

    #[test]
    fn test_denied_retrieve_reports_authentication_failure() {
        let store = MemoryStore::new();
        store
            .store("svc", "alice", &Password::new(String::from("s3cret")))
            .unwrap();
        store.deny_auth(true);
        let error = store.retrieve("svc", "alice").unwrap_err();
        match error.downcast_ref::<PwgateError>() {
            Some(&PwgateError::AuthenticationFailed) => (),
            _ => panic!("unexpected error: {}", error),
        }
    }

    #[test]
    fn test_missing_record_reports_not_found() {
        let store = MemoryStore::new();
        let error = store.retrieve("svc", "nobody").unwrap_err();
        match error.downcast_ref::<PwgateError>() {
            Some(&PwgateError::NotFound(_, _)) => (),
            _ => panic!("unexpected error: {}", error),
        }
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_keychain_unsupported_off_macos() {
        assert!(!Keychain::supported());
        assert!(!Keychain::available());
        let error = match Keychain::new() {
            Ok(_) => panic!("keychain constructed without a platform store"),
            Err(error) => error,
        };
        match error.downcast_ref::<PwgateError>() {
            Some(&PwgateError::Unavailable) => (),
            _ => panic!("unexpected error: {}", error),
        }
    }
}
