//! Keychain and Touch ID bindings for the Apple platform family.
//!
//! Generic-password items carry the secret; LocalAuthentication gates
//! retrieval behind the device owner's biometrics. The authentication
//! context is acquired on construction and released on drop.

mod ffi;

use self::ffi::*;
use block::ConcreteBlock;
use credentials::Password;
use error::PwgateError;
use memsec;
use objc::runtime::{Class, Object, BOOL, NO};
use security_framework::passwords;
use std::os::raw::c_void;
use std::ptr;
use std::sync::mpsc;

pub const SUPPORTED: bool = true;

/// Owned Objective-C reference, released on drop.
struct Retained(*mut Object);

impl Retained {
    fn get(&self) -> *mut Object {
        self.0
    }
}

impl Drop for Retained {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                let _: () = msg_send![self.0, release];
            }
        }
    }
}

fn new_context() -> Result<Retained, PwgateError> {
    let class = match Class::get("LAContext") {
        Some(class) => class,
        None => return Err(PwgateError::Unavailable),
    };
    unsafe {
        let context: *mut Object = msg_send![class, alloc];
        let context: *mut Object = msg_send![context, init];
        if context.is_null() {
            return Err(PwgateError::Unavailable);
        }
        Ok(Retained(context))
    }
}

fn can_evaluate(context: &Retained) -> bool {
    unsafe {
        let mut error: *mut Object = ptr::null_mut();
        let ok: BOOL = msg_send![context.get(),
            canEvaluatePolicy: LA_POLICY_DEVICE_OWNER_AUTHENTICATION_WITH_BIOMETRICS
            error: &mut error];
        ok != NO
    }
}

fn ns_string(s: &str) -> Result<Retained, PwgateError> {
    let class = match Class::get("NSString") {
        Some(class) => class,
        None => return Err(PwgateError::Unavailable),
    };
    unsafe {
        let string: *mut Object = msg_send![class, alloc];
        let string: *mut Object = msg_send![string,
            initWithBytes: s.as_ptr() as *const c_void
            length: s.len() as u64
            encoding: NS_UTF8_STRING_ENCODING];
        if string.is_null() {
            return Err(PwgateError::PlatformError("NSString initWithBytes", -1));
        }
        Ok(Retained(string))
    }
}

fn wipe(bytes: &mut [u8]) {
    unsafe {
        memsec::memzero(bytes.as_mut_ptr(), bytes.len());
    }
}

/// Biometrics present and a policy that can actually be evaluated.
pub fn available() -> bool {
    match new_context() {
        Ok(context) => can_evaluate(&context),
        Err(_) => false,
    }
}

pub struct NativeKeychain {
    context: Retained,
}

impl NativeKeychain {
    pub fn new() -> Result<NativeKeychain, PwgateError> {
        let context = new_context()?;
        if !can_evaluate(&context) {
            return Err(PwgateError::Unavailable);
        }
        Ok(NativeKeychain { context })
    }

    pub fn store(
        &self,
        service: &str,
        account: &str,
        secret: &Password,
    ) -> Result<(), PwgateError> {
        passwords::set_generic_password(service, account, secret.str().as_bytes())
            .map_err(|e| PwgateError::PlatformError("SecItemAdd", e.code()))
    }

    pub fn retrieve(&self, service: &str, account: &str) -> Result<Password, PwgateError> {
        self.evaluate_policy(&format!("read the stored password for {}", account))?;
        let mut bytes = passwords::get_generic_password(service, account).map_err(|e| {
            if e.code() == ERR_SEC_ITEM_NOT_FOUND {
                PwgateError::NotFound(String::from(service), String::from(account))
            } else {
                PwgateError::PlatformError("SecItemCopyMatching", e.code())
            }
        })?;
        let secret = String::from_utf8_lossy(&bytes).into_owned();
        wipe(&mut bytes);
        Ok(Password::new(secret))
    }

    pub fn delete(&self, service: &str, account: &str) -> Result<(), PwgateError> {
        match passwords::delete_generic_password(service, account) {
            Ok(()) => Ok(()),
            // Removing an absent record is a defined no-op.
            Err(ref e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(()),
            Err(e) => Err(PwgateError::PlatformError("SecItemDelete", e.code())),
        }
    }

    pub fn exists(&self, service: &str, account: &str) -> Result<bool, PwgateError> {
        // The passwords API has no attributes-only probe, so fetch and wipe
        // without letting the secret out of this frame.
        match passwords::get_generic_password(service, account) {
            Ok(mut bytes) => {
                wipe(&mut bytes);
                Ok(true)
            }
            Err(ref e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(false),
            Err(e) => Err(PwgateError::PlatformError("SecItemCopyMatching", e.code())),
        }
    }

    pub fn authenticate(&self, reason: &str) -> Result<(), PwgateError> {
        self.evaluate_policy(reason)
    }

    /// Put up the Touch ID sheet and block until the user answers. The
    /// reply block runs on a libdispatch queue, so a channel bridges it
    /// back to this thread.
    fn evaluate_policy(&self, reason: &str) -> Result<(), PwgateError> {
        let reason = ns_string(reason)?;
        let (sender, receiver) = mpsc::channel();
        let reply = ConcreteBlock::new(move |granted: BOOL, _error: *mut Object| {
            let _ = sender.send(granted != NO);
        });
        let reply = reply.copy();
        unsafe {
            let _: () = msg_send![self.context.get(),
                evaluatePolicy: LA_POLICY_DEVICE_OWNER_AUTHENTICATION_WITH_BIOMETRICS
                localizedReason: reason.get()
                reply: &*reply];
        }
        match receiver.recv() {
            Ok(true) => Ok(()),
            Ok(false) => Err(PwgateError::AuthenticationFailed),
            Err(_) => Err(PwgateError::PlatformError("evaluatePolicy", -1)),
        }
    }
}
