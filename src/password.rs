//! The prompt-or-keychain decision flows.
//!
//! `password_prompt` asks interactively, preferring pinentry over the raw
//! terminal. `password_prompt_with_keychain` layers the platform store in
//! front: a stored secret short-circuits the prompt, and every keychain
//! failure degrades to plain prompting rather than surfacing.

pub use prompt::PromptRequest;

use credentials::Password;
use error::Result;
use keychain::{Keychain, SecretStore};
use prompt::{PinentryPrompt, Prompt, TerminalPrompt};
use std::env;

/// What to do with a freshly entered password when the keychain could hold
/// it for next time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StorePolicy {
    /// Leave the keychain untouched.
    Never,
    /// Put the question to the active prompt backend.
    Ask,
    /// Store without asking.
    Always,
}

fn pinentry_disabled() -> bool {
    env::var_os("PWGATE_DISABLE_PINENTRY").map_or(false, |value| !value.is_empty() && value != "0")
}

fn backend<'a>(request: &'a PromptRequest<'a>) -> Box<Prompt + 'a> {
    if pinentry_disabled() {
        debug!("pinentry disabled by PWGATE_DISABLE_PINENTRY");
        return Box::new(TerminalPrompt::new(request));
    }
    match PinentryPrompt::resolve(request) {
        Some(pinentry) => Box::new(pinentry),
        None => {
            debug!("no pinentry program found; using the terminal");
            Box::new(TerminalPrompt::new(request))
        }
    }
}

/// Ask the user for a password. `Ok(None)` means they cancelled.
pub fn password_prompt(request: &PromptRequest) -> Result<Option<Password>> {
    backend(request).prompt()
}

/// Like `password_prompt`, but consult the platform keychain first and
/// offer to seed it afterwards. The keychain is an optimization: when it
/// is missing, locked out, or failing, the user simply gets prompted.
pub fn password_prompt_with_keychain(
    request: &PromptRequest,
    service: &str,
    account: &str,
    policy: StorePolicy,
) -> Result<Option<Password>> {
    let prompt = backend(request);
    let keychain = match Keychain::new() {
        Ok(keychain) => keychain,
        Err(error) => {
            debug!("keychain unavailable ({}); prompting without it", error);
            return prompt.prompt();
        }
    };
    prompt_with_store(&keychain, &*prompt, service, account, policy)
}

/// The store-aware flow over caller-chosen backends. Public so embedders
/// can bring their own `SecretStore` or `Prompt`.
pub fn prompt_with_store(
    store: &SecretStore,
    prompt: &Prompt,
    service: &str,
    account: &str,
    policy: StorePolicy,
) -> Result<Option<Password>> {
    let existing = match store.exists(service, account) {
        Ok(existing) => existing,
        Err(error) => {
            warn!("keychain probe for {}/{} failed: {}", service, account, error);
            false
        }
    };
    if existing {
        match store.retrieve(service, account) {
            Ok(secret) => return Ok(Some(secret)),
            Err(error) => warn!("stored secret unusable ({}); prompting instead", error),
        }
    }
    let secret = match prompt.prompt()? {
        Some(secret) => secret,
        None => return Ok(None),
    };
    // Offer to store only what is genuinely new; a record that merely
    // failed to authenticate this time stays as it is.
    if !existing && store_wanted(prompt, policy) {
        if let Err(error) = store.store(service, account, &secret) {
            warn!(
                "could not store the password for {}/{}: {}",
                service, account, error
            );
        }
    }
    Ok(Some(secret))
}

fn store_wanted(prompt: &Prompt, policy: StorePolicy) -> bool {
    match policy {
        StorePolicy::Never => false,
        StorePolicy::Always => true,
        StorePolicy::Ask => prompt
            .confirm("Save this password to the keychain?")
            .unwrap_or_else(|error| {
                warn!("store confirmation failed: {}", error);
                false
            }),
    }
}
