#![cfg_attr(feature = "clippy", feature(plugin))]
#![cfg_attr(feature = "clippy", plugin(clippy))]

#[macro_use]
extern crate failure;
extern crate hex;
#[macro_use]
extern crate log;
extern crate memsec;
extern crate rpassword;
extern crate which;

#[cfg(target_os = "macos")]
extern crate block;
#[cfg(target_os = "macos")]
#[macro_use]
extern crate objc;
#[cfg(target_os = "macos")]
extern crate security_framework;

#[cfg(test)]
extern crate tempfile;

pub mod credentials;
pub mod error;
pub mod keychain;
pub mod password;
pub mod pinentry;
pub mod prompt;
