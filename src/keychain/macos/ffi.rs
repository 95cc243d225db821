//! Framework links and the few raw constants the bindings need.

// LAPolicy, LocalAuthentication/LAPolicy.h
pub const LA_POLICY_DEVICE_OWNER_AUTHENTICATION_WITH_BIOMETRICS: i64 = 1;

// NSStringEncoding, Foundation/NSString.h
pub const NS_UTF8_STRING_ENCODING: u64 = 4;

// OSStatus, Security/SecBase.h
pub const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

#[link(name = "Foundation", kind = "framework")]
extern "C" {}

#[link(name = "LocalAuthentication", kind = "framework")]
extern "C" {}
