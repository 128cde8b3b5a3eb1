//! The storage API key.
//!
//! Held in a `secrecy` box and only readable inside the crate, where the
//! HTTP backend attaches it to requests.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// API key for the storage service. Surrounding whitespace is dropped.
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self(SecretString::from(value.trim()))
    }

    /// True when no usable key was supplied.
    pub fn is_blank(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            f.write_str("ApiKey(<blank>)")
        } else {
            f.write_str("ApiKey([REDACTED])")
        }
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_in_debug() {
        let key = ApiKey::new("anon-key-1234");
        let debug = format!("{:?}", key);
        assert!(!debug.contains("anon-key"));
        assert_eq!(debug, "ApiKey([REDACTED])");
    }

    #[test]
    fn test_trims_and_detects_blank() {
        let key = ApiKey::from("  anon-key-1234\n");
        assert_eq!(key.expose(), "anon-key-1234");
        assert!(!key.is_blank());

        let blank = ApiKey::from("   ");
        assert!(blank.is_blank());
        assert_eq!(format!("{:?}", blank), "ApiKey(<blank>)");
    }
}
