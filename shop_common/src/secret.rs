//! A wrapper for gateway credentials (API keys, HMAC checksum keys) that keeps them out of logs.
//!
//! Both `Debug` and `Display` render as `****`, so a `Secret` can sit inside a derived-`Debug` config
//! struct without leaking. The value only comes out through an explicit [`Secret::reveal`] call at the
//! point of use, such as building an auth header or signing a request.

use std::{
    fmt,
    fmt::{Debug, Display},
};

use log::warn;

#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// Reads the credential from the environment, falling back to `default` with a warning. The
    /// fallback keeps local setups running; real deployments must set the variable.
    pub fn from_env_or(var: &str, default: &str) -> Self {
        let value = std::env::var(var).unwrap_or_else(|_| {
            warn!("{var} not set, using (probably useless) default");
            default.to_string()
        });
        Self::new(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
