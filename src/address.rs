//! Backend addresses and their resolution.
//!
//! An [`Address`] is a parsed URL naming the backend endpoint. Only two
//! schemes are accepted when connecting:
//!
//! | Scheme | Variant | Transport |
//! |--------|---------|-----------|
//! | `ws` | [`Scheme::Plain`] | Plain TCP |
//! | `wss` | [`Scheme::Secure`] | TLS with default trust roots |
//!
//! The address itself may carry any scheme; the check happens in
//! [`Address::scheme`] so that a misconfigured endpoint is reported as a
//! configuration error when the connection is attempted.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Scheme
// ============================================================================

/// Transport-security variant of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `ws://` - unencrypted.
    Plain,
    /// `wss://` - TLS.
    Secure,
}

impl Scheme {
    /// Returns the URL scheme string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "ws",
            Self::Secure => "wss",
        }
    }

    /// Returns the port used when the address names none.
    #[inline]
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 80,
            Self::Secure => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Address
// ============================================================================

/// Backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(Url);

impl Address {
    /// Parses an address from a URL string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the string is not a valid URL.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(Self(Url::parse(input)?))
    }

    /// Returns the validated transport scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for any scheme other than `ws` or `wss`.
    pub fn scheme(&self) -> Result<Scheme> {
        match self.0.scheme() {
            "ws" => Ok(Scheme::Plain),
            "wss" => Ok(Scheme::Secure),
            other => Err(Error::config(format!(
                "Backend connection requires ws or wss scheme, got '{other}'"
            ))),
        }
    }

    /// Returns the host name.
    #[inline]
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the explicit port, or the scheme default.
    #[inline]
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.0
            .port()
            .or_else(|| self.scheme().ok().map(Scheme::default_port))
    }

    /// Returns the address as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Url> for Address {
    #[inline]
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl FromStr for Address {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// AddressResolver
// ============================================================================

/// Supplies the backend address, once per connection attempt.
///
/// Returning `None` means no endpoint is available right now; the
/// supervisor tries again after the next reconnect interval.
///
/// Closures implement this trait:
///
/// ```ignore
/// let resolver = || Address::parse("ws://127.0.0.1:9000").ok();
/// ```
pub trait AddressResolver: Send + Sync + 'static {
    /// Resolves the address for the next connection attempt.
    fn resolve(&self) -> Option<Address>;
}

impl<F> AddressResolver for F
where
    F: Fn() -> Option<Address> + Send + Sync + 'static,
{
    #[inline]
    fn resolve(&self) -> Option<Address> {
        self()
    }
}

impl AddressResolver for Address {
    #[inline]
    fn resolve(&self) -> Option<Address> {
        Some(self.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
