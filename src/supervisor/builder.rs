//! Builder pattern for supervisor configuration.
//!
//! Provides a fluent API for configuring and creating [`Supervisor`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use backend_link::{Address, ConnectionHandler, Error, Message, Supervisor};
//!
//! struct Quiet;
//!
//! impl ConnectionHandler for Quiet {
//!     fn on_opened(&self) {}
//!     fn on_message(&self, _message: Message) {}
//!     fn on_error(&self, _cause: &Error) {}
//!     fn on_closed(&self, _code: i32, _reason: Option<&str>) {}
//! }
//!
//! # fn example(runtime: tokio::runtime::Handle) -> backend_link::Result<()> {
//! let link = Supervisor::builder()
//!     .resolver(|| Address::parse("wss://backend.example.com/live").ok())
//!     .handler(Quiet)
//!     .reconnect_interval(Duration::from_secs(5))
//!     .runtime(runtime)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::address::AddressResolver;
use crate::error::{Error, Result};
use crate::transport::{ConnectionHandler, SharedHandler, TransportOptions};

use super::core::Supervisor;
use super::options::SupervisorOptions;

// ============================================================================
// SupervisorBuilder
// ============================================================================

/// Builder for configuring a [`Supervisor`] instance.
///
/// Use [`Supervisor::builder()`] to create a new builder.
#[derive(Default)]
pub struct SupervisorBuilder {
    /// Address supplier.
    resolver: Option<Box<dyn AddressResolver>>,
    /// Owner's lifecycle handler.
    handler: Option<SharedHandler>,
    /// Timing policy and transport limits.
    options: SupervisorOptions,
    /// Runtime for connect and I/O tasks.
    runtime: Option<Handle>,
}

// ============================================================================
// SupervisorBuilder Implementation
// ============================================================================

impl SupervisorBuilder {
    /// Creates a new builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address resolver.
    ///
    /// Accepts a closure returning `Option<Address>` or a fixed
    /// [`Address`](crate::Address).
    #[inline]
    #[must_use]
    pub fn resolver(mut self, resolver: impl AddressResolver) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Sets the owner's lifecycle handler.
    #[inline]
    #[must_use]
    pub fn handler(mut self, handler: impl ConnectionHandler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets an already shared lifecycle handler.
    #[inline]
    #[must_use]
    pub fn shared_handler(mut self, handler: SharedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Replaces all timing and transport options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: SupervisorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the reconnect interval.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.options.reconnect_interval = interval;
        self
    }

    /// Sets the ping interval.
    #[inline]
    #[must_use]
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.options.ping_interval = interval;
        self
    }

    /// Sets the transport limits.
    #[inline]
    #[must_use]
    pub fn transport_options(mut self, transport: TransportOptions) -> Self {
        self.options.transport = transport;
        self
    }

    /// Sets the runtime that runs connect and I/O tasks.
    ///
    /// Defaults to the runtime current at [`build`](Self::build) time.
    #[inline]
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the supervisor and makes the initial connection attempt.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if resolver or handler is not set
    /// - [`Error::Config`] if an option is invalid
    /// - [`Error::Config`] if no runtime was given and none is current
    /// - [`Error::Config`] if the first resolved address has an unsupported scheme
    pub fn build(self) -> Result<Supervisor> {
        self.options.validate()?;

        let resolver = self.resolver.ok_or_else(|| {
            Error::config(
                "Address resolver is required. Use .resolver() to set it.\n\
                 Example: Supervisor::builder().resolver(|| Address::parse(\"ws://host:port\").ok())",
            )
        })?;

        let handler = self.handler.ok_or_else(|| {
            Error::config("Connection handler is required. Use .handler() to set it.")
        })?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                Error::config(format!(
                    "No tokio runtime available ({e}). Build inside a runtime or use .runtime()."
                ))
            })?,
        };

        Supervisor::start(resolver, handler, self.options, runtime)
    }
}

impl fmt::Debug for SupervisorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorBuilder")
            .field("resolver", &self.resolver.is_some())
            .field("handler", &self.handler.is_some())
            .field("options", &self.options)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
