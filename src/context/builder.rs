//! Builder pattern for connection configuration.
//!
//! # Example
//!
//! ```ignore
//! use privmx_endpoint::ConnectionConfig;
//!
//! let config = ConnectionConfig::builder()
//!     .bridge_url("https://bridge.example.com")
//!     .solution_id("6f8f1c0e-solution")
//!     .private_key("L3nX...WIF")
//!     .label("admin")
//!     .build()?;
//!
//! let endpoint = context.connect(config).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Validated settings for one bridge connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Bridge URL (http or https).
    pub bridge_url: String,

    /// Solution to connect to.
    pub solution_id: String,

    /// WIF private key; `None` for public connections.
    pub private_key: Option<String>,

    /// Registry label; the connection ID is used when `None`.
    pub label: Option<String>,
}

impl ConnectionConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Checks the fields shared by user and public connections.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_bridge_url(&self.bridge_url)?;
        validate_solution_id(&self.solution_id)?;
        if let Some(label) = &self.label
            && label.trim().is_empty()
        {
            return Err(Error::config("Connection label must not be empty"));
        }
        Ok(())
    }

    /// Returns the private key required by user connections.
    pub(crate) fn user_private_key(&self) -> Result<&str> {
        match self.private_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::config(
                "Private key is required for user connections. Use .private_key() to set it.",
            )),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("bridge_url", &self.bridge_url)
            .field("solution_id", &self.solution_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// ConnectionConfigBuilder
// ============================================================================

/// Builder for [`ConnectionConfig`].
#[derive(Default, Clone)]
pub struct ConnectionConfigBuilder {
    bridge_url: Option<String>,
    solution_id: Option<String>,
    private_key: Option<String>,
    label: Option<String>,
}

impl fmt::Debug for ConnectionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfigBuilder")
            .field("bridge_url", &self.bridge_url)
            .field("solution_id", &self.solution_id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ConnectionConfigBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bridge URL.
    #[inline]
    #[must_use]
    pub fn bridge_url(mut self, url: impl Into<String>) -> Self {
        self.bridge_url = Some(url.into());
        self
    }

    /// Sets the solution ID.
    #[inline]
    #[must_use]
    pub fn solution_id(mut self, id: impl Into<String>) -> Self {
        self.solution_id = Some(id.into());
        self
    }

    /// Sets the user's WIF private key.
    #[inline]
    #[must_use]
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// Sets the registry label.
    #[inline]
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds a user connection configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a required field is missing or empty
    /// - [`Error::Url`] if the bridge URL does not parse
    pub fn build(self) -> Result<ConnectionConfig> {
        let config = self.into_config();
        config.validate()?;
        config.user_private_key()?;
        Ok(config)
    }

    /// Builds a public connection configuration; any private key is dropped.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build), minus the private key check.
    pub fn build_public(self) -> Result<ConnectionConfig> {
        let mut config = self.into_config();
        config.private_key = None;
        config.validate()?;
        Ok(config)
    }

    fn into_config(self) -> ConnectionConfig {
        ConnectionConfig {
            bridge_url: self.bridge_url.unwrap_or_default(),
            solution_id: self.solution_id.unwrap_or_default(),
            private_key: self.private_key,
            label: self.label,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_bridge_url(bridge_url: &str) -> Result<()> {
    if bridge_url.trim().is_empty() {
        return Err(Error::config(
            "Bridge URL is required. Use .bridge_url() to set it.\n\
             Example: ConnectionConfig::builder().bridge_url(\"https://bridge.example.com\")",
        ));
    }

    let url = Url::parse(bridge_url)?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::config(format!(
            "Bridge URL must use http or https, got '{scheme}'"
        ))),
    }
}

fn validate_solution_id(solution_id: &str) -> Result<()> {
    if solution_id.trim().is_empty() {
        return Err(Error::config(
            "Solution ID is required. Use .solution_id() to set it.",
        ));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
