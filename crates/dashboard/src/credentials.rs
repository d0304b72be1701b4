//! Salesforce login credentials read from a local three-line file.
//!
//! ```text
//! user@example.com
//! password
//! security-token
//! ```
//!
//! Loaded before any HTTP client exists so a missing file fails the process
//! without touching the network.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur while loading credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The credentials file does not exist.
    #[error("missing credentials: {} not found", .path.display())]
    Missing { path: PathBuf },

    /// The file has fewer than three non-empty lines.
    #[error(
        "missing credentials: {} must contain username, password and security token on three lines (found {found})",
        .path.display()
    )]
    Incomplete { path: PathBuf, found: usize },

    /// The file exists but could not be read.
    #[error("failed to read credentials from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Username, password and security token for the Salesforce SOAP login.
///
/// Implements `Debug` manually to redact the password and token.
#[derive(Clone)]
pub struct SalesforceCredentials {
    pub username: String,
    pub password: SecretString,
    pub security_token: SecretString,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .finish()
    }
}

impl SalesforceCredentials {
    /// Read credentials from `path`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Missing` if the file does not exist and
    /// `CredentialsError::Incomplete` if any of the three lines is absent or
    /// empty.
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CredentialsError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                CredentialsError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::parse(&contents).ok_or_else(|| CredentialsError::Incomplete {
            path: path.to_path_buf(),
            found: contents.lines().filter(|l| !l.trim_end_matches('\r').is_empty()).count(),
        })
    }

    /// Parse the three-line format. Only line terminators are stripped;
    /// passwords may legitimately contain spaces.
    fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines().map(|l| l.trim_end_matches('\r'));

        let mut next = || lines.next().filter(|l| !l.is_empty()).map(str::to_owned);
        let username = next()?;
        let password = next()?;
        let security_token = next()?;

        Some(Self {
            username,
            password: SecretString::from(password),
            security_token: SecretString::from(security_token),
        })
    }

    /// Password with the security token appended, as the SOAP login expects.
    #[must_use]
    pub fn password_with_token(&self) -> SecretString {
        SecretString::from(format!(
            "{}{}",
            self.password.expose_secret(),
            self.security_token.expose_secret()
        ))
    }
}
