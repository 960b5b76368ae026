//! IMAP ACL error types.

use std::result;

use serde_json::Error as JsonError;
use thiserror::Error;

/// A convenience wrapper around `Result` for `imap_acl::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while handling mailbox rights.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The rights set could not be written out in its persisted form.
    #[error("Unable to encode rights set: {0}")]
    Encode(#[source] JsonError),
    /// Persisted data did not describe a valid rights set.
    #[error("Unable to decode rights set: {0}")]
    Decode(#[source] JsonError),
}

impl Error {
    /// Returns true if this error was raised while restoring persisted rights.
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}
