//! Mailbox rights for the IMAP ACL extension.
//!
//! [RFC 4314](https://datatracker.ietf.org/doc/html/rfc4314) lets a server report, for each
//! identifier on a mailbox, the rights that are always granted (*required*) and the rights that
//! may be granted (*optional*), the latter possibly bundled into groups that can only be granted
//! together. [`RightsSet`] keeps both and answers "does this identifier hold right X?".
//!
//! # Usage
//!
//! ```
//! use imap_acl::{AclRight, RightsSet};
//!
//! // * LISTRIGHTS ~/Mail/saved smith la r swicdkxte
//! let mut rights = RightsSet::from_rights("la", ["r", "swicdkxte"]);
//!
//! assert!(rights.has_right(AclRight::Lookup));
//! assert_eq!(rights.get('w').as_deref(), Some("swicdkxte"));
//!
//! // the obsolete RFC 2086 rights are ignored once their replacements are present
//! assert!(!rights.has_right('c'));
//!
//! rights.unset('a');
//! assert_eq!(rights.to_string(), "lrswikxte");
//!
//! // persist, e.g. in a session cache
//! let bytes = rights.to_bytes().unwrap();
//! assert_eq!(RightsSet::from_bytes(&bytes).unwrap(), rights);
//! ```

#![warn(missing_docs)]

mod types;

pub mod error;

#[cfg(feature = "test_helpers")]
pub mod testing;

pub use crate::error::{Error, Result};
pub use crate::types::*;
