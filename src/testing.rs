//! Enable the test_helpers feature to expose helper methods to build
//! rights sets for testing your code that uses the imap-acl crate
//!
//! To use add a dev-dependency on the imap-acl crate adding the feature "test_helpers"
//! e.g.
//!
//! ```toml
//! [dependencies]
//! imap-acl = { version = "0.1" }
//!
//! [dev-dependencies]
//! # mirror the same configuration your dependencies and add test_helpers
//! imap-acl = { version = "0.1", features = ["test_helpers"] }
//! ```
//!
#[cfg(doc)]
use crate::types::*;

/// Methods to build a [`RightsSet`] object
pub mod rights_set {
    use crate::types::RightsSet;

    /// Builds a [`RightsSet`] the way a `LISTRIGHTS` response reports it: a string of required
    /// rights followed by the optional right groups.
    ///
    /// ```
    /// // * LISTRIGHTS archive/imap anyone "" l r s w i p k x t e c d a 0 1 2 3 4 5 6 7 8 9
    /// let rights = imap_acl::testing::rights_set::listrights("", &["l", "r", "s", "k", "c"]);
    /// assert!(rights.has_right('k'));
    /// assert!(!rights.has_right('c'));
    /// ```
    pub fn listrights(required: &str, optional: &[&str]) -> RightsSet {
        RightsSet::from_rights(required, optional)
    }

    /// Builds a [`RightsSet`] the way a `MYRIGHTS` response reports it: every right is held, so
    /// they all end up as required rights.
    ///
    /// ```
    /// // * MYRIGHTS INBOX rwiptsldaex
    /// let rights = imap_acl::testing::rights_set::myrights("rwiptsldaex");
    /// assert_eq!(rights.required().len(), 11);
    /// ```
    pub fn myrights(rights: &str) -> RightsSet {
        RightsSet::from_rights(rights, std::iter::empty::<&str>())
    }

    /// Restores a [`RightsSet`] from its persisted form, panicking if the input is malformed.
    ///
    /// ```
    /// let input = r#"{"required":["l"],"optional":{"a":"a"}}"#;
    /// let rights = imap_acl::testing::rights_set::restore(input);
    /// assert_eq!(rights.get('a').as_deref(), Some("a"));
    /// ```
    pub fn restore(input: impl AsRef<[u8]>) -> RightsSet {
        RightsSet::from_bytes(input.as_ref()).unwrap()
    }

}
