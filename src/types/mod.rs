//! This module contains the ACL types used by the IMAP protocol.

/// From [section 2.1 of RFC 4314](https://datatracker.ietf.org/doc/html/rfc4314#section-2.1).
///
/// A single right, as named by the `imap-proto` parser. Any `char` converts into an
/// [`AclRight`], so every method taking a right accepts either.
pub use imap_proto::types::AclRight;

mod acls;
pub use self::acls::{Iter, RightsSet};
