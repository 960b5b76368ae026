use crate::error::{Error, Result};
use imap_proto::types::AclRight;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::iter::FusedIterator;

/// `c`, the RFC 2086 create right. RFC 4314 keeps it only as a virtual right.
const LEGACY_CREATE: char = 'c';
/// `d`, the RFC 2086 delete right. RFC 4314 keeps it only as a virtual right.
const LEGACY_DELETE: char = 'd';
/// `k`, create mailboxes.
const CREATE_MAILBOX: char = 'k';
/// `t`, delete messages.
const DELETE_MESSAGES: char = 't';

fn code<T: Into<AclRight>>(right: T) -> char {
    char::from(right.into())
}

/// From [section 2.1 of RFC 4314](https://datatracker.ietf.org/doc/html/rfc4314#section-2.1).
///
/// The rights an identifier holds (or may be granted) on a mailbox.
///
/// Rights come in two flavours. *Required* rights are always granted to the identifier and are
/// kept in the order the server reported them. *Optional* rights are the ones a server advertises
/// as grantable; the server may group several of them into one string (for example `"swicdkxte"`
/// in a `LISTRIGHTS` response), meaning they can only be granted or revoked together. Every
/// right in such a group is remembered along with the whole group it came from.
///
/// ```
/// # use imap_acl::RightsSet;
/// let rights = RightsSet::from_rights("lr", ["ac", "d"]);
///
/// assert_eq!(rights.get('a').as_deref(), Some("ac"));
/// assert_eq!(rights.get('d').as_deref(), Some("d"));
/// assert_eq!(rights.get('l').as_deref(), Some("l"));
/// assert_eq!(rights.get('x'), None);
/// assert_eq!(rights.to_string(), "lracd");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RightsSet {
    required: Vec<char>,
    optional: OptionalRights,
}

impl RightsSet {
    /// Build a rights set from the required rights and the optional right groups of an
    /// identifier.
    ///
    /// Each character of an optional group becomes its own right, mapped to the whole group. If
    /// two groups share a character, the later group wins.
    ///
    /// Clients conforming to RFC 4314 must ignore the virtual `c` and `d` rights once the rights
    /// that replaced them (`k` and `t`) are present, so those optional entries are dropped here.
    /// A virtual right listed among the required rights is kept.
    pub fn new<R, T, O, S>(required: R, optional: O) -> Self
    where
        R: IntoIterator<Item = T>,
        T: Into<AclRight>,
        O: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rights = RightsSet {
            required: required.into_iter().map(code).collect(),
            optional: OptionalRights::default(),
        };

        for group in optional {
            let group = group.as_ref();
            for right in group.chars() {
                rights.optional.insert(right, group.to_string());
            }
        }

        rights.normalize();
        rights
    }

    /// Build a rights set from a string of required rights and the optional right groups.
    pub fn from_rights<O, S>(required: &str, optional: O) -> Self
    where
        O: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(required.chars(), optional)
    }

    fn normalize(&mut self) {
        for (legacy, concrete) in [
            (LEGACY_CREATE, CREATE_MAILBOX),
            (LEGACY_DELETE, DELETE_MESSAGES),
        ] {
            if !(self.has_right(legacy) && self.has_right(concrete)) {
                continue;
            }
            if let Some(group) = self.optional.remove(legacy) {
                tracing::debug!(
                    right = %legacy,
                    group = %group,
                    replaced_by = %concrete,
                    "ignoring virtual ACL right"
                );
            }
        }
    }

    /// Look up a right.
    ///
    /// An optional right yields the group it belongs to. Otherwise, a required right yields
    /// itself. Rights the identifier does not hold yield `None`.
    pub fn get<T: Into<AclRight>>(&self, right: T) -> Option<Cow<'_, str>> {
        let right = code(right);
        if let Some(group) = self.optional.get(right) {
            return Some(Cow::Borrowed(group));
        }

        self.required
            .iter()
            .find(|&&r| r == right)
            .map(|r| Cow::Owned(r.to_string()))
    }

    /// Returns if the set holds the provided right (either as a char or an [`AclRight`]).
    pub fn has_right<T: Into<AclRight>>(&self, right: T) -> bool {
        self.get(right).map_or(false, |v| !v.is_empty())
    }

    /// Associate `right` with an optional right group, replacing any previous group.
    ///
    /// The required rights are left untouched.
    pub fn set<T: Into<AclRight>>(&mut self, right: T, group: impl Into<String>) {
        self.optional.insert(code(right), group.into());
    }

    /// Remove `right` from both the optional and the required rights.
    ///
    /// Removing a right that is not held does nothing.
    pub fn unset<T: Into<AclRight>>(&mut self, right: T) {
        let right = code(right);
        self.optional.remove(right);
        self.required.retain(|&r| r != right);
    }

    /// The required rights, in the order they were reported.
    pub fn required(&self) -> &[char] {
        &self.required
    }

    /// The optional rights and the groups they belong to, in insertion order.
    pub fn optional(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.optional.iter()
    }

    /// Iterate over every `(right, value)` pair: the required rights first (each mapped to
    /// itself), then the optional rights (each mapped to its group).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            rights: self,
            required: 0,
            optional: 0,
        }
    }

    /// The number of pairs [`RightsSet::iter`] yields.
    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    /// Returns true if the set holds no rights at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every distinct right in the set, required rights first, in the order each was first seen.
    pub fn to_right_codes(&self) -> Vec<char> {
        let mut codes = Vec::with_capacity(self.len());
        for right in self.required.iter().copied().chain(self.optional.keys()) {
            if !codes.contains(&right) {
                codes.push(right);
            }
        }
        codes
    }

    /// Same as [`RightsSet::to_right_codes`], as [`AclRight`]s.
    pub fn to_acl_rights(&self) -> Vec<AclRight> {
        self.to_right_codes().into_iter().map(AclRight::from).collect()
    }

    /// Encode the set in its persisted form.
    ///
    /// The encoding is a JSON object with a `required` list and an `optional` map from each
    /// optional right to its group.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    /// Restore a set from the bytes produced by [`RightsSet::to_bytes`].
    ///
    /// The virtual rights are not filtered again; persisted sets were normalized when first
    /// built.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| {
            tracing::debug!(error = %e, "discarding malformed persisted rights");
            Error::Decode(e)
        })
    }
}

impl Display for RightsSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_right_codes().into_iter().collect::<String>())
    }
}

impl<'a> IntoIterator for &'a RightsSet {
    type Item = (char, Cow<'a, str>);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A restartable cursor over the `(right, value)` pairs of a [`RightsSet`].
///
/// Created by [`RightsSet::iter`].
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    rights: &'a RightsSet,
    required: usize,
    optional: usize,
}

impl<'a> Iter<'a> {
    /// Move the cursor back to the first required right.
    pub fn reset(&mut self) {
        self.required = 0;
        self.optional = 0;
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (char, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(&right) = self.rights.required.get(self.required) {
            self.required += 1;
            return Some((right, Cow::Owned(right.to_string())));
        }

        let (right, group) = self.rights.optional.0.get(self.optional)?;
        self.optional += 1;
        Some((*right, Cow::Borrowed(group.as_str())))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rights.len() - self.required - self.optional;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

/// Optional rights in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct OptionalRights(Vec<(char, String)>);

impl OptionalRights {
    fn position(&self, right: char) -> Option<usize> {
        self.0.iter().position(|(r, _)| *r == right)
    }

    fn get(&self, right: char) -> Option<&str> {
        self.position(right).map(|i| self.0[i].1.as_str())
    }

    // An existing right keeps its position.
    fn insert(&mut self, right: char, group: String) {
        match self.position(right) {
            Some(i) => self.0[i].1 = group,
            None => self.0.push((right, group)),
        }
    }

    fn remove(&mut self, right: char) -> Option<String> {
        self.position(right).map(|i| self.0.remove(i).1)
    }

    fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().map(|(r, _)| *r)
    }

    fn iter(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.0.iter().map(|(r, g)| (*r, g.as_str()))
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for OptionalRights {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(r, g)| (r, g)))
    }
}

impl<'de> Deserialize<'de> for OptionalRights {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OptionalRightsVisitor)
    }
}

struct OptionalRightsVisitor;

impl<'de> Visitor<'de> for OptionalRightsVisitor {
    type Value = OptionalRights;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a map from single-character rights to right groups")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut rights = OptionalRights::default();
        while let Some((right, group)) = map.next_entry::<char, String>()? {
            if rights.position(right).is_some() {
                return Err(de::Error::custom(format_args!(
                    "duplicate optional right {:?}",
                    right
                )));
            }
            rights.0.push((right, group));
        }
        Ok(rights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let rights = RightsSet::from_rights("lr", ["ac", "d"]);

        assert_eq!(rights.get('a').as_deref(), Some("ac"));
        assert_eq!(rights.get('c').as_deref(), Some("ac"));
        assert_eq!(rights.get('d').as_deref(), Some("d"));
        assert_eq!(rights.get('l').as_deref(), Some("l"));
        assert_eq!(rights.get('x'), None);
        assert!(rights.has_right(AclRight::Lookup));
        assert!(!rights.has_right('x'));
    }

    #[test]
    fn test_later_group_wins() {
        let rights = RightsSet::from_rights("", ["te", "es"]);

        assert_eq!(rights.get('t').as_deref(), Some("te"));
        assert_eq!(rights.get('e').as_deref(), Some("es"));
        assert_eq!(rights.get('s').as_deref(), Some("es"));
        // 'e' keeps the slot it got from the first group
        assert_eq!(
            rights.optional().map(|(r, _)| r).collect::<String>(),
            "tes"
        );
    }

    #[test]
    fn test_virtual_rights_ignored() {
        let rights = RightsSet::from_rights("lr", ["swicdkxte"]);

        assert_eq!(rights.get('c'), None);
        assert_eq!(rights.get('d'), None);
        assert_eq!(rights.get('k').as_deref(), Some("swicdkxte"));
        assert_eq!(rights.get('t').as_deref(), Some("swicdkxte"));
        assert_eq!(rights.to_string(), "lrswikxte");
    }

    #[test]
    fn test_virtual_rights_kept_alone() {
        let rights = RightsSet::from_rights("lr", ["c", "d"]);

        assert_eq!(rights.get('c').as_deref(), Some("c"));
        assert_eq!(rights.get('d').as_deref(), Some("d"));
    }

    #[test]
    fn test_virtual_rights_only_one_pair() {
        let rights = RightsSet::from_rights("", ["ck", "d"]);

        assert_eq!(rights.get('c'), None);
        assert_eq!(rights.get('k').as_deref(), Some("ck"));
        assert_eq!(rights.get('d').as_deref(), Some("d"));
    }

    #[test]
    fn test_virtual_rights_concrete_required() {
        let rights = RightsSet::from_rights("k", ["c"]);
        assert_eq!(rights.get('c'), None);

        // only the optional entry is dropped
        let rights = RightsSet::from_rights("c", ["k"]);
        assert_eq!(rights.get('c').as_deref(), Some("c"));
        assert_eq!(rights.required(), &['c']);
    }

    #[test]
    fn test_set() {
        let mut rights = RightsSet::from_rights("lr", ["a"]);

        rights.set('w', "w");
        assert_eq!(rights.get('w').as_deref(), Some("w"));

        rights.set('w', "wi");
        assert_eq!(rights.get('w').as_deref(), Some("wi"));

        rights.set(AclRight::Lookup, "lx");
        assert_eq!(rights.get('l').as_deref(), Some("lx"));
        assert_eq!(rights.required(), &['l', 'r']);
    }

    #[test]
    fn test_set_empty_group() {
        let mut rights = RightsSet::default();
        rights.set('a', "");

        assert_eq!(rights.get('a').as_deref(), Some(""));
        assert!(!rights.has_right('a'));
    }

    #[test]
    fn test_unset() {
        let mut rights = RightsSet::from_rights("lrsr", ["rw", "a"]);

        rights.unset('r');
        assert_eq!(rights.get('r'), None);
        assert_eq!(rights.required(), &['l', 's']);
        assert_eq!(rights.optional().collect::<Vec<_>>(), vec![('w', "rw"), ('a', "a")]);

        rights.unset('x');
        assert_eq!(rights.len(), 4);
    }

    #[test]
    fn test_iter() {
        let rights = RightsSet::from_rights("lr", ["ac", "d"]);
        let pairs: Vec<(char, String)> = rights
            .iter()
            .map(|(r, v)| (r, v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ('l', "l".to_string()),
                ('r', "r".to_string()),
                ('a', "ac".to_string()),
                ('c', "ac".to_string()),
                ('d', "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_iter_reset() {
        let rights = RightsSet::from_rights("lr", ["ac"]);
        let mut iter = rights.iter();
        assert_eq!(iter.len(), 4);

        let first: Vec<_> = iter.by_ref().collect();
        assert_eq!(iter.next(), None);
        assert_eq!(iter.len(), 0);

        iter.reset();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_right_codes() {
        let rights = RightsSet::from_rights("rs", ["te", "s"]);

        assert_eq!(rights.get('s').as_deref(), Some("s"));
        assert_eq!(rights.to_right_codes(), vec!['r', 's', 't', 'e']);
        assert_eq!(rights.to_string(), "rste");
    }

    #[test]
    fn test_display() {
        assert_eq!(RightsSet::default().to_string(), "");
        assert_eq!(RightsSet::from_rights("lrl", ["sr", "w"]).to_string(), "lrsw");
    }

    #[test]
    fn test_to_right_codes_duplicate_required() {
        let rights = RightsSet::from_rights("llr", ["rl"]);

        assert_eq!(rights.to_right_codes(), vec!['l', 'r']);
        assert_eq!(
            rights.to_acl_rights(),
            vec![AclRight::Lookup, AclRight::Read]
        );
    }

    #[test]
    fn test_persisted_form() {
        let rights = RightsSet::from_rights("lr", ["ac"]);
        let bytes = rights.to_bytes().unwrap();

        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"required":["l","r"],"optional":{"a":"ac","c":"ac"}}"#
        );
        assert_eq!(RightsSet::from_bytes(&bytes).unwrap(), rights);
    }

    #[test]
    fn test_restore_skips_normalization() {
        let input = br#"{"required":[],"optional":{"c":"c","k":"k"}}"#;
        let rights = RightsSet::from_bytes(input).unwrap();

        assert_eq!(rights.get('c').as_deref(), Some("c"));
    }

    #[test]
    fn test_restore_rejects_malformed() {
        let inputs: &[&[u8]] = &[
            b"",
            br#"{"required":["l"],"optional":{"a":"a""#,
            br#"{"required":["l"]}"#,
            br#"{"optional":{}}"#,
            br#"{"required":[],"optional":{},"extra":1}"#,
            br#"{"required":["lr"],"optional":{}}"#,
            br#"{"required":[],"optional":{"ab":"ab"}}"#,
            br#"{"required":[],"optional":{"a":"a","a":"ab"}}"#,
        ];

        for input in inputs {
            let err = RightsSet::from_bytes(input).unwrap_err();
            assert!(err.is_decode(), "{:?}", String::from_utf8_lossy(input));
        }
    }
}
