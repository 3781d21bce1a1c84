//! Domain models for metadata types and their members.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ApiVersionError;

/// Member sentinel meaning "every member of this type".
pub const WILDCARD: &str = "*";

/// Mapping from metadata type name to the set of member identifiers.
///
/// Type names are unique and iterate in ascending order. Members are deduplicated and also
/// iterate ascending, which is the order every rendered manifest uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeSet {
    types: BTreeMap<String, BTreeSet<String>>,
}

impl TypeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct type names.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Replace the members of `type_name` with `members`.
    pub fn insert_type<I, S>(&mut self, type_name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.insert(
            type_name.into(),
            members.into_iter().map(Into::into).collect(),
        );
    }

    /// Add a single member, creating the type entry when absent. Returns `true` if the member was
    /// not present before.
    pub fn add_member(&mut self, type_name: &str, member: impl Into<String>) -> bool {
        self.types
            .entry(type_name.to_owned())
            .or_default()
            .insert(member.into())
    }

    /// Remove a single member. The type entry is kept even when it becomes empty.
    pub fn remove_member(&mut self, type_name: &str, member: &str) -> bool {
        self.types
            .get_mut(type_name)
            .is_some_and(|members| members.remove(member))
    }

    /// Drop a type and all of its members.
    pub fn remove_type(&mut self, type_name: &str) -> bool {
        self.types.remove(type_name).is_some()
    }

    pub fn contains_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn contains_member(&self, type_name: &str, member: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|members| members.contains(member))
    }

    /// Members of `type_name`, if the type is present.
    pub fn members(&self, type_name: &str) -> Option<&BTreeSet<String>> {
        self.types.get(type_name)
    }

    /// Whether the type lists the wildcard member.
    pub fn has_wildcard(&self, type_name: &str) -> bool {
        self.contains_member(type_name, WILDCARD)
    }

    /// Iterate `(type, members)` pairs in ascending type order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, BTreeSet<String>> {
        self.types.iter()
    }

    /// Union of two sets, per type. Types present on only one side pass through unchanged.
    pub fn merge(a: &TypeSet, b: &TypeSet) -> TypeSet {
        let mut merged = a.clone();
        merged.merge_from(b);
        merged
    }

    /// In-place variant of [`TypeSet::merge`] used by accumulators.
    pub fn merge_from(&mut self, other: &TypeSet) {
        for (type_name, members) in other.iter() {
            self.types
                .entry(type_name.clone())
                .or_default()
                .extend(members.iter().cloned());
        }
    }

    /// A type is fully selected when this selection lists as many members for it as the
    /// universe does. Absent types are never fully selected.
    pub fn is_fully_selected(&self, type_name: &str, universe: &TypeSet) -> bool {
        match self.members(type_name) {
            Some(selected) => {
                let available = universe.members(type_name).map_or(0, BTreeSet::len);
                selected.len() == available
            }
            None => false,
        }
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = (&'a String, &'a BTreeSet<String>);
    type IntoIter = btree_map::Iter<'a, String, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, I, S> FromIterator<(K, I)> for TypeSet
where
    K: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut set = TypeSet::new();
        for (type_name, members) in iter {
            let entry = set.types.entry(type_name.into()).or_default();
            entry.extend(members.into_iter().map(Into::into));
        }
        set
    }
}

/// Metadata API version a manifest targets, rendered as `52.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawApiVersion", into = "u32")]
pub struct ApiVersion(u32);

impl ApiVersion {
    pub const fn new(major: u32) -> Self {
        Self(major)
    }

    pub fn major(self) -> u32 {
        self.0
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self(52)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.0", self.0)
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let major = trimmed
            .strip_suffix(".0")
            .unwrap_or(trimmed)
            .parse::<u32>()
            .map_err(|_| ApiVersionError(value.to_owned()))?;
        Ok(Self(major))
    }
}

impl From<ApiVersion> for u32 {
    fn from(value: ApiVersion) -> Self {
        value.0
    }
}

/// Config files may spell the version as `52`, `52.0` or `"52.0"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawApiVersion {
    Integer(u32),
    Decimal(f64),
    Text(String),
}

impl TryFrom<RawApiVersion> for ApiVersion {
    type Error = ApiVersionError;

    fn try_from(raw: RawApiVersion) -> Result<Self, Self::Error> {
        match raw {
            RawApiVersion::Integer(major) => Ok(Self(major)),
            RawApiVersion::Decimal(value)
                if value.is_finite() && value >= 0.0 && value.fract() == 0.0 =>
            {
                Ok(Self(value as u32))
            }
            RawApiVersion::Decimal(value) => Err(ApiVersionError(value.to_string())),
            RawApiVersion::Text(text) => text.parse(),
        }
    }
}
