//! Union types: an ordered set of classes and base-type tags usable wherever
//! a single type is expected, for property assignment or dispatch.

use crate::class::ClassId;
use crate::value::BaseType;

/// One member of a union: a declared class or a base-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnionMember {
    Class(ClassId),
    Base(BaseType),
}

/// An ordered, duplicate-free set of union members.
///
/// Nested unions flatten at construction; member order is first-occurrence
/// order, which is preserved when a union signature expands into method
/// table entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSpec {
    members: Vec<UnionMember>,
}

impl UnionSpec {
    pub fn new(members: impl IntoIterator<Item = UnionMember>) -> Self {
        let mut seen = Vec::new();
        for member in members {
            if !seen.contains(&member) {
                seen.push(member);
            }
        }
        Self { members: seen }
    }

    /// Merge another union into this one, keeping first-occurrence order.
    pub fn extend(mut self, other: &UnionSpec) -> Self {
        for member in &other.members {
            if !self.members.contains(member) {
                self.members.push(*member);
            }
        }
        self
    }

    pub fn members(&self) -> &[UnionMember] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, member: UnionMember) -> bool {
        self.members.contains(&member)
    }

    /// True when every member of `self` is literally a member of `other`.
    /// Class hierarchy is not consulted; see
    /// [`PropertyType::is_compatible_override`](crate::property::PropertyType::is_compatible_override)
    /// for the hierarchy-aware narrowing check.
    pub fn is_subset_of(&self, other: &UnionSpec) -> bool {
        self.members.iter().all(|m| other.contains(*m))
    }
}

impl From<UnionMember> for UnionSpec {
    fn from(member: UnionMember) -> Self {
        UnionSpec::new([member])
    }
}
