/*!
 * Capability Sets
 * Immutable bitmask over the closed permission universe
 */

use super::types::{Permission, UnknownPermission};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

/// Mask of every bit that names a real category
const UNIVERSE: u16 = {
    let mut mask = 0u16;
    let mut i = 0;
    while i < Permission::ALL.len() {
        mask |= Permission::ALL[i].bit();
        i += 1;
    }
    mask
};

/// Set of granted sensitive-operation categories
///
/// Pure value type: combining sets never mutates either operand. Frames on a
/// call path combine by [`intersect`](Self::intersect); grants for the same
/// unit merge by [`union`](Self::union).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct CapabilitySet(u16);

impl CapabilitySet {
    /// Grant-none
    pub const NONE: Self = Self(0);

    /// Grant-all
    pub const ALL: Self = Self(UNIVERSE);

    /// Build from raw bits, dropping any bit outside the universe
    #[inline]
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & UNIVERSE)
    }

    /// Raw bits
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True if the set grants the category
    #[inline]
    #[must_use]
    pub const fn implies(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// True if every category of `required` is granted
    #[inline]
    #[must_use]
    pub const fn contains(self, required: CapabilitySet) -> bool {
        self.0 & required.0 == required.0
    }

    #[inline]
    #[must_use]
    pub const fn intersect(self, other: CapabilitySet) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    #[must_use]
    pub const fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    /// Categories in `self` that `other` lacks
    #[inline]
    #[must_use]
    pub const fn difference(self, other: CapabilitySet) -> Self {
        Self(self.0 & !other.0)
    }

    /// Copy of the set with one more category
    #[inline]
    #[must_use]
    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    /// Copy of the set with one category removed
    #[inline]
    #[must_use]
    pub const fn without(self, permission: Permission) -> Self {
        Self(self.0 & !permission.bit())
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_all(self) -> bool {
        self.0 == UNIVERSE
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Granted categories in declaration order
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.implies(*p))
    }

    /// Lowest granted category
    pub fn first(self) -> Option<Permission> {
        self.iter().next()
    }
}

impl From<Permission> for CapabilitySet {
    fn from(permission: Permission) -> Self {
        Self(permission.bit())
    }
}

impl FromIterator<Permission> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, CapabilitySet::with)
    }
}

impl From<Vec<Permission>> for CapabilitySet {
    fn from(permissions: Vec<Permission>) -> Self {
        permissions.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Permission> {
    fn from(set: CapabilitySet) -> Self {
        set.iter().collect()
    }
}

impl BitAnd for CapabilitySet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersect(rhs)
    }
}

impl BitOr for CapabilitySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<Permission> for CapabilitySet {
    type Output = Self;

    fn bitor(self, rhs: Permission) -> Self {
        self.with(rhs)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("ALL");
        }
        if self.is_empty() {
            return f.write_str("NONE");
        }
        f.write_str("{")?;
        for (i, p) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(p.as_str())?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilitySet({})", self)
    }
}

/// Parses `all`, `none`, or a comma-separated list of permission names
impl FromStr for CapabilitySet {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::ALL),
            "none" | "" => Ok(Self::NONE),
            list => list
                .split(',')
                .filter(|part| !part.trim().is_empty())
                .map(str::parse::<Permission>)
                .collect(),
        }
    }
}
