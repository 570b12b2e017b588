//! `Tag`: an interned, dotted-path tag name.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Hierarchy separator used in complete tag names.
pub const TAG_SEPARATOR: char = '.';

/// A single gameplay tag, identified by its complete dotted name
/// (e.g. `"Weapon.Ranged.Sniper"`).
///
/// A `Tag` is a plain value: it does not know whether its name is present in a
/// [`TagRegistry`](crate::TagRegistry). Tags handed out by the registry are
/// always valid at the time they are returned; the empty tag ([`Tag::none`])
/// is the "absent" sentinel.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(SmolStr);

impl Tag {
    /// The empty, never-valid tag.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap a name without consulting any registry.
    ///
    /// Use this for names coming from persisted data that still need to go
    /// through [`TagRegistry::resolve_tag`](crate::TagRegistry::resolve_tag)
    /// or a container redirect pass. Game code should use
    /// [`TagRegistry::request_tag`](crate::TagRegistry::request_tag).
    #[inline]
    pub fn unchecked(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    /// The complete dotted name.
    #[inline]
    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub(crate) fn from_smol(name: SmolStr) -> Self {
        Self(name)
    }

    #[inline]
    pub(crate) fn smol(&self) -> &SmolStr {
        &self.0
    }

    /// `true` for the empty sentinel.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments in the name (`"A.B.C"` → 3, none → 0).
    pub fn segment_count(&self) -> usize {
        if self.is_none() {
            0
        } else {
            self.0.split(TAG_SEPARATOR).count()
        }
    }

    /// Last segment of the name (`"A.B.C"` → `"C"`).
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit_once(TAG_SEPARATOR)
            .map_or(self.0.as_str(), |(_, last)| last)
    }

    /// Name of the textual parent (`"A.B.C"` → `"A.B"`), without registry lookup.
    pub fn parent_name(&self) -> Option<&str> {
        self.0.rsplit_once(TAG_SEPARATOR).map(|(parent, _)| parent)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("Tag(None)")
        } else {
            write!(f, "Tag({})", self.0)
        }
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
