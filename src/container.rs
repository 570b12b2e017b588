//! `TagContainer`: a small set of tags with hierarchical queries.

use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::TagRegistry;
use crate::tag::Tag;

/// An insertion-ordered set of tags.
///
/// A container never holds the same tag twice, and never holds [`Tag::none`].
/// Equality is set equality: two containers with the same tags in a different
/// order compare equal.
///
/// # Example
///
/// ```ignore
/// let tags = TagContainer::new()
///     .with(registry.request_tag("State.Stunned", true))
///     .with(registry.request_tag("Weapon.Ranged", true));
///
/// if tags.has_tag(&registry.request_tag("State", true), &registry) {
///     // some State.* tag is present
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct TagContainer {
    tags: Vec<Tag>,
}

impl TagContainer {
    /// Create an empty tag container.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container with a single tag.
    pub fn single(tag: Tag) -> Self {
        let mut container = Self::new();
        container.add(tag);
        container
    }

    /// Builder method: add a tag and return self.
    #[inline]
    pub fn with(mut self, tag: Tag) -> Self {
        self.add(tag);
        self
    }

    /// Add a tag to the container.
    ///
    /// Returns `true` if the tag was newly inserted. The none tag is ignored.
    pub fn add(&mut self, tag: Tag) -> bool {
        if tag.is_none() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove a tag from the container.
    ///
    /// Returns `true` if the tag was present.
    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.remove_by_name(tag.name())
    }

    /// Remove a tag by its raw name, whether or not that name is still valid.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.tags.iter().position(|t| t.name() == name) {
            Some(pos) => {
                self.tags.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Exact membership test (no hierarchy).
    #[inline]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Exact membership test by name.
    #[inline]
    pub fn contains_name(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name() == name)
    }

    /// Does any tag in the container equal `tag` or descend from it?
    ///
    /// `"A.B.C"` in the container matches a query for `"A"`, `"A.B"` and `"A.B.C"`.
    pub fn has_tag(&self, tag: &Tag, registry: &TagRegistry) -> bool {
        if tag.is_none() {
            return false;
        }
        self.tags
            .iter()
            .any(|own| own == tag || registry.tag_matches(own, tag))
    }

    /// Hierarchical match against any tag of `other`.
    pub fn has_any(&self, other: &TagContainer, registry: &TagRegistry) -> bool {
        other.iter().any(|tag| self.has_tag(tag, registry))
    }

    /// Hierarchical match against every tag of `other`. An empty `other` matches.
    pub fn has_all(&self, other: &TagContainer, registry: &TagRegistry) -> bool {
        other.iter().all(|tag| self.has_tag(tag, registry))
    }

    /// Every tag of the container together with all of its ancestors.
    pub fn parents(&self, registry: &TagRegistry) -> TagContainer {
        let mut out = TagContainer::new();
        for tag in &self.tags {
            out.add(tag.clone());
            if let Some(node) = registry.find_tag_node(tag) {
                out.extend(node.ancestors().iter().cloned());
            }
        }
        out
    }

    /// First tag in insertion order.
    #[inline]
    pub fn first(&self) -> Option<&Tag> {
        self.tags.first()
    }

    /// Iterate over all tags in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.tags.iter()
    }

    /// Get the number of tags in the container.
    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if the container is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Clear all tags from the container.
    #[inline]
    pub fn clear(&mut self) {
        self.tags.clear();
    }

    /// Borrow the tags as a slice, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }
}

impl PartialEq for TagContainer {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.tags.iter().all(|t| other.contains(t))
    }
}

impl Eq for TagContainer {}

impl<'de> Deserialize<'de> for TagContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Tag>::deserialize(deserializer)?.into_iter().collect())
    }
}

impl FromIterator<Tag> for TagContainer {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        let mut container = Self::new();
        container.extend(iter);
        container
    }
}

impl Extend<Tag> for TagContainer {
    fn extend<T: IntoIterator<Item = Tag>>(&mut self, iter: T) {
        for tag in iter {
            self.add(tag);
        }
    }
}

impl IntoIterator for TagContainer {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

impl<'a> IntoIterator for &'a TagContainer {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Tag {
        Tag::unchecked(name)
    }

    #[test]
    fn tag_container_builder() {
        let container = TagContainer::new().with(tag("A")).with(tag("B")).with(tag("C"));

        assert_eq!(container.len(), 3);
        assert!(container.contains(&tag("A")));
        assert!(container.contains(&tag("B")));
        assert!(container.contains(&tag("C")));
        assert!(!container.contains(&tag("D")));
    }

    #[test]
    fn tag_container_add_remove() {
        let mut container = TagContainer::new();

        assert!(container.add(tag("A")));
        assert!(!container.add(tag("A"))); // duplicate
        assert!(!container.add(Tag::none()));
        assert_eq!(container.len(), 1);

        assert!(container.remove(&tag("A")));
        assert!(!container.remove(&tag("A"))); // already removed
        assert!(container.is_empty());
    }

    #[test]
    fn equality_ignores_order() {
        let a: TagContainer = [tag("A"), tag("B")].into_iter().collect();
        let b: TagContainer = [tag("B"), tag("A")].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, TagContainer::single(tag("A")));
    }

    #[test]
    fn tag_container_extend_dedups() {
        let mut container = TagContainer::single(tag("A"));
        container.extend([tag("B"), tag("A"), tag("C")]);
        assert_eq!(container.len(), 3);
        assert_eq!(container.as_slice(), &[tag("A"), tag("B"), tag("C")]);
    }

    #[test]
    fn remove_by_name_works_for_stale_names() {
        let mut container = TagContainer::single(tag("Old.Name"));
        assert!(container.remove_by_name("Old.Name"));
        assert!(container.is_empty());
    }

    #[test]
    fn deserialize_drops_duplicates() {
        let container: TagContainer = serde_json::from_str(r#"["A", "B", "A", ""]"#).unwrap();
        assert_eq!(container.as_slice(), &[tag("A"), tag("B")]);
    }

    #[test]
    fn tag_container_clear() {
        let mut container = TagContainer::new().with(tag("A")).with(tag("B"));
        container.clear();
        assert!(container.is_empty());
    }
}
