//! Read-only queries over a built registry.
//!
//! Absence is always the none tag or an empty container, never an error.

use crate::container::TagContainer;
use crate::diagnostics::DiagnosticKind;
use crate::node::{NodeId, TagNode};
use crate::registry::TagRegistry;
use crate::tag::{TAG_SEPARATOR, Tag};

/// Which explicit descendants [`TagRegistry::direct_descendants_in_dictionary`]
/// returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagSelection {
    #[default]
    All,
    RestrictedOnly,
    NonRestrictedOnly,
}

impl TagSelection {
    fn accepts(self, node: &TagNode) -> bool {
        match self {
            Self::All => true,
            Self::RestrictedOnly => node.is_restricted(),
            Self::NonRestrictedOnly => !node.is_restricted(),
        }
    }
}

/// Provenance and flags of one tag, for tooling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEditorData {
    pub comment: String,
    pub source_name: Option<String>,
    pub is_explicit: bool,
    pub is_restricted: bool,
    pub allow_non_restricted_children: bool,
}

impl TagRegistry {
    /// Tag for `name` if it is in the tree.
    ///
    /// With `error_if_not_found`, the first miss for each distinct name is
    /// reported as [`DiagnosticKind::MissingTag`]; repeats are silent.
    pub fn request_tag(&self, name: &str, error_if_not_found: bool) -> Tag {
        let first_miss = {
            let mut maps = self.maps.lock();
            if let Some((key, _)) = maps.nodes.get_key_value(name) {
                return Tag::from_smol(key.clone());
            }
            error_if_not_found && maps.missing.insert(name.into())
        };
        if first_miss {
            self.diagnostics.error(
                DiagnosticKind::MissingTag,
                name,
                format!("requested tag '{name}' was not found"),
            );
        }
        Tag::none()
    }

    /// Request each of `names` (trimmed) and collect the valid ones.
    pub fn request_tag_container<I, S>(&self, names: I, error_if_not_found: bool) -> TagContainer
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.request_tag(name.as_ref().trim(), error_if_not_found))
            .collect()
    }

    /// `true` if `tag` names a node of the tree, explicit or implicit.
    pub fn is_valid(&self, tag: &Tag) -> bool {
        !tag.is_none() && self.find_node(tag.name()).is_some()
    }

    /// `true` if `name` was explicitly registered by some source.
    pub fn is_dictionary_tag(&self, name: &str) -> bool {
        self.find_node(name)
            .and_then(|id| self.node(id))
            .is_some_and(TagNode::is_explicit)
    }

    /// The tag and all of its ancestors; empty for an unknown tag.
    pub fn parents(&self, tag: &Tag) -> TagContainer {
        self.find_tag_node(tag)
            .map(|node| node.ancestors().clone())
            .unwrap_or_default()
    }

    /// `true` if `tag` is `own` or one of its ancestors. Reads the
    /// precomputed ancestor container without copying it.
    pub fn tag_matches(&self, own: &Tag, tag: &Tag) -> bool {
        self.find_tag_node(own)
            .is_some_and(|node| node.ancestors().contains(tag))
    }

    /// Children of `tag`, or every descendant when `recursive` (depth first,
    /// each child before its own descendants).
    pub fn children(&self, tag: &Tag, recursive: bool) -> TagContainer {
        let mut out = TagContainer::new();
        if let Some(id) = self.node_id(tag) {
            self.collect_children(id, recursive, false, &mut out);
        }
        out
    }

    /// Every explicit descendant of `tag`.
    pub fn children_in_dictionary(&self, tag: &Tag) -> TagContainer {
        let mut out = TagContainer::new();
        if let Some(id) = self.node_id(tag) {
            self.collect_children(id, true, true, &mut out);
        }
        out
    }

    /// Nearest explicit descendants of `tag`: explicit children, plus the
    /// first explicit nodes below each implicit child.
    pub fn direct_descendants_in_dictionary(
        &self,
        tag: &Tag,
        selection: TagSelection,
    ) -> TagContainer {
        let mut out = TagContainer::new();
        let Some(id) = self.node_id(tag) else {
            return out;
        };
        let mut stack: Vec<NodeId> = self.nodes[id.index()]
            .children()
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(child) = stack.pop() {
            let node = &self.nodes[child.index()];
            if node.is_explicit() {
                if selection.accepts(node) {
                    out.add(node.tag().clone());
                }
            } else {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Immediate parent tag; none for top-level or unknown tags.
    pub fn direct_parent(&self, tag: &Tag) -> Tag {
        self.find_tag_node(tag)
            .and_then(TagNode::parent)
            .and_then(|p| self.node(p))
            .map(|p| p.tag().clone())
            .unwrap_or_default()
    }

    /// Number of ancestor tags (self included) shared by `a` and `b`.
    pub fn match_depth(&self, a: &Tag, b: &Tag) -> usize {
        let (Some(a), Some(b)) = (self.find_tag_node(a), self.find_tag_node(b)) else {
            return 0;
        };
        a.ancestors()
            .iter()
            .filter(|t| b.ancestors().contains(t))
            .count()
    }

    /// Every node's tag, depth first with siblings sorted; only explicit
    /// nodes when `dictionary_only`.
    pub fn all_tags(&self, dictionary_only: bool) -> TagContainer {
        let mut out = TagContainer::new();
        self.collect_children(NodeId::ROOT, true, dictionary_only, &mut out);
        out
    }

    /// Top-level tags.
    pub fn root_tags(&self) -> TagContainer {
        self.root()
            .children()
            .iter()
            .map(|&id| self.nodes[id.index()].tag().clone())
            .collect()
    }

    /// Exact match, otherwise the shortest tag containing `partial`
    /// (first in [`all_tags`](Self::all_tags) order on ties).
    pub fn find_tag_from_partial_string(&self, partial: &str) -> Tag {
        if partial.is_empty() {
            return Tag::none();
        }
        if let Some(id) = self.find_node(partial) {
            return self.nodes[id.index()].tag().clone();
        }
        let mut best: Option<Tag> = None;
        for tag in self.all_tags(false) {
            if tag.name().contains(partial)
                && best.as_ref().is_none_or(|b| tag.name().len() < b.name().len())
            {
                best = Some(tag);
            }
        }
        best.unwrap_or_default()
    }

    /// Root tags selected by a comma-separated filter.
    ///
    /// Each filter is replaced by the categories of every matching
    /// `category_remapping` entry, duplicates dropped. Filters naming a tag
    /// in the tree select that tag; when nothing is selected, every root tag
    /// is returned.
    pub fn filtered_root_tags(&self, filter: &str) -> TagContainer {
        let mut filters: Vec<&str> = Vec::new();
        for part in filter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut remapped = false;
            for remap in self
                .settings
                .category_remapping
                .iter()
                .filter(|remap| remap.base_category == part)
            {
                remapped = true;
                for category in &remap.remap_categories {
                    if !filters.contains(&category.as_str()) {
                        filters.push(category.as_str());
                    }
                }
            }
            if !remapped && !filters.contains(&part) {
                filters.push(part);
            }
        }

        let selected: TagContainer = filters
            .into_iter()
            .filter_map(|name| self.find_node(name))
            .map(|id| self.nodes[id.index()].tag().clone())
            .collect();
        if selected.is_empty() {
            self.root_tags()
        } else {
            selected
        }
    }

    /// Tags explicitly registered by `source`.
    pub fn all_tags_from_source(&self, source: &str) -> TagContainer {
        self.node_ids()
            .map(|id| &self.nodes[id.index()])
            .filter(|node| node.explicit_sources().any(|s| s == source))
            .map(|node| node.tag().clone())
            .collect()
    }

    /// Segments of a valid tag's name (`"A.B.C"` → `["A", "B", "C"]`).
    pub fn split_tag_name(&self, tag: &Tag) -> Vec<String> {
        if !self.is_valid(tag) {
            return Vec::new();
        }
        tag.name().split(TAG_SEPARATOR).map(str::to_string).collect()
    }

    /// Comment, source and flags of `name`, if it is in the tree.
    pub fn tag_editor_data(&self, name: &str) -> Option<TagEditorData> {
        let node = self.find_node(name).and_then(|id| self.node(id))?;
        Some(TagEditorData {
            comment: node.dev_comment().to_string(),
            source_name: node.source_name().map(str::to_string),
            is_explicit: node.is_explicit(),
            is_restricted: node.is_restricted(),
            allow_non_restricted_children: node.allows_non_restricted_children(),
        })
    }

    fn node_id(&self, tag: &Tag) -> Option<NodeId> {
        if tag.is_none() {
            return None;
        }
        self.find_node(tag.name())
    }

    fn collect_children(
        &self,
        id: NodeId,
        recursive: bool,
        explicit_only: bool,
        out: &mut TagContainer,
    ) {
        for &child in self.nodes[id.index()].children() {
            let node = &self.nodes[child.index()];
            if !explicit_only || node.is_explicit() {
                out.add(node.tag().clone());
            }
            if recursive {
                self.collect_children(child, true, explicit_only, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, Diagnostics};
    use crate::settings::{CategoryRemap, TagSettings};
    use crate::source::{RestrictedTagRow, TagRow, TagSources};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn tag(name: &str) -> Tag {
        Tag::unchecked(name)
    }

    fn tags(container: &TagContainer) -> Vec<&str> {
        container.iter().map(Tag::name).collect()
    }

    fn registry_with(
        settings: TagSettings,
        sources: TagSources,
    ) -> (TagRegistry, Arc<CollectingSink>) {
        let sink = CollectingSink::new();
        let mut registry = TagRegistry::new(settings)
            .with_diagnostics(Diagnostics::silent())
            .with_sink(sink.clone());
        registry.initialize(sources);
        (registry, sink)
    }

    fn sample() -> TagRegistry {
        registry_with(
            TagSettings::default(),
            TagSources::new().with_default_tags([
                "Color.Red",
                "Color.Blue",
                "Color",
                "Weapon.Ranged.Sniper",
                "Weapon.Ranged.Pistol",
                "Weapon.Melee",
            ]),
        )
        .0
    }

    #[test]
    fn basic_hierarchy() {
        let reg = sample();
        let children = reg.children(&tag("Color"), false);
        assert_eq!(children, [tag("Color.Red"), tag("Color.Blue")].into_iter().collect());
        assert_eq!(tags(&reg.parents(&tag("Color.Red"))), vec!["Color.Red", "Color"]);
        assert!(reg.is_dictionary_tag("Color"));
    }

    #[test]
    fn recursive_children_depth_first() {
        let reg = sample();
        assert_eq!(
            tags(&reg.children(&tag("Weapon"), true)),
            vec![
                "Weapon.Melee",
                "Weapon.Ranged",
                "Weapon.Ranged.Pistol",
                "Weapon.Ranged.Sniper"
            ]
        );
        assert_eq!(
            tags(&reg.children_in_dictionary(&tag("Weapon"))),
            vec!["Weapon.Melee", "Weapon.Ranged.Pistol", "Weapon.Ranged.Sniper"]
        );
    }

    #[test]
    fn all_tags_dictionary_only() {
        let (reg, _) = registry_with(
            TagSettings::default(),
            TagSources::new().with_default_tags(["A.B.C"]),
        );
        assert_eq!(tags(&reg.all_tags(true)), vec!["A.B.C"]);
        assert_eq!(tags(&reg.all_tags(false)), vec!["A", "A.B", "A.B.C"]);
    }

    #[test]
    fn request_tag_reports_first_miss_only() {
        let (reg, sink) =
            registry_with(TagSettings::default(), TagSources::new().with_default_tags(["A"]));

        assert_eq!(reg.request_tag("A", true), tag("A"));
        assert!(reg.request_tag("Missing", false).is_none());
        assert_eq!(sink.count(DiagnosticKind::MissingTag), 0);

        for _ in 0..3 {
            assert!(reg.request_tag("Missing", true).is_none());
        }
        reg.request_tag("Other", true);
        assert_eq!(sink.count(DiagnosticKind::MissingTag), 2);
    }

    #[test]
    fn request_container_trims_and_skips() {
        let reg = sample();
        let container = reg.request_tag_container([" Color.Red", "Nope", "Weapon "], false);
        assert_eq!(tags(&container), vec!["Color.Red", "Weapon"]);
    }

    #[test]
    fn direct_parent() {
        let reg = sample();
        assert_eq!(reg.direct_parent(&tag("Weapon.Ranged.Sniper")), tag("Weapon.Ranged"));
        assert!(reg.direct_parent(&tag("Weapon")).is_none());
        assert!(reg.direct_parent(&tag("Unknown.Tag")).is_none());
    }

    #[rstest]
    #[case("Weapon.Ranged.Sniper", "Weapon.Ranged.Pistol", 2)]
    #[case("Weapon.Ranged", "Weapon.Ranged", 2)]
    #[case("Weapon.Melee", "Color.Red", 0)]
    #[case("Weapon", "Weapon.Ranged.Sniper", 1)]
    #[case("Unknown", "Weapon", 0)]
    fn match_depth(#[case] a: &str, #[case] b: &str, #[case] depth: usize) {
        let reg = sample();
        assert_eq!(reg.match_depth(&tag(a), &tag(b)), depth);
    }

    #[rstest]
    #[case("Color.Red", "Color.Red")]
    #[case("Red", "Color.Red")]
    #[case("Ranged", "Weapon.Ranged")]
    #[case("Sn", "Weapon.Ranged.Sniper")]
    #[case("o", "Color")]
    #[case("zzz", "")]
    fn partial_string(#[case] partial: &str, #[case] expected: &str) {
        let reg = sample();
        assert_eq!(reg.find_tag_from_partial_string(partial).name(), expected);
    }

    #[test]
    fn direct_descendants_look_through_implicit_nodes() {
        let (reg, _) = registry_with(
            TagSettings::default(),
            TagSources::new()
                .with_restricted(
                    "Core.toml",
                    vec![RestrictedTagRow::new("Root.Locked", "", true)],
                )
                .with_default_tags(["Root.Open", "Root.Group.Deep", "Root.Group.Deep.Deeper"]),
        );
        let root = tag("Root");
        assert_eq!(
            tags(&reg.direct_descendants_in_dictionary(&root, TagSelection::All)),
            vec!["Root.Group.Deep", "Root.Locked", "Root.Open"]
        );
        assert_eq!(
            tags(&reg.direct_descendants_in_dictionary(&root, TagSelection::RestrictedOnly)),
            vec!["Root.Locked"]
        );
        assert_eq!(
            tags(&reg.direct_descendants_in_dictionary(&root, TagSelection::NonRestrictedOnly)),
            vec!["Root.Group.Deep", "Root.Open"]
        );
    }

    #[test]
    fn filtered_root_tags_with_remap() {
        let settings = TagSettings {
            category_remapping: vec![CategoryRemap {
                base_category: "Gear".into(),
                remap_categories: vec!["Weapon".into(), "Armor".into()],
            }],
            ..TagSettings::default()
        };
        let (reg, _) = registry_with(
            settings,
            TagSources::new().with_default_tags(["Weapon.Melee", "Armor.Plate", "Color.Red"]),
        );

        assert_eq!(tags(&reg.filtered_root_tags("Gear")), vec!["Weapon", "Armor"]);
        assert_eq!(
            tags(&reg.filtered_root_tags("Color, Weapon.Melee")),
            vec!["Color", "Weapon.Melee"]
        );
        assert_eq!(tags(&reg.filtered_root_tags("")), vec!["Armor", "Color", "Weapon"]);
        assert_eq!(tags(&reg.filtered_root_tags("Nothing")), vec!["Armor", "Color", "Weapon"]);
    }

    #[test]
    fn filtered_root_tags_merge_every_matching_remap() {
        let settings = TagSettings {
            category_remapping: vec![
                CategoryRemap {
                    base_category: "Gear".into(),
                    remap_categories: vec!["Weapon".into(), "Armor".into()],
                },
                CategoryRemap {
                    base_category: "Gear".into(),
                    remap_categories: vec!["Armor".into(), "Color".into()],
                },
            ],
            ..TagSettings::default()
        };
        let (reg, _) = registry_with(
            settings,
            TagSources::new().with_default_tags(["Weapon.Melee", "Armor.Plate", "Color.Red"]),
        );

        assert_eq!(tags(&reg.filtered_root_tags("Gear")), vec!["Weapon", "Armor", "Color"]);
        assert_eq!(tags(&reg.filtered_root_tags("Gear, Armor")), vec!["Weapon", "Armor", "Color"]);
    }

    #[test]
    fn tag_matches_walks_ancestors() {
        let reg = sample();
        let sniper = tag("Weapon.Ranged.Sniper");
        assert!(reg.tag_matches(&sniper, &tag("Weapon")));
        assert!(reg.tag_matches(&sniper, &sniper));
        assert!(!reg.tag_matches(&sniper, &tag("Weapon.Melee")));
        assert!(!reg.tag_matches(&tag("Unknown"), &tag("Unknown")));
    }

    #[test]
    fn source_queries() {
        let (reg, _) = registry_with(
            TagSettings::default(),
            TagSources::new()
                .with_default_tags(["A"])
                .with_tag_list(
                    "Extra.toml",
                    vec![TagRow::new("B.C", "extra comment"), TagRow::new("A", "")],
                ),
        );
        assert_eq!(tags(&reg.all_tags_from_source("Extra.toml")), vec!["A", "B.C"]);

        let data = reg.tag_editor_data("B.C").unwrap();
        assert_eq!(data.comment, "extra comment");
        assert_eq!(data.source_name.as_deref(), Some("Extra.toml"));
        assert!(data.is_explicit);
        assert!(!data.is_restricted);
        assert!(!reg.tag_editor_data("B").unwrap().is_explicit);
        assert!(reg.tag_editor_data("Nope").is_none());

        assert_eq!(reg.split_tag_name(&tag("B.C")), vec!["B", "C"]);
        assert!(reg.split_tag_name(&tag("X.Y")).is_empty());
        assert_eq!(tags(&reg.root_tags()), vec!["A", "B"]);
    }

    #[test]
    fn queries_before_initialize_are_empty() {
        let reg = TagRegistry::new(TagSettings::default()).with_diagnostics(Diagnostics::silent());
        assert!(reg.request_tag("A", false).is_none());
        assert!(reg.parents(&tag("A")).is_empty());
        assert!(reg.all_tags(false).is_empty());
        assert!(reg.find_tag_from_partial_string("A").is_none());
    }
}
