//! `TagNode`: one segment of the tag hierarchy, stored in the registry arena.

use smol_str::SmolStr;

use crate::container::TagContainer;
use crate::net_index::TagNetIndex;
use crate::tag::Tag;

/// Index of a node in the registry arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The synthetic root. It carries no tag and is never in the name map.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Conflict markers set during construction. Tooling reads them; nothing in
/// the core changes behavior because of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConflictFlags {
    /// This node was registered incompatibly by more than one source.
    pub node: bool,
    /// Some ancestor of this node has a conflict.
    pub ancestor: bool,
    /// Some descendant of this node has a conflict.
    pub descendant: bool,
}

impl ConflictFlags {
    pub fn any(&self) -> bool {
        self.node || self.ancestor || self.descendant
    }
}

/// A node in the hierarchical tag tree.
///
/// Children are kept sorted by simple name. `ancestors` holds the node's own
/// tag followed by every ancestor tag up to (not including) the root.
#[derive(Clone, Debug)]
pub struct TagNode {
    pub(crate) simple_name: SmolStr,
    pub(crate) tag: Tag,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) ancestors: TagContainer,
    pub(crate) is_explicit: bool,
    pub(crate) is_restricted: bool,
    pub(crate) allow_non_restricted_children: bool,
    /// First restricted source that explicitly registered this node.
    pub(crate) restricted_by: Option<SmolStr>,
    pub(crate) source_name: Option<SmolStr>,
    pub(crate) dev_comment: String,
    /// Every source that explicitly registered this node, in load order.
    pub(crate) explicit_sources: Vec<SmolStr>,
    pub(crate) conflict: ConflictFlags,
    pub(crate) net_index: TagNetIndex,
}

impl TagNode {
    pub(crate) fn root() -> Self {
        Self {
            simple_name: SmolStr::default(),
            tag: Tag::none(),
            parent: None,
            children: Vec::new(),
            ancestors: TagContainer::new(),
            is_explicit: false,
            is_restricted: false,
            allow_non_restricted_children: true,
            restricted_by: None,
            source_name: None,
            dev_comment: String::new(),
            explicit_sources: Vec::new(),
            conflict: ConflictFlags::default(),
            net_index: crate::net_index::INVALID_TAG_NET_INDEX,
        }
    }

    /// Build a child node; `parent_ancestors` is the parent's ancestor
    /// container (empty when the parent is the root).
    pub(crate) fn new_child(
        simple_name: &str,
        complete_name: &str,
        parent: NodeId,
        parent_ancestors: &TagContainer,
    ) -> Self {
        let tag = Tag::unchecked(complete_name);
        let mut ancestors = TagContainer::single(tag.clone());
        ancestors.extend(parent_ancestors.iter().cloned());
        Self {
            simple_name: SmolStr::new(simple_name),
            tag,
            parent: if parent == NodeId::ROOT { None } else { Some(parent) },
            ancestors,
            ..Self::root()
        }
    }

    /// Last path segment (`"C"` for `"A.B.C"`).
    #[inline]
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// The complete tag.
    #[inline]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Full dotted path.
    #[inline]
    pub fn complete_name(&self) -> &str {
        self.tag.name()
    }

    /// Parent node, `None` for top-level tags.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children sorted by simple name.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// This tag plus every ancestor tag.
    #[inline]
    pub fn ancestors(&self) -> &TagContainer {
        &self.ancestors
    }

    /// Registered by some source under exactly this name.
    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.is_explicit
    }

    #[inline]
    pub fn is_restricted(&self) -> bool {
        self.is_restricted
    }

    #[inline]
    pub fn allows_non_restricted_children(&self) -> bool {
        self.allow_non_restricted_children
    }

    /// The restricted source that owns this tag, if any registered it by name.
    #[inline]
    pub fn restricted_by(&self) -> Option<&str> {
        self.restricted_by.as_deref()
    }

    /// First source to touch this node (Native overrides).
    #[inline]
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    #[inline]
    pub fn dev_comment(&self) -> &str {
        &self.dev_comment
    }

    /// Sources that explicitly registered this node, in load order.
    pub fn explicit_sources(&self) -> impl Iterator<Item = &str> {
        self.explicit_sources.iter().map(SmolStr::as_str)
    }

    #[inline]
    pub fn conflict(&self) -> ConflictFlags {
        self.conflict
    }

    /// Assigned net index, or [`INVALID_TAG_NET_INDEX`](crate::INVALID_TAG_NET_INDEX).
    #[inline]
    pub fn net_index(&self) -> TagNetIndex {
        self.net_index
    }
}
