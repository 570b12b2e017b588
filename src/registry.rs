//! Tag registry: owns the tag tree, the name map and the redirect table.
//!
//! The tree is an arena: every [`TagNode`] lives in one `Vec`, index 0 is the
//! synthetic root, and parent/child links are [`NodeId`]s. The flat
//! name → node map and the redirect map sit behind one narrow mutex so a
//! worker thread can resolve names while the owner thread finishes building.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Diagnostics};
use crate::events::TagEvents;
use crate::net_index::{NetIndexAssigner, NetIndexTable};
use crate::node::{NodeId, TagNode};
use crate::replication::ReplicationStats;
use crate::settings::TagSettings;
use crate::source::{
    DEFAULT_SOURCE_NAME, NATIVE_SOURCE_NAME, TagRow, TagSource, TagSourceType, TagSources,
};
use crate::tag::{TAG_SEPARATOR, Tag};
use crate::validate::normalize_tag_name;

/// Lookup state shared with readers on other threads.
#[derive(Debug, Default)]
pub(crate) struct TagMaps {
    pub(crate) nodes: HashMap<SmolStr, NodeId>,
    pub(crate) redirects: HashMap<SmolStr, Tag>,
    /// Names already reported by a strict [`TagRegistry::request_tag`].
    pub(crate) missing: HashSet<SmolStr>,
}

/// One row to insert into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowInsert<'a> {
    pub name: &'a str,
    pub source: &'a str,
    pub comment: &'a str,
    /// Register the complete name itself, not only its intermediates.
    pub is_explicit: bool,
    pub is_restricted: bool,
    pub allow_non_restricted_children: bool,
}

impl<'a> RowInsert<'a> {
    /// An ordinary explicit row.
    pub fn explicit(name: &'a str, source: &'a str, comment: &'a str) -> Self {
        Self {
            name,
            source,
            comment,
            is_explicit: true,
            is_restricted: false,
            allow_non_restricted_children: true,
        }
    }

    /// An explicit row from a restricted source.
    pub fn restricted(
        name: &'a str,
        source: &'a str,
        comment: &'a str,
        allow_non_restricted_children: bool,
    ) -> Self {
        Self {
            name,
            source,
            comment,
            is_explicit: true,
            is_restricted: true,
            allow_non_restricted_children,
        }
    }
}

/// The gameplay tag dictionary.
///
/// Construct one per application with [`TagRegistry::new`], feed it with
/// [`initialize`](Self::initialize), and pass it by reference to anything that
/// queries tags. [`refresh`](Self::refresh) rebuilds everything from the
/// retained sources; nothing is ever patched in place.
#[derive(Debug)]
pub struct TagRegistry {
    pub(crate) settings: TagSettings,
    pub(crate) nodes: Vec<TagNode>,
    pub(crate) maps: Mutex<TagMaps>,
    sources: Vec<TagSource>,
    /// Rows added through `add_native_tag`; they survive rebuilds.
    native_rows: Vec<TagRow>,
    native_closed: bool,
    pub(crate) net: NetIndexTable,
    pub(crate) stats: Mutex<ReplicationStats>,
    loaded: Option<TagSources>,
    pub(crate) diagnostics: Diagnostics,
    events: TagEvents,
    initialized: bool,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new(TagSettings::default())
    }
}

impl TagRegistry {
    pub fn new(settings: TagSettings) -> Self {
        Self {
            settings,
            nodes: vec![TagNode::root()],
            maps: Mutex::new(TagMaps::default()),
            sources: Vec::new(),
            native_rows: Vec::new(),
            native_closed: false,
            net: NetIndexTable::default(),
            stats: Mutex::new(ReplicationStats::default()),
            loaded: None,
            diagnostics: Diagnostics::default(),
            events: TagEvents::default(),
            initialized: false,
        }
    }

    /// Add an observer next to the default `tracing` sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics.add_sink(sink);
        self
    }

    /// Replace the observer list.
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Add lifecycle observers.
    pub fn with_events(mut self, events: TagEvents) -> Self {
        self.events.merge(events);
        self
    }

    #[inline]
    pub fn settings(&self) -> &TagSettings {
        &self.settings
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Build the dictionary from `sources`: load rows, load redirects, then
    /// assign net indices when fast replication is on. The sources are kept
    /// for [`refresh`](Self::refresh).
    pub fn initialize(&mut self, sources: TagSources) {
        self.reset();
        self.loaded = Some(sources);
        self.construct();
    }

    /// Drop everything, including retained sources and runtime native tags.
    pub fn shutdown(&mut self) {
        self.reset();
        self.loaded = None;
        self.native_rows.clear();
        self.native_closed = false;
        tracing::debug!("tag registry shut down");
    }

    /// Destroy and rebuild from the retained sources.
    pub fn refresh(&mut self) {
        tracing::info!("refreshing gameplay tag tree");
        self.reset();
        self.construct();
    }

    /// Tear down the tree, the maps and the net-index table. Retained sources
    /// and runtime native tags are kept, so [`load`](Self::load) or
    /// [`refresh`](Self::refresh) may follow.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(TagNode::root());
        {
            let maps = self.maps.get_mut();
            maps.nodes.clear();
            maps.redirects.clear();
            maps.missing.clear();
        }
        self.sources.clear();
        self.net = NetIndexTable::default();
        self.stats.get_mut().clear();
        self.initialized = false;
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of nodes, implicit intermediates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn construct(&mut self) {
        let Some(sources) = self.loaded.take() else {
            return;
        };

        self.load(&sources);
        self.load_redirects(&sources.redirects);
        if self.settings.fast_replication {
            self.assign_net_indices();
        }

        let redirects = self.maps.get_mut().redirects.len();
        tracing::info!(
            tags = self.len(),
            sources = self.sources.len(),
            redirects,
            "gameplay tag tree constructed"
        );

        self.loaded = Some(sources);
        self.initialized = true;
        self.events.tree_refreshed(self);
    }

    /// Assign net indices to the current tree. Called by
    /// [`initialize`](Self::initialize) when `fast_replication` is set.
    pub fn assign_net_indices(&mut self) {
        let common: Vec<Tag> = self
            .settings
            .common_tags
            .iter()
            .map(Tag::unchecked)
            .collect();
        let assigner = NetIndexAssigner::new(&self.settings, &self.diagnostics);
        self.net = assigner.assign(&mut self.nodes, &common);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Insert every row of `sources`, in precedence order: restricted lists,
    /// native tags, data tables, the default list, then per-file lists sorted
    /// by name. A per-file list with the same file name as a restricted list
    /// is skipped.
    pub fn load(&mut self, sources: &TagSources) {
        let mut restricted: Vec<_> = sources.restricted.iter().collect();
        restricted.sort_by(|a, b| a.source.cmp(&b.source));
        for batch in &restricted {
            if self
                .find_or_add_tag_source(&batch.source, TagSourceType::RestrictedTagList)
                .is_none()
            {
                continue;
            }
            for row in &batch.rows {
                self.insert_row(RowInsert::restricted(
                    &row.name,
                    &batch.source,
                    &row.comment,
                    row.allow_non_restricted_children,
                ));
            }
        }

        let native_rows = std::mem::take(&mut self.native_rows);
        if !(sources.native.is_empty() && native_rows.is_empty())
            && self
                .find_or_add_tag_source(NATIVE_SOURCE_NAME, TagSourceType::Native)
                .is_some()
        {
            for row in sources.native.iter().chain(&native_rows) {
                self.insert_row(RowInsert::explicit(&row.name, NATIVE_SOURCE_NAME, &row.comment));
            }
        }
        self.native_rows = native_rows;

        for batch in &sources.data_tables {
            self.load_rows(&batch.source, TagSourceType::DataTable, &batch.rows);
        }

        if !sources.default_list.is_empty() {
            self.load_rows(
                DEFAULT_SOURCE_NAME,
                TagSourceType::DefaultTagList,
                &sources.default_list,
            );
        }

        let restricted_files: HashSet<&str> =
            restricted.iter().map(|b| file_name(&b.source)).collect();
        let mut lists: Vec<_> = sources.tag_lists.iter().collect();
        lists.sort_by(|a, b| a.source.cmp(&b.source));
        for batch in lists {
            if restricted_files.contains(file_name(&batch.source)) {
                tracing::debug!(
                    source = %batch.source,
                    "skipping tag list shadowed by a restricted list"
                );
                continue;
            }
            self.load_rows(&batch.source, TagSourceType::TagList, &batch.rows);
        }

        self.propagate_conflicts();
    }

    fn load_rows(&mut self, source: &str, source_type: TagSourceType, rows: &[TagRow]) {
        if self.find_or_add_tag_source(source, source_type).is_none() {
            return;
        }
        for row in rows {
            self.insert_row(RowInsert::explicit(&row.name, source, &row.comment));
        }
    }

    /// Insert one row, creating implicit intermediates as needed.
    ///
    /// Returns the row's tag, or `None` when the name was rejected. A
    /// structurally malformed name (stray separators, surrounding whitespace,
    /// empty segments) is normalized and reported; any other invalid name is
    /// dropped and reported. Conflicts are flagged on the node and reported,
    /// never fatal.
    pub fn insert_row(&mut self, row: RowInsert<'_>) -> Option<Tag> {
        let name = match normalize_tag_name(row.name, &self.settings) {
            Ok((name, None)) => name,
            Ok((name, Some(err))) => {
                self.diagnostics.warn(
                    DiagnosticKind::InvalidTagName,
                    row.name,
                    format!("{err}; registered as '{name}' (source '{}')", row.source),
                );
                name
            }
            Err(err) => {
                let hint = err
                    .fixed()
                    .map(|fixed| format!("; suggested fix '{fixed}'"))
                    .unwrap_or_default();
                self.diagnostics.error(
                    DiagnosticKind::InvalidTagName,
                    row.name,
                    format!("{err}{hint}; row from '{}' dropped", row.source),
                );
                return None;
            }
        };

        let segment_count = name.split(TAG_SEPARATOR).count();
        let mut current = NodeId::ROOT;
        let mut blocking_ancestor = None;
        let mut end = 0;

        for (depth, segment) in name.split(TAG_SEPARATOR).enumerate() {
            end += segment.len() + usize::from(depth > 0);
            let is_last = depth + 1 == segment_count;

            let id = match self.find_child(current, segment) {
                Ok(id) => id,
                Err(pos) => {
                    let id = self.create_child(current, pos, segment, &name[..end]);
                    if !is_last && row.is_restricted {
                        let node = &mut self.nodes[id.index()];
                        node.is_restricted = true;
                        node.allow_non_restricted_children = true;
                    }
                    id
                }
            };

            if !is_last {
                let node = &self.nodes[id.index()];
                if node.is_restricted && !node.allow_non_restricted_children {
                    blocking_ancestor = Some(id);
                }
            }
            current = id;
        }

        if row.is_explicit {
            self.apply_explicit(current, &row, blocking_ancestor);
        }
        Some(self.nodes[current.index()].tag.clone())
    }

    /// Mark `id` explicit for `row`: restriction rules, conflict flags and the
    /// metadata merge.
    fn apply_explicit(
        &mut self,
        id: NodeId,
        row: &RowInsert<'_>,
        blocking_ancestor: Option<NodeId>,
    ) {
        let source = SmolStr::new(row.source);
        let blocker = blocking_ancestor.map(|b| self.nodes[b.index()].tag.clone());
        let node = &mut self.nodes[id.index()];
        let name = node.tag.clone();
        let first_source = node.source_name.clone().unwrap_or_default();
        let repeated = node.explicit_sources.contains(&source);

        let mut conflict = None;
        if row.is_restricted {
            if let Some(owner) = &node.restricted_by {
                if !repeated {
                    conflict = Some((
                        DiagnosticKind::RestrictedTagConflict,
                        format!(
                            "restricted tag '{name}' is registered by both '{owner}' and \
                             '{source}'; keeping '{owner}'"
                        ),
                    ));
                }
            } else {
                if node.is_explicit {
                    conflict = Some((
                        DiagnosticKind::RestrictedTagConflict,
                        format!(
                            "restricted tag '{name}' from '{source}' collides with a \
                             non-restricted tag from '{first_source}'; the restriction applies"
                        ),
                    ));
                }
                node.is_restricted = true;
                node.allow_non_restricted_children = row.allow_non_restricted_children;
                node.restricted_by = Some(source.clone());
            }
        } else if !repeated {
            if let Some(owner) = &node.restricted_by {
                conflict = Some((
                    DiagnosticKind::RestrictedTagConflict,
                    format!(
                        "'{source}' cannot redefine restricted tag '{name}' \
                         (restricted by '{owner}')"
                    ),
                ));
            } else if let Some(blocker) = &blocker {
                conflict = Some((
                    DiagnosticKind::NonRestrictedChildConflict,
                    format!(
                        "'{source}' adds '{name}' under restricted tag '{blocker}', which does \
                         not allow non-restricted children"
                    ),
                ));
            }
            // An intermediate created by a restricted row becomes an ordinary tag.
            if node.restricted_by.is_none() {
                node.is_restricted = false;
                node.allow_non_restricted_children = true;
            }
        }

        node.is_explicit = true;
        if conflict.is_some() {
            node.conflict.node = true;
        }
        if !repeated {
            node.explicit_sources.push(source.clone());
        }
        if row.source == NATIVE_SOURCE_NAME || node.source_name.is_none() {
            node.source_name = Some(source);
            node.dev_comment = row.comment.to_string();
        }

        if let Some((kind, message)) = conflict {
            self.diagnostics.warn(kind, name.name(), message);
        }
    }

    fn find_child(&self, parent: NodeId, simple_name: &str) -> Result<NodeId, usize> {
        let children = &self.nodes[parent.index()].children;
        children
            .binary_search_by(|c| self.nodes[c.index()].simple_name.as_str().cmp(simple_name))
            .map(|pos| children[pos])
    }

    fn create_child(
        &mut self,
        parent: NodeId,
        pos: usize,
        simple_name: &str,
        complete_name: &str,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let node = TagNode::new_child(
            simple_name,
            complete_name,
            parent,
            &self.nodes[parent.index()].ancestors,
        );
        let key = node.tag.smol().clone();
        self.nodes.push(node);
        self.nodes[parent.index()].children.insert(pos, id);
        self.maps.get_mut().nodes.insert(key, id);
        id
    }

    /// Mark ancestors and descendants of every conflicted node.
    fn propagate_conflicts(&mut self) {
        let conflicted: Vec<NodeId> = self
            .node_ids()
            .filter(|id| self.nodes[id.index()].conflict.node)
            .collect();

        for id in conflicted {
            let mut parent = self.nodes[id.index()].parent;
            while let Some(p) = parent {
                self.nodes[p.index()].conflict.descendant = true;
                parent = self.nodes[p.index()].parent;
            }

            let mut stack = self.nodes[id.index()].children.clone();
            while let Some(child) = stack.pop() {
                let node = &mut self.nodes[child.index()];
                node.conflict.ancestor = true;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Name → node, O(1). `None` for unknown names; never reports.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.maps.lock().nodes.get(name).copied()
    }

    /// Node for `id`. Ids from a registry stay valid until its next reset.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TagNode> {
        if id == NodeId::ROOT {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Node for a tag, if the tag is in the tree.
    pub fn find_tag_node(&self, tag: &Tag) -> Option<&TagNode> {
        if tag.is_none() {
            return None;
        }
        self.find_node(tag.name()).and_then(|id| self.node(id))
    }

    /// Ids of every node except the root, in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (1..self.nodes.len() as u32).map(NodeId)
    }

    #[inline]
    pub(crate) fn root(&self) -> &TagNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Look up a source by name, registering it on first use.
    ///
    /// Returns `None` (and reports) when the name is already registered with
    /// another type.
    pub fn find_or_add_tag_source(
        &mut self,
        name: &str,
        source_type: TagSourceType,
    ) -> Option<&TagSource> {
        if let Some(pos) = self.sources.iter().position(|s| s.name() == name) {
            let existing = self.sources[pos].source_type();
            if existing != source_type {
                self.diagnostics.error(
                    DiagnosticKind::SourceTypeMismatch,
                    name,
                    format!(
                        "tag source '{name}' is a {existing}, not a {source_type}; rows ignored"
                    ),
                );
                return None;
            }
            return Some(&self.sources[pos]);
        }
        self.sources.push(TagSource::new(name, source_type));
        self.sources.last()
    }

    pub fn find_tag_source(&self, name: &str) -> Option<&TagSource> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// Every source seen by the last load, in load order.
    #[inline]
    pub fn tag_sources(&self) -> &[TagSource] {
        &self.sources
    }

    pub fn tag_sources_with_type(&self, source_type: TagSourceType) -> Vec<&TagSource> {
        self.sources
            .iter()
            .filter(|s| s.source_type() == source_type)
            .collect()
    }

    pub fn restricted_tag_sources(&self) -> Vec<&TagSource> {
        self.tag_sources_with_type(TagSourceType::RestrictedTagList)
    }

    // =========================================================================
    // Native tags
    // =========================================================================

    /// Register a tag from code.
    ///
    /// The tag is inserted right away and kept across rebuilds. Once
    /// [`done_adding_native_tags`](Self::done_adding_native_tags) has been
    /// called this reports [`DiagnosticKind::NativeTagsClosed`] and returns
    /// the none tag.
    pub fn add_native_tag(&mut self, name: &str, comment: &str) -> Tag {
        if self.native_closed {
            self.diagnostics.error(
                DiagnosticKind::NativeTagsClosed,
                name,
                format!("native tag '{name}' added after native registration closed"),
            );
            return Tag::none();
        }

        if self
            .find_or_add_tag_source(NATIVE_SOURCE_NAME, TagSourceType::Native)
            .is_none()
        {
            return Tag::none();
        }
        let row = RowInsert::explicit(name, NATIVE_SOURCE_NAME, comment);
        let Some(tag) = self.insert_row(row) else {
            return Tag::none();
        };
        match self.native_rows.iter_mut().find(|r| r.name == tag.name()) {
            Some(row) => row.comment = comment.to_string(),
            None => self.native_rows.push(TagRow::new(tag.name(), comment)),
        }
        tag
    }

    /// Close native registration. The first call rebuilds an initialized
    /// registry so redirects that target native tags resolve; later calls do
    /// nothing.
    pub fn done_adding_native_tags(&mut self) {
        if self.native_closed {
            return;
        }
        self.native_closed = true;
        tracing::debug!(native = self.native_rows.len(), "native tag registration closed");
        if self.initialized {
            self.refresh();
        }
        self.events.native_tags_done(self);
    }

    #[inline]
    pub fn is_done_adding_native_tags(&self) -> bool {
        self.native_closed
    }

    /// Was `tag` registered from code?
    pub fn is_natively_added_tag(&self, tag: &Tag) -> bool {
        if tag.is_none() {
            return false;
        }
        self.native_rows.iter().any(|r| r.name == tag.name())
            || self
                .find_tag_node(tag)
                .is_some_and(|n| n.explicit_sources().any(|s| s == NATIVE_SOURCE_NAME))
    }
}

/// File-name part of a source name that may be a path.
fn file_name(source: &str) -> &str {
    source.rsplit(['/', '\\']).next().unwrap_or(source)
}

// =============================================================================
// Tests
// =============================================================================
