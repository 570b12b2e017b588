//! Tag sources: provenance records and the in-memory row batches handed to the
//! registry by a loader.

use std::fmt;

use serde::Deserialize;
use smol_str::SmolStr;

/// Source name used for tags registered from code.
pub const NATIVE_SOURCE_NAME: &str = "Native";

/// Source name used for the default (project-wide) tag list.
pub const DEFAULT_SOURCE_NAME: &str = "DefaultGameplayTags";

/// Where a batch of tags came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagSourceType {
    /// Registered from code, through [`native_tags!`](crate::native_tags) or
    /// [`TagRegistry::add_native_tag`](crate::TagRegistry::add_native_tag).
    Native,
    /// The project-wide default tag list.
    DefaultTagList,
    /// A per-file tag list found by scanning a tag directory.
    TagList,
    /// A privileged list that reserves namespaces.
    RestrictedTagList,
    /// A data table of tag rows.
    DataTable,
}

impl TagSourceType {
    pub fn is_restricted(self) -> bool {
        self == Self::RestrictedTagList
    }
}

impl fmt::Display for TagSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Native => "native",
            Self::DefaultTagList => "default tag list",
            Self::TagList => "tag list",
            Self::RestrictedTagList => "restricted tag list",
            Self::DataTable => "data table",
        };
        f.write_str(s)
    }
}

/// Provenance record for one tag source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSource {
    name: SmolStr,
    source_type: TagSourceType,
}

impl TagSource {
    pub(crate) fn new(name: &str, source_type: TagSourceType) -> Self {
        Self {
            name: SmolStr::new(name),
            source_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_type(&self) -> TagSourceType {
        self.source_type
    }
}

/// One tag definition row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TagRow {
    #[serde(alias = "tag")]
    pub name: String,
    #[serde(default, alias = "dev_comment")]
    pub comment: String,
}

impl TagRow {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
        }
    }
}

/// One row of a restricted tag list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RestrictedTagRow {
    #[serde(alias = "tag")]
    pub name: String,
    #[serde(default, alias = "dev_comment")]
    pub comment: String,
    #[serde(default)]
    pub allow_non_restricted_children: bool,
}

impl RestrictedTagRow {
    pub fn new(
        name: impl Into<String>,
        comment: impl Into<String>,
        allow_non_restricted_children: bool,
    ) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            allow_non_restricted_children,
        }
    }
}

/// A deprecated name and its replacement. An empty `new_tag_name` retires the
/// old name without a replacement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TagRedirect {
    #[serde(alias = "old")]
    pub old_tag_name: String,
    #[serde(default, alias = "new")]
    pub new_tag_name: String,
}

impl TagRedirect {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old_tag_name: old.into(),
            new_tag_name: new.into(),
        }
    }
}

/// Rows contributed by one named source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceRows<R> {
    pub source: String,
    pub rows: Vec<R>,
}

impl<R> SourceRows<R> {
    pub fn new(source: impl Into<String>, rows: Vec<R>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }
}

/// A native tag declared at compile time (emitted by `native_tags!`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeTagDef {
    pub name: &'static str,
    pub comment: &'static str,
}

impl NativeTagDef {
    pub const fn new(name: &'static str, comment: &'static str) -> Self {
        Self { name, comment }
    }
}

/// A redirect declared at compile time (emitted by `native_tags!`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeRedirectDef {
    pub old: &'static str,
    pub new: &'static str,
}

impl NativeRedirectDef {
    pub const fn new(old: &'static str, new: &'static str) -> Self {
        Self { old, new }
    }
}

/// Everything a loader read, grouped by source kind.
///
/// The registry consumes the groups in a fixed order (restricted, native,
/// data tables, default list, per-file lists) regardless of the order they
/// were added here. Per-file lists are consumed sorted by source name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSources {
    pub restricted: Vec<SourceRows<RestrictedTagRow>>,
    pub native: Vec<TagRow>,
    pub data_tables: Vec<SourceRows<TagRow>>,
    pub default_list: Vec<TagRow>,
    pub tag_lists: Vec<SourceRows<TagRow>>,
    pub redirects: Vec<TagRedirect>,
}

impl TagSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the project-wide default tags by name.
    pub fn with_default_tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_list
            .extend(names.into_iter().map(|n| TagRow::new(n, "")));
        self
    }

    pub fn with_default_row(mut self, row: TagRow) -> Self {
        self.default_list.push(row);
        self
    }

    pub fn with_tag_list(mut self, source: impl Into<String>, rows: Vec<TagRow>) -> Self {
        self.tag_lists.push(SourceRows::new(source, rows));
        self
    }

    pub fn with_restricted(
        mut self,
        source: impl Into<String>,
        rows: Vec<RestrictedTagRow>,
    ) -> Self {
        self.restricted.push(SourceRows::new(source, rows));
        self
    }

    pub fn with_data_table(mut self, source: impl Into<String>, rows: Vec<TagRow>) -> Self {
        self.data_tables.push(SourceRows::new(source, rows));
        self
    }

    pub fn with_redirect(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.redirects.push(TagRedirect::new(old, new));
        self
    }

    /// Add the `ROWS` generated by [`native_tags!`](crate::native_tags).
    pub fn with_native_tags(mut self, defs: &[NativeTagDef]) -> Self {
        self.native
            .extend(defs.iter().map(|d| TagRow::new(d.name, d.comment)));
        self
    }

    /// Add the `REDIRECTS` generated by [`native_tags!`](crate::native_tags).
    pub fn with_native_redirects(mut self, defs: &[NativeRedirectDef]) -> Self {
        self.redirects
            .extend(defs.iter().map(|d| TagRedirect::new(d.old, d.new)));
        self
    }

    /// Merge another set of sources into this one.
    pub fn merge(&mut self, other: TagSources) {
        self.restricted.extend(other.restricted);
        self.native.extend(other.native);
        self.data_tables.extend(other.data_tables);
        self.default_list.extend(other.default_list);
        self.tag_lists.extend(other.tag_lists);
        self.redirects.extend(other.redirects);
    }

    /// Total number of tag rows across all groups.
    pub fn row_count(&self) -> usize {
        self.restricted.iter().map(|s| s.rows.len()).sum::<usize>()
            + self.native.len()
            + self.data_tables.iter().map(|s| s.rows.len()).sum::<usize>()
            + self.default_list.len()
            + self.tag_lists.iter().map(|s| s.rows.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_groups_rows() {
        let sources = TagSources::new()
            .with_default_tags(["A", "B"])
            .with_tag_list("Extra.toml", vec![TagRow::new("C", "")])
            .with_restricted("Locked.toml", vec![RestrictedTagRow::new("R", "", false)])
            .with_native_tags(&[NativeTagDef::new("N", "native")])
            .with_native_redirects(&[NativeRedirectDef::new("Old", "N")]);

        assert_eq!(sources.row_count(), 5);
        assert_eq!(sources.redirects, vec![TagRedirect::new("Old", "N")]);
        assert_eq!(sources.native[0].comment, "native");
    }

    #[test]
    fn merge_appends() {
        let mut a = TagSources::new().with_default_tags(["A"]);
        a.merge(TagSources::new().with_default_tags(["B"]).with_redirect("X", ""));
        assert_eq!(a.default_list.len(), 2);
        assert_eq!(a.redirects.len(), 1);
    }

    #[test]
    fn rows_deserialize_with_aliases() {
        let row: RestrictedTagRow = serde_json::from_str(
            r#"{"tag": "A.B", "allow_non_restricted_children": true}"#,
        )
        .unwrap();
        assert_eq!(row.name, "A.B");
        assert!(row.allow_non_restricted_children);
        assert_eq!(row.comment, "");

        let redirect: TagRedirect = serde_json::from_str(r#"{"old": "X", "new": "Y"}"#).unwrap();
        assert_eq!(redirect, TagRedirect::new("X", "Y"));
    }
}
