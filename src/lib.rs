//! # Gameplay Tags
//!
//! A hierarchical tag dictionary: dotted names (`Weapon.Ranged.Sniper`) are
//! built into a tree whose nodes know their full ancestor set, so
//! "has `Weapon`?" is a lookup in a precomputed container.
//!
//! ## Design
//!
//! ```text
//!   TagSources ──▶ TagRegistry::initialize
//!                   │
//!                   ├─ restricted lists ─┐
//!                   ├─ native rows       │  insert rows, create implicit
//!                   ├─ data tables       ├─ parents, record sources and
//!                   ├─ default list      │  conflicts
//!                   └─ per-file lists   ─┘
//!                   │
//!                   ├─ NetIndexAssigner   sorted, common tags first
//!                   └─ redirects          old name ──▶ new tag
//! ```
//!
//! Construction never fails. Bad names, source clashes and broken redirects
//! are reported through [`Diagnostics`] (forwarded to `tracing` by default)
//! and the offending row is skipped.
//!
//! ## Replication
//!
//! With `fast_replication` on, every node gets a dense [`TagNetIndex`]. Tags
//! are written as a flag bit plus either a short first segment or the full
//! width, so the most common tags cost only a few bits:
//!
//! ```ignore
//! let mut writer = BitWriter::new();
//! registry.write_tag(&mut writer, &stunned)?;
//!
//! let mut reader = BitReader::new(writer.as_bytes());
//! assert_eq!(registry.read_tag(&mut reader)?, stunned);
//! ```
//!
//! Client and server compare [`TagRegistry::net_index_checksum`] to detect
//! dictionary mismatches before trusting indices.

extern crate self as gameplay_tags;

pub mod bevy;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod hash;
pub mod layout;
pub mod net_index;
pub mod node;
pub mod query;
pub mod redirect;
pub mod registry;
pub mod replication;
pub mod settings;
pub mod source;
pub mod tag;
pub mod validate;

pub use container::TagContainer;
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics, Severity, TracingSink,
};
pub use error::{TagNameError, WireError};
pub use events::{TagEventHandler, TagEvents};
pub use hash::{fnv1a_64, names_checksum};
pub use layout::{BitReader, BitWriter, NetIndexLayout};
pub use net_index::{INVALID_TAG_NET_INDEX, NetIndexTable, TagNetIndex};
pub use node::{ConflictFlags, NodeId, TagNode};
pub use query::{TagEditorData, TagSelection};
pub use redirect::MAX_REDIRECT_DEPTH;
pub use registry::{RowInsert, TagRegistry};
pub use replication::{ReplicationFrequencyReport, ReplicationStats, SegmentCandidate};
pub use settings::{CategoryRemap, TagSettings};
pub use source::{
    DEFAULT_SOURCE_NAME, NATIVE_SOURCE_NAME, NativeRedirectDef, NativeTagDef, RestrictedTagRow,
    SourceRows, TagRedirect, TagRow, TagSource, TagSourceType, TagSources,
};
pub use tag::{TAG_SEPARATOR, Tag};
pub use validate::validate_tag_name;

pub use gameplay_tags_macro::native_tags;
