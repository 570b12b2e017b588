//! Bevy integration for gameplay tags.
//!
//! Provides:
//! - `GameplayTagsPlugin`: builds and initializes a [`TagRegistry`] and
//!   inserts it as a Resource
//! - `OwnedTags`: a component holding an entity's [`TagContainer`]
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use gameplay_tags::bevy::*;
//! use gameplay_tags::{native_tags, TagSettings, TagSources, TagRegistry};
//!
//! native_tags! {
//!     pub mod Tags {
//!         State { Stunned; Rooted; }
//!         Weapon { Ranged { Sniper; } }
//!     }
//! }
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(
//!             GameplayTagsPlugin::new(TagSettings::default())
//!                 .with_sources(TagSources::new().with_native_tags(Tags::ROWS)),
//!         )
//!         .add_systems(Startup, spawn)
//!         .run();
//! }
//!
//! fn spawn(mut commands: Commands, registry: Res<TagRegistry>) {
//!     let stunned = registry.request_tag(Tags::State::Stunned::PATH, true);
//!     commands.spawn(OwnedTags::from_iter([stunned]));
//! }
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bevy::prelude::*;

use crate::container::TagContainer;
use crate::diagnostics::DiagnosticSink;
use crate::events::TagEvents;
use crate::registry::TagRegistry;
use crate::settings::TagSettings;
use crate::source::TagSources;
use crate::tag::Tag;

// =============================================================================
// Plugin
// =============================================================================

/// Bevy plugin for the gameplay tag dictionary.
///
/// ```ignore
/// App::new()
///     .add_plugins(
///         GameplayTagsPlugin::new(settings)
///             .with_sources(sources)
///             .with_sink(Arc::new(my_sink)),
///     )
/// ```
#[derive(Clone, Default)]
pub struct GameplayTagsPlugin {
    settings: TagSettings,
    sources: TagSources,
    sinks: Vec<Arc<dyn DiagnosticSink>>,
    events: TagEvents,
}

impl GameplayTagsPlugin {
    pub fn new(settings: TagSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Sources to build the registry from. May be called more than once.
    pub fn with_sources(mut self, sources: TagSources) -> Self {
        self.sources.merge(sources);
        self
    }

    /// Extra diagnostic observer, in addition to `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Lifecycle observers for the registry.
    pub fn with_events(mut self, events: TagEvents) -> Self {
        self.events.merge(events);
        self
    }

    /// Build the registry this plugin would insert.
    ///
    /// Native registration is closed before the single build, so every
    /// native row and redirect is in place when the tree is constructed.
    pub fn build_registry(&self) -> TagRegistry {
        let mut registry = self
            .sinks
            .iter()
            .cloned()
            .fold(TagRegistry::new(self.settings.clone()), TagRegistry::with_sink)
            .with_events(self.events.clone());
        registry.done_adding_native_tags();
        registry.initialize(self.sources.clone());
        registry
    }
}

impl Plugin for GameplayTagsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.build_registry());
        app.add_systems(PreUpdate, resolve_owned_tag_redirects);
    }
}

/// Upgrade redirected names in newly added [`OwnedTags`], e.g. tags loaded
/// from a save file written before a rename.
pub fn resolve_owned_tag_redirects(
    registry: Res<TagRegistry>,
    mut query: Query<&mut OwnedTags, Added<OwnedTags>>,
) {
    for mut owned in &mut query {
        registry.resolve_container(&mut owned.0);
    }
}

// =============================================================================
// OwnedTags Component
// =============================================================================

/// The tags an entity currently has.
///
/// Derefs to [`TagContainer`], so the hierarchical queries take the registry
/// resource:
///
/// ```ignore
/// fn system(registry: Res<TagRegistry>, query: Query<&OwnedTags>) {
///     let state = registry.request_tag("State", true);
///     for tags in &query {
///         if tags.has_tag(&state, &registry) {
///             // some State.* tag is present
///         }
///     }
/// }
/// ```
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedTags(pub TagContainer);

impl OwnedTags {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a tag and return self.
    #[inline]
    pub fn with(mut self, tag: Tag) -> Self {
        self.0.add(tag);
        self
    }

    #[inline]
    pub fn into_inner(self) -> TagContainer {
        self.0
    }
}

impl Deref for OwnedTags {
    type Target = TagContainer;

    fn deref(&self) -> &TagContainer {
        &self.0
    }
}

impl DerefMut for OwnedTags {
    fn deref_mut(&mut self) -> &mut TagContainer {
        &mut self.0
    }
}

impl From<TagContainer> for OwnedTags {
    fn from(container: TagContainer) -> Self {
        Self(container)
    }
}

impl FromIterator<Tag> for OwnedTags {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Resource impl for TagRegistry
// =============================================================================

impl Resource for TagRegistry {}

// =============================================================================
// Tests
// =============================================================================
