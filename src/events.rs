//! Lifecycle notifications from a [`TagRegistry`].
//!
//! Handlers run synchronously on the thread that rebuilt the tree, after the
//! rebuild is complete, and receive the registry read-only.

use std::fmt;
use std::sync::Arc;

use crate::registry::TagRegistry;

/// Callback invoked with the registry that raised the event.
pub type TagEventHandler = Arc<dyn Fn(&TagRegistry) + Send + Sync>;

/// Observer lists for registry lifecycle events.
#[derive(Clone, Default)]
pub struct TagEvents {
    refreshed: Vec<TagEventHandler>,
    native_done: Vec<TagEventHandler>,
}

impl fmt::Debug for TagEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagEvents")
            .field("refreshed", &self.refreshed.len())
            .field("native_done", &self.native_done.len())
            .finish()
    }
}

impl TagEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after every construction of the tree: `initialize`, `refresh`
    /// and the rebuild done by `done_adding_native_tags`.
    pub fn on_refreshed(
        mut self,
        handler: impl Fn(&TagRegistry) + Send + Sync + 'static,
    ) -> Self {
        self.refreshed.push(Arc::new(handler));
        self
    }

    /// Called once, when native registration closes.
    pub fn on_native_done(
        mut self,
        handler: impl Fn(&TagRegistry) + Send + Sync + 'static,
    ) -> Self {
        self.native_done.push(Arc::new(handler));
        self
    }

    /// Append every handler of `other`.
    pub fn merge(&mut self, other: TagEvents) {
        self.refreshed.extend(other.refreshed);
        self.native_done.extend(other.native_done);
    }

    pub(crate) fn tree_refreshed(&self, registry: &TagRegistry) {
        for handler in &self.refreshed {
            handler(registry);
        }
    }

    pub(crate) fn native_tags_done(&self, registry: &TagRegistry) {
        for handler in &self.native_done {
            handler(registry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TagSettings;
    use crate::source::TagSources;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&TagRegistry) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = count.clone();
        (count, move |_: &TagRegistry| {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn refreshed_fires_per_construction() {
        let (count, handler) = counter();
        let mut registry = TagRegistry::new(TagSettings::default())
            .with_events(TagEvents::new().on_refreshed(handler));

        registry.initialize(TagSources::new().with_default_tags(["A.B"]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        registry.refresh();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        // Nothing retained, nothing constructed.
        registry.shutdown();
        registry.refresh();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handlers_see_the_rebuilt_tree() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut registry = TagRegistry::new(TagSettings::default()).with_events(
            TagEvents::new().on_refreshed(move |registry: &TagRegistry| {
                sink.lock().push(registry.len());
            }),
        );
        registry.initialize(TagSources::new().with_default_tags(["A.B", "C"]));
        assert_eq!(*seen.lock(), vec![3]);
    }

    #[test]
    fn native_done_fires_once() {
        let (done, on_done) = counter();
        let (refreshed, on_refreshed) = counter();
        let mut registry = TagRegistry::new(TagSettings::default()).with_events(
            TagEvents::new()
                .on_native_done(on_done)
                .on_refreshed(on_refreshed),
        );
        registry.initialize(TagSources::new());

        registry.done_adding_native_tags();
        registry.done_adding_native_tags();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(refreshed.load(Ordering::SeqCst), 2);
    }
}
