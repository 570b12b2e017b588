//! Redirects: deprecated tag names mapped to their replacements.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::container::TagContainer;
use crate::diagnostics::DiagnosticKind;
use crate::registry::TagRegistry;
use crate::source::TagRedirect;
use crate::tag::Tag;

/// Longest redirect chain followed before giving up.
pub const MAX_REDIRECT_DEPTH: usize = 10;

impl TagRegistry {
    /// Build the redirect table, replacing any previous one.
    ///
    /// Chains are flattened at load time, so every stored target is final.
    /// Retired names (empty new name) are stored as [`Tag::none`]. Targets
    /// that are not in the dictionary, and chains longer than
    /// [`MAX_REDIRECT_DEPTH`], are reported and not stored.
    pub fn load_redirects(&mut self, redirects: &[TagRedirect]) {
        let mut table: HashMap<&str, &str> = HashMap::with_capacity(redirects.len());
        let mut order: Vec<&str> = Vec::with_capacity(redirects.len());

        for redirect in redirects {
            let old = redirect.old_tag_name.trim();
            let new = redirect.new_tag_name.trim();
            if old.is_empty() {
                self.diagnostics.error(
                    DiagnosticKind::UnresolvedRedirect,
                    format!("{old} -> {new}"),
                    format!("redirect to '{new}' has an empty old tag name"),
                );
                continue;
            }
            match table.get(old) {
                Some(&first) if first != new => self.diagnostics.error(
                    DiagnosticKind::DuplicateRedirect,
                    old,
                    format!(
                        "'{old}' is redirected to both '{first}' and '{new}'; keeping '{first}'"
                    ),
                ),
                Some(_) => {}
                None => {
                    table.insert(old, new);
                    order.push(old);
                }
            }
        }

        let mut resolved: HashMap<SmolStr, Tag> = HashMap::with_capacity(order.len());
        for old in order {
            let Some(target) = self.follow_chain(&table, old) else {
                continue;
            };

            if let Some(node) = self.find_tag_node(&Tag::unchecked(old)) {
                let message = format!("'{old}' is redirected but still exists in the dictionary");
                if node.children().is_empty() {
                    self.diagnostics
                        .warn(DiagnosticKind::RedirectedTagStillExists, old, message);
                } else {
                    self.diagnostics
                        .log(DiagnosticKind::RedirectedTagStillExists, old, message);
                }
            }

            if target.is_empty() {
                resolved.insert(SmolStr::new(old), Tag::none());
                continue;
            }
            match self.find_node(target) {
                Some(_) => {
                    resolved.insert(SmolStr::new(old), Tag::unchecked(target));
                }
                None => self.diagnostics.error(
                    DiagnosticKind::UnresolvedRedirect,
                    old,
                    format!("'{old}' redirects to '{target}', which is not in the dictionary"),
                ),
            }
        }

        tracing::debug!(redirects = resolved.len(), "redirects loaded");
        self.maps.get_mut().redirects = resolved;
    }

    /// Final target of `old`, `""` when the chain ends in a retirement.
    fn follow_chain<'a>(&self, table: &HashMap<&'a str, &'a str>, old: &'a str) -> Option<&'a str> {
        let mut target = table.get(old).copied().unwrap_or_default();
        let mut hops = 0;
        while let Some(&next) = table.get(target) {
            hops += 1;
            if hops >= MAX_REDIRECT_DEPTH {
                self.diagnostics.error(
                    DiagnosticKind::UnresolvedRedirect,
                    old,
                    format!(
                        "redirect chain from '{old}' exceeds {MAX_REDIRECT_DEPTH} steps; \
                         likely a cycle"
                    ),
                );
                return None;
            }
            target = next;
            if target.is_empty() {
                break;
            }
        }
        Some(target)
    }

    /// Redirected replacement of `name` if it has one, otherwise the tag for
    /// `name` if it is in the tree, otherwise the none tag.
    pub fn resolve_tag(&self, name: &str) -> Tag {
        let maps = self.maps.lock();
        if let Some(tag) = maps.redirects.get(name) {
            return tag.clone();
        }
        maps.nodes
            .get_key_value(name)
            .map(|(key, _)| Tag::from_smol(key.clone()))
            .unwrap_or_default()
    }

    /// Replace every redirected tag of `container` with its replacement.
    /// Retired tags are removed without a replacement.
    pub fn resolve_container(&self, container: &mut TagContainer) {
        let mut removed = Vec::new();
        let mut added = Vec::new();
        {
            let maps = self.maps.lock();
            for tag in container.iter() {
                if let Some(new) = maps.redirects.get(tag.name()) {
                    removed.push(tag.clone());
                    if !new.is_none() {
                        added.push(new.clone());
                    }
                }
            }
        }

        for tag in &removed {
            container.remove(tag);
        }
        container.extend(added);
    }

    /// Apply a redirect to one loaded tag in place. Returns `true` if the tag
    /// changed.
    ///
    /// An unknown tag without a redirect is left alone and reported as
    /// [`DiagnosticKind::InvalidTagLoaded`] when `warn_on_invalid_tags` is set.
    pub fn redirect_single_tag(&self, tag: &mut Tag) -> bool {
        if tag.is_none() {
            return false;
        }
        let redirected = self.maps.lock().redirects.get(tag.name()).cloned();
        match redirected {
            Some(new) => {
                tracing::trace!(old = %tag, new = %new, "redirected tag");
                *tag = new;
                true
            }
            None => {
                if self.settings.warn_on_invalid_tags && self.find_node(tag.name()).is_none() {
                    self.diagnostics.warn(
                        DiagnosticKind::InvalidTagLoaded,
                        tag.name(),
                        format!("loaded unknown tag '{tag}'"),
                    );
                }
                false
            }
        }
    }

    /// Resolve a persisted tag name: redirect first, then the dictionary.
    ///
    /// Returns `None` for retired names and for unknown names; the latter are
    /// reported when `warn_on_invalid_tags` is set.
    pub fn import_tag(&self, name: &str) -> Option<Tag> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut tag = Tag::unchecked(name);
        self.redirect_single_tag(&mut tag);
        if tag.is_none() || self.find_node(tag.name()).is_none() {
            return None;
        }
        Some(tag)
    }

    /// The redirect target for `old`, if `old` is redirected.
    pub fn redirect_for(&self, old: &str) -> Option<Tag> {
        self.maps.lock().redirects.get(old).cloned()
    }
}
