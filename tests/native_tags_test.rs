//! `native_tags!` declarations and the native registration lifecycle.

use gameplay_tags::*;
use pretty_assertions::assert_eq;

native_tags! {
    pub mod Tags {
        /// Crowd control.
        State {
            /// Cannot act.
            Stunned;
            Rooted;
            #[redirect = "State.Rooted"]
            Frozen;
        }
        Combat { Attack; }
        Movement { Attack; }
        #[redirect = ""]
        Legacy;
    }
}

#[test]
fn generated_paths_and_depths() {
    assert_eq!(Tags::State::PATH, "State");
    assert_eq!(Tags::State::DEPTH, 0);
    assert_eq!(Tags::State::Stunned::PATH, "State.Stunned");
    assert_eq!(Tags::State::Stunned::DEPTH, 1);
    assert_eq!(Tags::Combat::Attack::PATH, "Combat.Attack");
    assert_eq!(Tags::Movement::Attack::PATH, "Movement.Attack");
    assert_eq!(Tags::State::Frozen::OLD_PATH, "State.Frozen");
    assert_eq!(Tags::State::Frozen::PATH, "State.Rooted");
}

#[test]
fn generated_tables() {
    let names: Vec<&str> = Tags::ROWS.iter().map(|row| row.name).collect();
    assert_eq!(
        names,
        vec![
            "State",
            "State.Stunned",
            "State.Rooted",
            "Combat",
            "Combat.Attack",
            "Movement",
            "Movement.Attack",
        ]
    );
    assert_eq!(Tags::NODE_COUNT, Tags::ROWS.len());
    assert_eq!(Tags::ROWS[1].comment, "Cannot act.");
    assert_eq!(
        Tags::REDIRECTS,
        &[
            NativeRedirectDef::new("State.Frozen", "State.Rooted"),
            NativeRedirectDef::new("Legacy", ""),
        ]
    );
}

#[test]
fn native_rows_feed_the_registry() {
    let mut registry = TagRegistry::new(TagSettings::default());
    registry.initialize(
        TagSources::new()
            .with_native_tags(Tags::ROWS)
            .with_native_redirects(Tags::REDIRECTS),
    );

    let stunned = registry.request_tag(Tags::State::Stunned::PATH, true);
    let node = registry.find_tag_node(&stunned).unwrap();
    assert_eq!(node.source_name(), Some(NATIVE_SOURCE_NAME));
    assert_eq!(node.dev_comment(), "Cannot act.");
    assert!(registry.is_natively_added_tag(&stunned));

    assert_eq!(
        registry.resolve_tag(Tags::State::Frozen::OLD_PATH),
        registry.request_tag(Tags::State::Frozen::PATH, true)
    );
    assert!(registry.resolve_tag(Tags::Legacy::OLD_PATH).is_none());
}

#[test]
fn runtime_native_tags_close_after_done() {
    let sink = CollectingSink::new();
    let mut registry = TagRegistry::new(TagSettings::default()).with_sink(sink.clone());
    registry.initialize(
        TagSources::new()
            .with_default_tags(["Default.Tag"])
            .with_redirect("Old.Plugin", "Plugin.Added"),
    );

    // Before the native tag exists the redirect target is missing.
    assert!(registry.resolve_tag("Old.Plugin").is_none());

    let added = registry.add_native_tag("Plugin.Added", "from a plugin");
    assert_eq!(added, "Plugin.Added");
    assert!(registry.is_natively_added_tag(&added));

    registry.done_adding_native_tags();
    assert!(registry.is_done_adding_native_tags());
    // The rebuild picked up the redirect to the native tag.
    assert_eq!(registry.resolve_tag("Old.Plugin"), added);
    assert!(registry.is_dictionary_tag("Default.Tag"));

    let late = registry.add_native_tag("Plugin.Late", "");
    assert!(late.is_none());
    assert!(sink.has(DiagnosticKind::NativeTagsClosed, "Plugin.Late"));
    assert!(!registry.is_valid(&Tag::unchecked("Plugin.Late")));

    // Idempotent.
    registry.done_adding_native_tags();
    assert_eq!(sink.count(DiagnosticKind::NativeTagsClosed), 1);
}
